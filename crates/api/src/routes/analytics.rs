//! Analytics query endpoints: grouped aggregation, time series, top-N,
//! gauge and period comparison.

use std::collections::HashMap;

use analytics::{query_analytics, query_compare, query_gauge, query_timeseries, query_topn};
use axum::{
    extract::{Query, State},
    Json,
};
use gateway_core::{
    AggregationKind, AnalyticsQuery, AnalyticsResult, CompareQuery, CompareResult, GaugeQuery,
    GaugeResult, IntervalKind, TimeSeriesQuery, TimeSeriesResult, TopNQuery, TopNResult,
};

use crate::response::ApiError;
use crate::routes::params::{filters_from_query, parse_time};
use crate::state::AppState;

/// POST /v1/analytics - grouped aggregation.
pub async fn analytics(
    State(state): State<AppState>,
    Json(query): Json<AnalyticsQuery>,
) -> Result<Json<AnalyticsResult>, ApiError> {
    let result = query_analytics(&state.store, &query).await?;
    Ok(Json(result))
}

/// POST /v1/timeseries - bucketed time series.
pub async fn timeseries(
    State(state): State<AppState>,
    Json(query): Json<TimeSeriesQuery>,
) -> Result<Json<TimeSeriesResult>, ApiError> {
    let result = query_timeseries(&state.store, &query).await?;
    Ok(Json(result))
}

/// POST /v1/topn - top N values of one dimension.
pub async fn topn(
    State(state): State<AppState>,
    Json(query): Json<TopNQuery>,
) -> Result<Json<TopNResult>, ApiError> {
    let result = query_topn(&state.store, &query).await?;
    Ok(Json(result))
}

/// POST /v1/gauge - single scalar aggregate.
pub async fn gauge(
    State(state): State<AppState>,
    Json(query): Json<GaugeQuery>,
) -> Result<Json<GaugeResult>, ApiError> {
    let result = query_gauge(&state.store, &query).await?;
    Ok(Json(result))
}

/// POST /v1/compare - period comparison.
pub async fn compare(
    State(state): State<AppState>,
    Json(query): Json<CompareQuery>,
) -> Result<Json<CompareResult>, ApiError> {
    let result = query_compare(&state.store, &query).await?;
    Ok(Json(result))
}

fn parse_aggregation(query: &HashMap<String, String>) -> Result<AggregationKind, ApiError> {
    match query.get("aggregation").map(String::as_str) {
        None | Some("") => Ok(AggregationKind::default()),
        Some(s) => s.parse::<AggregationKind>().map_err(ApiError::from),
    }
}

fn parse_group_by(query: &HashMap<String, String>) -> Vec<String> {
    query
        .get("group_by")
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_limit(query: &HashMap<String, String>) -> Option<u64> {
    query.get("limit").and_then(|s| s.parse().ok())
}

/// GET /v1/analytics - flat query-string variant.
pub async fn analytics_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<AnalyticsResult>, ApiError> {
    let query = AnalyticsQuery {
        aggregation: parse_aggregation(&params)?,
        field: params.get("field").filter(|s| !s.is_empty()).cloned(),
        group_by: parse_group_by(&params),
        filters: filters_from_query(&params),
        from: params.get("from").and_then(|s| parse_time(s)),
        to: params.get("to").and_then(|s| parse_time(s)),
        order_by: params.get("order_by").filter(|s| !s.is_empty()).cloned(),
        order_desc: params.get("order").map(String::as_str) != Some("asc"),
        limit: parse_limit(&params),
    };

    let result = query_analytics(&state.store, &query).await?;
    Ok(Json(result))
}

/// GET /v1/timeseries - flat query-string variant. Interval defaults to
/// hour.
pub async fn timeseries_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<TimeSeriesResult>, ApiError> {
    let interval = match params.get("interval").map(String::as_str) {
        None | Some("") => IntervalKind::default(),
        Some(s) => s.parse::<IntervalKind>().map_err(ApiError::from)?,
    };

    let query = TimeSeriesQuery {
        aggregation: parse_aggregation(&params)?,
        field: params.get("field").filter(|s| !s.is_empty()).cloned(),
        interval,
        group_by: parse_group_by(&params),
        filters: filters_from_query(&params),
        from: params.get("from").and_then(|s| parse_time(s)),
        to: params.get("to").and_then(|s| parse_time(s)),
        fill_zeros: params.get("fill_zeros").map(String::as_str) == Some("true"),
    };

    let result = query_timeseries(&state.store, &query).await?;
    Ok(Json(result))
}
