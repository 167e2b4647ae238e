//! Event search and label / key discovery endpoints.

use std::collections::HashMap;

use analytics::{data_keys as run_data_keys, data_values as run_data_values, label_values as run_label_values, query_events};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use gateway_core::{DataKeysResult, LabelValuesResult, SearchParams, SearchResult};

use crate::response::ApiError;
use crate::routes::params::parse_time;
use crate::state::AppState;

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|s| !s.is_empty()).cloned()
}

/// Build search params from the query string. Keys prefixed `data.` become
/// payload equality filters; unknown keys are ignored.
fn search_params(query: &HashMap<String, String>) -> SearchParams {
    let mut params = SearchParams {
        service: non_empty(query.get("service")),
        env: non_empty(query.get("env")),
        job_id: non_empty(query.get("job_id")),
        request_id: non_empty(query.get("request_id")),
        trace_id: non_empty(query.get("trace_id")),
        name: non_empty(query.get("name")),
        level: non_empty(query.get("level")),
        from: query.get("from").and_then(|s| parse_time(s)),
        to: query.get("to").and_then(|s| parse_time(s)),
        data_filters: Default::default(),
        limit: query.get("limit").and_then(|s| s.parse().ok()),
        offset: query.get("offset").and_then(|s| s.parse().ok()),
    };

    for (key, value) in query {
        if let Some(data_key) = key.strip_prefix("data.") {
            if !data_key.is_empty() {
                params
                    .data_filters
                    .insert(data_key.to_string(), value.clone());
            }
        }
    }

    params
}

/// GET /v1/events - raw event search, newest first.
pub async fn search_events(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<SearchResult>, ApiError> {
    let params = search_params(&query);
    let result = query_events(&state.store, &params).await?;
    Ok(Json(result))
}

/// GET /v1/labels/{label}/values - distinct values of a label column.
pub async fn label_values(
    State(state): State<AppState>,
    Path(label): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<LabelValuesResult>, ApiError> {
    let params = search_params(&query);
    let result = run_label_values(&state.store, &label, &params).await?;
    Ok(Json(result))
}

/// GET /v1/data/keys - distinct keys present in event payloads.
pub async fn data_keys(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<DataKeysResult>, ApiError> {
    let params = search_params(&query);
    let result = run_data_keys(&state.store, &params).await?;
    Ok(Json(result))
}

/// GET /v1/data/values?key= - distinct values of one payload key.
pub async fn data_values(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<LabelValuesResult>, ApiError> {
    let key = query.get("key").cloned().unwrap_or_default();
    let params = search_params(&query);
    let result = run_data_values(&state.store, &key, &params).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_params_from_query_string() {
        let mut query = HashMap::new();
        query.insert("service".to_string(), "users".to_string());
        query.insert("level".to_string(), "error".to_string());
        query.insert("data.status".to_string(), "500".to_string());
        query.insert("limit".to_string(), "50".to_string());
        query.insert("offset".to_string(), "100".to_string());
        query.insert("from".to_string(), "2026-02-01T00:00:00Z".to_string());

        let params = search_params(&query);
        assert_eq!(params.service.as_deref(), Some("users"));
        assert_eq!(params.level.as_deref(), Some("error"));
        assert_eq!(params.data_filters["status"], "500");
        assert_eq!(params.limit, Some(50));
        assert_eq!(params.offset, Some(100));
        assert!(params.from.is_some());
        assert!(params.to.is_none());
    }

    #[test]
    fn empty_values_are_dropped() {
        let mut query = HashMap::new();
        query.insert("service".to_string(), String::new());
        let params = search_params(&query);
        assert!(params.service.is_none());
    }
}
