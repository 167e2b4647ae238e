//! Execution and result reshaping for analytics, top-N, gauge and compare
//! queries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use clickhouse::Row;
use clickhouse_store::Store;
use gateway_core::{
    AnalyticsQuery, AnalyticsResult, AnalyticsRow, CompareQuery, CompareResult, Error, GaugeQuery,
    GaugeResult, Result, TopNQuery, TopNResult, TopNRow,
};
use serde::Deserialize;

use crate::sql;

#[derive(Debug, Row, Deserialize)]
struct ValueRow {
    value: f64,
    groups: Vec<String>,
}

#[derive(Debug, Row, Deserialize)]
struct KeyValueRow {
    key: String,
    value: f64,
}

pub(crate) fn group_map(
    group_by: &[String],
    values: &[String],
) -> Option<BTreeMap<String, String>> {
    if group_by.is_empty() {
        return None;
    }
    Some(
        group_by
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect(),
    )
}

/// Execute a grouped aggregation query.
pub async fn query_analytics(store: &Store, query: &AnalyticsQuery) -> Result<AnalyticsResult> {
    let (sql, params) = sql::build_analytics_sql(query)?;
    let rows: Vec<ValueRow> = store.fetch_all(&sql, &params).await?;

    let data: Vec<AnalyticsRow> = rows
        .into_iter()
        .map(|row| AnalyticsRow {
            value: row.value,
            groups: group_map(&query.group_by, &row.groups),
        })
        .collect();

    Ok(AnalyticsResult {
        total: data.len(),
        data,
    })
}

/// Execute a top-N query.
pub async fn query_topn(store: &Store, query: &TopNQuery) -> Result<TopNResult> {
    let (sql, params) = sql::build_topn_sql(query)?;
    let rows: Vec<KeyValueRow> = store.fetch_all(&sql, &params).await?;

    Ok(TopNResult {
        data: rows
            .into_iter()
            .map(|row| TopNRow {
                key: row.key,
                value: row.value,
            })
            .collect(),
    })
}

/// Execute a gauge query. An empty result (or an aggregate over zero rows,
/// which ClickHouse reports as NaN) yields 0.
pub async fn query_gauge(store: &Store, query: &GaugeQuery) -> Result<GaugeResult> {
    let (sql, params) = sql::build_gauge_sql(query)?;
    let value: Option<f64> = store.fetch_optional(&sql, &params).await?;
    let value = value.filter(|v| v.is_finite()).unwrap_or(0.0);
    Ok(GaugeResult { value })
}

/// Current and comparison windows for a compare query. When the caller
/// omits the comparison bounds, the previous window of equal length is
/// derived: `compare_to = from`, `compare_from = from - (to - from)`.
pub(crate) fn compare_windows(
    query: &CompareQuery,
) -> Result<(
    (DateTime<Utc>, DateTime<Utc>),
    (DateTime<Utc>, DateTime<Utc>),
)> {
    let (from, to) = match (query.from, query.to) {
        (Some(from), Some(to)) => (from, to),
        _ => return Err(Error::validation("from and to are required")),
    };

    let (compare_from, compare_to) = match (query.compare_from, query.compare_to) {
        (Some(cf), Some(ct)) => (cf, ct),
        _ => {
            let duration = to - from;
            (from - duration, from)
        }
    };

    Ok(((from, to), (compare_from, compare_to)))
}

/// Execute a period comparison: two gauge queries with identical filters
/// over the current and previous windows.
pub async fn query_compare(store: &Store, query: &CompareQuery) -> Result<CompareResult> {
    let ((from, to), (compare_from, compare_to)) = compare_windows(query)?;

    let current = query_gauge(
        store,
        &GaugeQuery {
            aggregation: query.aggregation,
            field: query.field.clone(),
            filters: query.filters.clone(),
            from: Some(from),
            to: Some(to),
        },
    )
    .await?;

    let previous = query_gauge(
        store,
        &GaugeQuery {
            aggregation: query.aggregation,
            field: query.field.clone(),
            filters: query.filters.clone(),
            from: Some(compare_from),
            to: Some(compare_to),
        },
    )
    .await?;

    let change = current.value - previous.value;
    let change_percent = if previous.value != 0.0 {
        (change / previous.value) * 100.0
    } else {
        0.0
    };

    Ok(CompareResult {
        current: current.value,
        previous: previous.value,
        change,
        change_percent,
    })
}
