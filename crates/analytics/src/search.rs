//! Raw event search and label / key discovery.

use chrono::DateTime;
use clickhouse::Row;
use clickhouse_store::{SqlParam, Store};
use gateway_core::limits::{DEFAULT_SEARCH_LIMIT, MAX_DISCOVERY_VALUES, MAX_SEARCH_LIMIT};
use gateway_core::{
    DataKeysResult, Error, Event, LabelValuesResult, Result, SearchParams, SearchResult,
};
use serde::Deserialize;

use crate::sql::EVENTS_TABLE;

/// Labels eligible for value discovery.
const VALID_LABELS: [&str; 4] = ["service", "env", "name", "level"];

#[derive(Debug, Row, Deserialize)]
struct EventSearchRow {
    /// DateTime64(3) as milliseconds since epoch.
    timestamp: i64,
    service: String,
    env: String,
    job_id: String,
    request_id: String,
    trace_id: String,
    name: String,
    level: String,
    data: String,
}

impl From<EventSearchRow> for Event {
    fn from(row: EventSearchRow) -> Self {
        let data = if row.data.is_empty() || row.data == "{}" {
            None
        } else {
            serde_json::from_str(&row.data).ok()
        };

        Event {
            timestamp: DateTime::from_timestamp_millis(row.timestamp).unwrap_or_default(),
            service: row.service,
            name: row.name,
            env: row.env,
            level: row.level,
            job_id: row.job_id,
            request_id: row.request_id,
            trace_id: row.trace_id,
            data,
        }
    }
}

fn push_eq(
    conditions: &mut Vec<String>,
    params: &mut Vec<SqlParam>,
    column: &str,
    value: &Option<String>,
) {
    if let Some(v) = value {
        if !v.is_empty() {
            conditions.push(format!("{column} = ?"));
            params.push(SqlParam::Text(v.clone()));
        }
    }
}

fn push_time_range(
    conditions: &mut Vec<String>,
    params: &mut Vec<SqlParam>,
    search: &SearchParams,
) {
    if let Some(from) = search.from {
        conditions.push("timestamp >= fromUnixTimestamp64Milli(?)".to_string());
        params.push(SqlParam::Int(from.timestamp_millis()));
    }
    if let Some(to) = search.to {
        conditions.push("timestamp <= fromUnixTimestamp64Milli(?)".to_string());
        params.push(SqlParam::Int(to.timestamp_millis()));
    }
}

fn where_clause(conditions: Vec<String>) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

/// Full WHERE clause for the event search: every label column, the time
/// range, and `data.<key>` equality filters with both key and value bound.
pub(crate) fn search_where(search: &SearchParams) -> (String, Vec<SqlParam>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    push_eq(&mut conditions, &mut params, "service", &search.service);
    push_eq(&mut conditions, &mut params, "env", &search.env);
    push_eq(&mut conditions, &mut params, "job_id", &search.job_id);
    push_eq(
        &mut conditions,
        &mut params,
        "request_id",
        &search.request_id,
    );
    push_eq(&mut conditions, &mut params, "trace_id", &search.trace_id);
    push_eq(&mut conditions, &mut params, "name", &search.name);
    push_eq(&mut conditions, &mut params, "level", &search.level);
    push_time_range(&mut conditions, &mut params, search);

    for (key, value) in &search.data_filters {
        conditions.push("JSONExtractString(data, ?) = ?".to_string());
        params.push(SqlParam::Text(key.clone()));
        params.push(SqlParam::Text(value.clone()));
    }

    (where_clause(conditions), params)
}

/// Reduced WHERE clause for the discovery helpers: label columns and the
/// time range only, with the column being enumerated excluded.
pub(crate) fn discovery_where(
    search: &SearchParams,
    exclude: Option<&str>,
) -> (String, Vec<SqlParam>) {
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    let columns: [(&str, &Option<String>); 4] = [
        ("service", &search.service),
        ("env", &search.env),
        ("name", &search.name),
        ("level", &search.level),
    ];
    for (column, value) in columns {
        if exclude != Some(column) {
            push_eq(&mut conditions, &mut params, column, value);
        }
    }
    push_time_range(&mut conditions, &mut params, search);

    (where_clause(conditions), params)
}

/// Search raw events, newest first, with a total count.
pub async fn query_events(store: &Store, search: &SearchParams) -> Result<SearchResult> {
    let limit = match search.limit {
        Some(l) if l > 0 => l.min(MAX_SEARCH_LIMIT),
        _ => DEFAULT_SEARCH_LIMIT,
    };
    let offset = search.offset.unwrap_or(0);

    let (where_clause, params) = search_where(search);

    let count_sql = format!("SELECT count() FROM {EVENTS_TABLE}{where_clause}");
    let total: u64 = store.fetch_one(&count_sql, &params).await?;

    let sql = format!(
        "SELECT toUnixTimestamp64Milli(timestamp) AS timestamp, service, env, job_id, \
         request_id, trace_id, name, level, data FROM {EVENTS_TABLE}{where_clause} \
         ORDER BY timestamp DESC LIMIT {limit} OFFSET {offset}"
    );
    let rows: Vec<EventSearchRow> = store.fetch_all(&sql, &params).await?;

    Ok(SearchResult {
        events: rows.into_iter().map(Event::from).collect(),
        total,
    })
}

/// Distinct values of one allowlisted label column.
pub async fn label_values(
    store: &Store,
    label: &str,
    search: &SearchParams,
) -> Result<LabelValuesResult> {
    if !VALID_LABELS.contains(&label) {
        return Err(Error::validation(format!("invalid label: {label}")));
    }

    let (where_clause, params) = discovery_where(search, Some(label));
    let sql = format!(
        "SELECT DISTINCT {label} AS value FROM {EVENTS_TABLE}{where_clause} \
         ORDER BY value LIMIT {MAX_DISCOVERY_VALUES}"
    );
    let values: Vec<String> = store.fetch_all(&sql, &params).await?;

    Ok(LabelValuesResult {
        values: values.into_iter().filter(|v| !v.is_empty()).collect(),
    })
}

/// Distinct top-level keys present in the `data` payloads.
pub async fn data_keys(store: &Store, search: &SearchParams) -> Result<DataKeysResult> {
    let (where_clause, params) = discovery_where(search, None);
    let sql = format!(
        "SELECT DISTINCT arrayJoin(JSONExtractKeys(data)) AS key FROM \
         {EVENTS_TABLE}{where_clause} ORDER BY key LIMIT {MAX_DISCOVERY_VALUES}"
    );
    let keys: Vec<String> = store.fetch_all(&sql, &params).await?;
    Ok(DataKeysResult { keys })
}

/// Distinct values of one `data.<key>` path. The key itself is a bind
/// parameter, so any key is safe here.
pub async fn data_values(
    store: &Store,
    key: &str,
    search: &SearchParams,
) -> Result<LabelValuesResult> {
    if key.is_empty() {
        return Err(Error::validation("key is required"));
    }

    let (where_clause, where_params) = discovery_where(search, None);

    // The SELECT placeholder precedes the WHERE placeholders.
    let mut params = vec![SqlParam::Text(key.to_string())];
    params.extend(where_params);

    let sql = format!(
        "SELECT DISTINCT JSONExtractString(data, ?) AS value FROM \
         {EVENTS_TABLE}{where_clause} HAVING value != '' ORDER BY value \
         LIMIT {MAX_DISCOVERY_VALUES}"
    );
    let values: Vec<String> = store.fetch_all(&sql, &params).await?;

    Ok(LabelValuesResult { values })
}
