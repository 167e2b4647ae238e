//! Query-string parsing shared by the GET query endpoints.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gateway_core::QueryFilter;

/// Query parameters that are not filters.
pub(crate) const RESERVED_PARAMS: [&str; 10] = [
    "from",
    "to",
    "limit",
    "aggregation",
    "field",
    "group_by",
    "order_by",
    "order",
    "interval",
    "fill_zeros",
];

const FILTER_OPERATORS: [&str; 10] = [
    "eq",
    "neq",
    "lt",
    "gt",
    "lte",
    "gte",
    "contains",
    "startswith",
    "endswith",
    "in",
];

/// Parse an RFC 3339 timestamp or decimal Unix seconds.
pub(crate) fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    s.parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Split `field__op` into field and operator. A suffix outside the
/// operator allowlist means the whole key is the field, with `eq`.
pub(crate) fn parse_filter_key(key: &str) -> (String, String) {
    match key.rsplit_once("__") {
        Some((field, op)) if FILTER_OPERATORS.contains(&op) => {
            (field.to_string(), op.to_string())
        }
        _ => (key.to_string(), "eq".to_string()),
    }
}

/// Extract filters from the non-reserved query parameters. `in` values
/// split on commas.
pub(crate) fn filters_from_query(query: &HashMap<String, String>) -> Vec<QueryFilter> {
    let mut filters = Vec::new();

    for (key, value) in query {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }

        let (field, operator) = parse_filter_key(key);
        let value = if operator == "in" {
            serde_json::Value::Array(
                value
                    .split(',')
                    .map(|v| serde_json::Value::String(v.to_string()))
                    .collect(),
            )
        } else {
            serde_json::Value::String(value.clone())
        };

        filters.push(QueryFilter {
            field,
            operator,
            value,
        });
    }

    filters
}
