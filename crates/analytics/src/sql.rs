//! SQL synthesis with strict identifier safety.
//!
//! Two allowlists govern every non-parameterised fragment: `VALID_COLUMNS`
//! for filters and time ranges, `VALID_GROUP_BY_COLUMNS` for grouping and
//! ordering. `data.<key>` paths are admitted only when the key is a plain
//! identifier. Everything else is rejected before any SQL exists.

use chrono::{DateTime, Utc};
use clickhouse_store::SqlParam;
use gateway_core::limits::{
    DEFAULT_ANALYTICS_LIMIT, DEFAULT_TOPN_LIMIT, MAX_ANALYTICS_LIMIT, MAX_GROUP_BY_FIELDS,
    MAX_TOPN_LIMIT,
};
use gateway_core::{
    AggregationKind, AnalyticsQuery, Error, GaugeQuery, IntervalKind, QueryFilter, Result,
    TimeSeriesQuery, TopNQuery,
};

pub(crate) const EVENTS_TABLE: &str = "events";

/// Columns accepted in filters and time-range clauses.
pub const VALID_COLUMNS: [&str; 8] = [
    "timestamp",
    "service",
    "env",
    "job_id",
    "request_id",
    "trace_id",
    "name",
    "level",
];

/// Columns usable in GROUP BY and ORDER BY positions.
pub const VALID_GROUP_BY_COLUMNS: [&str; 7] = [
    "service",
    "env",
    "job_id",
    "request_id",
    "trace_id",
    "name",
    "level",
];

/// `^[A-Za-z_][A-Za-z0-9_]*$` without the regex machinery.
pub(crate) fn is_safe_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Strip `data.` and validate the remaining key.
fn checked_data_key(field: &str) -> Result<&str> {
    let key = field.strip_prefix("data.").unwrap_or(field);
    if is_safe_identifier(key) {
        Ok(key)
    } else {
        Err(Error::validation(format!("invalid data field name: {key}")))
    }
}

/// SQL expression for a field in string context.
pub(crate) fn field_expr(field: &str) -> Result<String> {
    if field.starts_with("data.") {
        let key = checked_data_key(field)?;
        Ok(format!("JSONExtractString(data, '{key}')"))
    } else if VALID_GROUP_BY_COLUMNS.contains(&field) {
        Ok(field.to_string())
    } else {
        Err(Error::validation(format!("invalid field: {field}")))
    }
}

/// SQL expression for a field in numeric context. Non-numeric JSON values
/// become NULL and drop out of aggregates.
pub(crate) fn numeric_field_expr(field: &str) -> Result<String> {
    if field.starts_with("data.") {
        let key = checked_data_key(field)?;
        Ok(format!("toFloat64OrNull(JSONExtractRaw(data, '{key}'))"))
    } else {
        Err(Error::validation(
            "numeric aggregation only supported on data.* fields",
        ))
    }
}

/// Aggregation expression for the SELECT list. All kinds except `count`
/// require a field.
pub(crate) fn aggregation_expr(agg: AggregationKind, field: Option<&str>) -> Result<String> {
    fn required<'a>(field: Option<&'a str>, agg: AggregationKind) -> Result<&'a str> {
        match field {
            Some(f) if !f.is_empty() => Ok(f),
            _ => Err(Error::validation(format!(
                "field is required for {agg} aggregation"
            ))),
        }
    }

    match agg {
        AggregationKind::Count => Ok("count()".to_string()),
        AggregationKind::CountUnique => {
            let expr = field_expr(required(field, agg)?)?;
            Ok(format!("uniq({expr})"))
        }
        AggregationKind::Sum => Ok(format!("sum({})", numeric_field_expr(required(field, agg)?)?)),
        AggregationKind::Avg => Ok(format!("avg({})", numeric_field_expr(required(field, agg)?)?)),
        AggregationKind::Min => Ok(format!("min({})", numeric_field_expr(required(field, agg)?)?)),
        AggregationKind::Max => Ok(format!("max({})", numeric_field_expr(required(field, agg)?)?)),
        AggregationKind::P50 => Ok(format!(
            "quantile(0.5)({})",
            numeric_field_expr(required(field, agg)?)?
        )),
        AggregationKind::P90 => Ok(format!(
            "quantile(0.9)({})",
            numeric_field_expr(required(field, agg)?)?
        )),
        AggregationKind::P95 => Ok(format!(
            "quantile(0.95)({})",
            numeric_field_expr(required(field, agg)?)?
        )),
        AggregationKind::P99 => Ok(format!(
            "quantile(0.99)({})",
            numeric_field_expr(required(field, agg)?)?
        )),
    }
}

/// GROUP BY expressions with positional aliases.
///
/// Returns `(aliased_exprs, aliases)` where each aliased expression reads
/// `<expr> AS group_i` and GROUP BY later uses only the aliases.
pub(crate) fn group_by_exprs(group_by: &[String]) -> Result<(Vec<String>, Vec<String>)> {
    if group_by.len() > MAX_GROUP_BY_FIELDS {
        return Err(Error::resource_limit(format!(
            "too many group by fields (max {MAX_GROUP_BY_FIELDS})"
        )));
    }

    let mut exprs = Vec::with_capacity(group_by.len());
    let mut aliases = Vec::with_capacity(group_by.len());

    for (i, field) in group_by.iter().enumerate() {
        let alias = format!("group_{i}");
        if field.starts_with("data.") {
            let key = checked_data_key(field)?;
            exprs.push(format!("JSONExtractString(data, '{key}') AS {alias}"));
        } else if VALID_GROUP_BY_COLUMNS.contains(&field.as_str()) {
            exprs.push(format!("{field} AS {alias}"));
        } else {
            return Err(Error::validation(format!("invalid group by field: {field}")));
        }
        aliases.push(alias);
    }

    Ok((exprs, aliases))
}

/// Select-list column carrying all group values as one `Array(String)`, so
/// every query flavour deserialises into a fixed row shape. The aliases
/// defined inside the array literal remain visible to GROUP BY / ORDER BY.
fn groups_array_expr(aliased_exprs: &[String]) -> String {
    if aliased_exprs.is_empty() {
        "emptyArrayString() AS groups".to_string()
    } else {
        format!("[{}] AS groups", aliased_exprs.join(", "))
    }
}

fn scalar_text(value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::validation("invalid filter value")),
    }
}

fn scalar_float(field: &str, value: &serde_json::Value) -> Result<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        Error::validation(format!("invalid numeric filter value for field {field}"))
    })
}

/// Translate one filter into a condition plus its bind parameters.
fn single_filter(filter: &QueryFilter) -> Result<(String, Vec<SqlParam>)> {
    let op = filter.operator.as_str();
    let numeric_op = matches!(op, "lt" | "gt" | "lte" | "gte");

    let (expr, numeric) = if filter.field.starts_with("data.") {
        let key = checked_data_key(&filter.field)?;
        if numeric_op {
            (
                format!("toFloat64OrNull(JSONExtractRaw(data, '{key}'))"),
                true,
            )
        } else {
            (format!("JSONExtractString(data, '{key}')"), false)
        }
    } else if VALID_COLUMNS.contains(&filter.field.as_str()) {
        (filter.field.clone(), false)
    } else {
        return Err(Error::validation(format!(
            "invalid filter field: {}",
            filter.field
        )));
    };

    let scalar = |value: &serde_json::Value| -> Result<SqlParam> {
        if numeric {
            Ok(SqlParam::Float(scalar_float(&filter.field, value)?))
        } else {
            Ok(SqlParam::Text(scalar_text(value)?))
        }
    };

    match op {
        "eq" | "" => Ok((format!("{expr} = ?"), vec![scalar(&filter.value)?])),
        "neq" => Ok((format!("{expr} != ?"), vec![scalar(&filter.value)?])),
        "lt" => Ok((format!("{expr} < ?"), vec![scalar(&filter.value)?])),
        "gt" => Ok((format!("{expr} > ?"), vec![scalar(&filter.value)?])),
        "lte" => Ok((format!("{expr} <= ?"), vec![scalar(&filter.value)?])),
        "gte" => Ok((format!("{expr} >= ?"), vec![scalar(&filter.value)?])),
        "contains" => Ok((
            format!("{expr} LIKE ?"),
            vec![SqlParam::Text(format!("%{}%", scalar_text(&filter.value)?))],
        )),
        "startswith" => Ok((
            format!("{expr} LIKE ?"),
            vec![SqlParam::Text(format!("{}%", scalar_text(&filter.value)?))],
        )),
        "endswith" => Ok((
            format!("{expr} LIKE ?"),
            vec![SqlParam::Text(format!("%{}", scalar_text(&filter.value)?))],
        )),
        "in" => match &filter.value {
            serde_json::Value::Array(values) if !values.is_empty() => {
                let mut params = Vec::with_capacity(values.len());
                for v in values {
                    params.push(SqlParam::Text(scalar_text(v)?));
                }
                let placeholders = vec!["?"; values.len()].join(", ");
                Ok((format!("{expr} IN ({placeholders})"), params))
            }
            _ => Err(Error::validation("in operator requires array value")),
        },
        other => Err(Error::validation(format!("unsupported operator: {other}"))),
    }
}

/// WHERE clause shared by every query flavour: optional time bounds first,
/// then the ANDed filters. The returned string is empty or starts with
/// `" WHERE "`.
pub(crate) fn build_where(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    filters: &[QueryFilter],
) -> Result<(String, Vec<SqlParam>)> {
    let mut parts = Vec::new();
    let mut params = Vec::new();

    if let Some(from) = from {
        parts.push("timestamp >= fromUnixTimestamp64Milli(?)".to_string());
        params.push(SqlParam::Int(from.timestamp_millis()));
    }
    if let Some(to) = to {
        parts.push("timestamp <= fromUnixTimestamp64Milli(?)".to_string());
        params.push(SqlParam::Int(to.timestamp_millis()));
    }

    for filter in filters {
        let (condition, mut args) = single_filter(filter)?;
        parts.push(condition);
        params.append(&mut args);
    }

    if parts.is_empty() {
        Ok((String::new(), params))
    } else {
        Ok((format!(" WHERE {}", parts.join(" AND ")), params))
    }
}

/// Time bucket expression. Weeks start Monday.
pub(crate) fn interval_expr(interval: IntervalKind) -> &'static str {
    match interval {
        IntervalKind::Minute => "toStartOfMinute(timestamp)",
        IntervalKind::Hour => "toStartOfHour(timestamp)",
        IntervalKind::Day => "toStartOfDay(timestamp)",
        IntervalKind::Week => "toStartOfWeek(timestamp, 1)",
        IntervalKind::Month => "toStartOfMonth(timestamp)",
    }
}

fn clamp_limit(limit: Option<u64>, default: u64, max: u64) -> u64 {
    match limit {
        Some(l) if l > 0 => l.min(max),
        _ => default,
    }
}

/// Grouped aggregation statement.
pub fn build_analytics_sql(query: &AnalyticsQuery) -> Result<(String, Vec<SqlParam>)> {
    let agg = aggregation_expr(query.aggregation, query.field.as_deref())?;
    let (group_exprs, aliases) = group_by_exprs(&query.group_by)?;
    let groups_col = groups_array_expr(&group_exprs);
    let (where_clause, params) = build_where(query.from, query.to, &query.filters)?;

    let mut sql =
        format!("SELECT toFloat64({agg}) AS value, {groups_col} FROM {EVENTS_TABLE}{where_clause}");

    if !aliases.is_empty() {
        sql.push_str(&format!(" GROUP BY {}", aliases.join(", ")));
    }

    let mut order_col = "value".to_string();
    if let Some(order_by) = &query.order_by {
        if let Some(i) = query.group_by.iter().position(|g| g == order_by) {
            order_col = aliases[i].clone();
        }
    }
    let direction = if query.order_desc { "DESC" } else { "ASC" };
    sql.push_str(&format!(" ORDER BY {order_col} {direction}"));

    let limit = clamp_limit(query.limit, DEFAULT_ANALYTICS_LIMIT, MAX_ANALYTICS_LIMIT);
    sql.push_str(&format!(" LIMIT {limit}"));

    Ok((sql, params))
}

/// Bucketed time series statement, ordered by bucket ascending. The bucket
/// travels as Unix seconds so the row shape stays uniform across interval
/// kinds.
pub fn build_timeseries_sql(query: &TimeSeriesQuery) -> Result<(String, Vec<SqlParam>)> {
    let agg = aggregation_expr(query.aggregation, query.field.as_deref())?;
    let bucket = interval_expr(query.interval);
    let (group_exprs, aliases) = group_by_exprs(&query.group_by)?;
    let groups_col = groups_array_expr(&group_exprs);
    let (where_clause, params) = build_where(query.from, query.to, &query.filters)?;

    let mut group_parts = vec!["bucket".to_string()];
    group_parts.extend(aliases);

    let sql = format!(
        "SELECT toUnixTimestamp(toDateTime({bucket})) AS bucket, toFloat64({agg}) AS value, \
         {groups_col} FROM {EVENTS_TABLE}{where_clause} GROUP BY {} ORDER BY bucket ASC",
        group_parts.join(", ")
    );

    Ok((sql, params))
}

/// Top-N statement over exactly one group dimension.
pub fn build_topn_sql(query: &TopNQuery) -> Result<(String, Vec<SqlParam>)> {
    if query.group_by.is_empty() {
        return Err(Error::validation("group_by is required"));
    }

    let group_expr = if query.group_by.starts_with("data.") {
        let key = checked_data_key(&query.group_by)?;
        format!("JSONExtractString(data, '{key}')")
    } else if VALID_GROUP_BY_COLUMNS.contains(&query.group_by.as_str()) {
        query.group_by.clone()
    } else {
        return Err(Error::validation(format!(
            "invalid group by field: {}",
            query.group_by
        )));
    };

    let agg = aggregation_expr(query.aggregation, query.field.as_deref())?;
    let (where_clause, params) = build_where(query.from, query.to, &query.filters)?;
    let limit = clamp_limit(query.limit, DEFAULT_TOPN_LIMIT, MAX_TOPN_LIMIT);

    let sql = format!(
        "SELECT {group_expr} AS key, toFloat64({agg}) AS value FROM {EVENTS_TABLE}{where_clause} \
         GROUP BY key ORDER BY value DESC LIMIT {limit}"
    );

    Ok((sql, params))
}

/// Single-scalar statement.
pub fn build_gauge_sql(query: &GaugeQuery) -> Result<(String, Vec<SqlParam>)> {
    let agg = aggregation_expr(query.aggregation, query.field.as_deref())?;
    let (where_clause, params) = build_where(query.from, query.to, &query.filters)?;
    let sql = format!("SELECT toFloat64({agg}) AS value FROM {EVENTS_TABLE}{where_clause}");
    Ok((sql, params))
}
