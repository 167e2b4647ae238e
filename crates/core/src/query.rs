//! Typed query model for the analytics read path.
//!
//! These shapes are the only input the query compiler accepts; everything
//! here is data, the SQL synthesis lives in the `analytics` crate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Aggregation applied to the matched events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    #[default]
    Count,
    Sum,
    Avg,
    Min,
    Max,
    CountUnique,
    P50,
    P90,
    P95,
    P99,
}

impl AggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
            Self::CountUnique => "count_unique",
            Self::P50 => "p50",
            Self::P90 => "p90",
            Self::P95 => "p95",
            Self::P99 => "p99",
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(Self::Count),
            "sum" => Ok(Self::Sum),
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "count_unique" => Ok(Self::CountUnique),
            "p50" => Ok(Self::P50),
            "p90" => Ok(Self::P90),
            "p95" => Ok(Self::P95),
            "p99" => Ok(Self::P99),
            _ => Err(crate::Error::validation("invalid aggregation type")),
        }
    }
}

/// Time bucket width for time series queries. Weeks start Monday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    Minute,
    #[default]
    Hour,
    Day,
    Week,
    Month,
}

impl IntervalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntervalKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(crate::Error::validation("invalid interval type")),
        }
    }
}

/// A single filter condition.
///
/// `field` is a known column or a `data.<key>` path. The operator is kept
/// as a string so the compiler owns the allowlist and its error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryFilter {
    pub field: String,
    /// eq, neq, lt, gt, lte, gte, contains, startswith, endswith, in.
    /// Empty means eq.
    #[serde(default)]
    pub operator: String,
    pub value: serde_json::Value,
}

fn default_order_desc() -> bool {
    true
}

/// Grouped aggregation over a time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyticsQuery {
    #[serde(default)]
    pub aggregation: AggregationKind,
    /// Required for sum, avg, min, max, count_unique and percentiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<QueryFilter>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// "value" or one of the group_by fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default = "default_order_desc")]
    pub order_desc: bool,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Bucketed time series over a time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesQuery {
    #[serde(default)]
    pub aggregation: AggregationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub interval: IntervalKind,
    /// One series per distinct group combination.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<QueryFilter>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Emit zero-valued points for empty buckets.
    #[serde(default)]
    pub fill_zeros: bool,
}

/// Top N values of one group dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopNQuery {
    #[serde(default)]
    pub aggregation: AggregationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The dimension to rank, e.g. "service" or "data.endpoint".
    #[serde(default)]
    pub group_by: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<QueryFilter>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// Single scalar aggregate over a time window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GaugeQuery {
    #[serde(default)]
    pub aggregation: AggregationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<QueryFilter>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

/// Current-versus-previous period comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub aggregation: AggregationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<QueryFilter>,
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
    /// Comparison window; derived from the current window when absent.
    #[serde(default)]
    pub compare_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub compare_to: Option<DateTime<Utc>>,
}

// === Result shapes ===

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsRow {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsResult {
    pub data: Vec<AnalyticsRow>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Group values joined with `|`; empty for the ungrouped series.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeMap<String, String>>,
    pub data_points: Vec<DataPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesResult {
    pub series: Vec<TimeSeries>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopNRow {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopNResult {
    pub data: Vec<TopNRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaugeResult {
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResult {
    pub current: f64,
    pub previous: f64,
    /// Absolute change.
    pub change: f64,
    /// Percentage change; 0 when the previous period is 0.
    pub change_percent: f64,
}

// === Event search ===

/// Filters for the raw event search and the discovery helpers.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub service: Option<String>,
    pub env: Option<String>,
    pub job_id: Option<String>,
    pub request_id: Option<String>,
    pub trace_id: Option<String>,
    pub name: Option<String>,
    pub level: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// `data.<key> = value` equality filters.
    pub data_filters: BTreeMap<String, String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub events: Vec<crate::Event>,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelValuesResult {
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataKeysResult {
    pub keys: Vec<String>,
}
