//! Resource limits for the ingest and query paths.
//!
//! Request body caps bound per-request memory; the query-side limits bound
//! result cardinality so a single query cannot monopolize the store.

use std::time::Duration;

// === Ingest ===

/// Maximum NDJSON ingest body size (10 MiB).
pub const MAX_INGEST_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Maximum analytics query body size (1 MiB).
pub const MAX_QUERY_BODY_BYTES: usize = 1024 * 1024;

// === Query compiler ===

/// Maximum number of GROUP BY fields per query.
pub const MAX_GROUP_BY_FIELDS: usize = 10;

/// Maximum number of data points a time series query may produce.
pub const MAX_TIME_SERIES_POINTS: i64 = 10_000;

/// Maximum time range for a time series query, in days.
pub const MAX_QUERY_RANGE_DAYS: i64 = 90;

/// Analytics row limit: default and cap.
pub const DEFAULT_ANALYTICS_LIMIT: u64 = 100;
pub const MAX_ANALYTICS_LIMIT: u64 = 10_000;

/// Top-N limit: default and cap.
pub const DEFAULT_TOPN_LIMIT: u64 = 10;
pub const MAX_TOPN_LIMIT: u64 = 1_000;

/// Event search limit: default and cap.
pub const DEFAULT_SEARCH_LIMIT: u64 = 100;
pub const MAX_SEARCH_LIMIT: u64 = 1_000;

/// Row cap for label / key / value discovery queries.
pub const MAX_DISCOVERY_VALUES: u64 = 1_000;

// === Store / lifecycle ===

/// Server-side statement timeout for store queries, in seconds.
pub const STORE_STATEMENT_TIMEOUT_SECS: u64 = 60;

/// Grace period for in-flight work during shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
