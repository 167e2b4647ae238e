//! Query compiler for the analytics read path.
//!
//! Translates the typed query model into parameterised ClickHouse SQL and
//! reshapes result rows into typed responses. All identifiers pass an
//! allowlist before SQL synthesis; all values travel as bind parameters.

pub mod executor;
pub mod search;
pub mod sql;
pub mod timeseries;

pub use executor::{query_analytics, query_compare, query_gauge, query_topn};
pub use search::{data_keys, data_values, label_values, query_events};
pub use timeseries::query_timeseries;
