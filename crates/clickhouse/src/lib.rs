//! ClickHouse store gateway.
//!
//! Thin façade over the `clickhouse` driver: a long-lived client, positional
//! parameter binding for reads, RowBinary batch inserts for writes, and the
//! events table schema.

pub mod client;
pub mod config;
pub mod insert;
pub mod params;
pub mod schema;

pub use client::Store;
pub use config::StoreConfig;
pub use params::SqlParam;
