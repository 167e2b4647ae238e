//! Events table schema.
//!
//! The `data` column is JSON text, not native JSON; the query compiler's
//! JSONExtract expressions depend on this form.

use gateway_core::Result;
use tracing::debug;

use crate::client::Store;

/// DDL for the events table.
///
/// Day partitioning keeps drops cheap under the 30 day TTL; the bloom
/// filter indexes serve point lookups on correlation ids.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    timestamp DateTime64(3),
    service LowCardinality(String),
    env LowCardinality(String),
    job_id String,
    request_id String,
    trace_id String,
    name LowCardinality(String),
    level LowCardinality(String),
    data String,
    _inserted_at DateTime DEFAULT now(),

    INDEX idx_trace_id trace_id TYPE bloom_filter GRANULARITY 1,
    INDEX idx_request_id request_id TYPE bloom_filter GRANULARITY 1,
    INDEX idx_job_id job_id TYPE bloom_filter GRANULARITY 1,
    INDEX idx_name name TYPE bloom_filter GRANULARITY 1
)
ENGINE = MergeTree()
PARTITION BY toDate(timestamp)
ORDER BY (timestamp, service, trace_id, request_id)
TTL toDateTime(timestamp) + INTERVAL 30 DAY
SETTINGS index_granularity = 8192
"#;

/// Create the events table if it does not exist yet.
pub async fn init_schema(store: &Store) -> Result<()> {
    store.execute(CREATE_EVENTS_TABLE).await?;
    debug!("events table schema initialized");
    Ok(())
}
