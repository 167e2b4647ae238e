//! Batch insert of events.

use async_trait::async_trait;
use clickhouse::Row;
use gateway_core::{Error, Event, Result};
use pipeline::BatchWriter;
use serde::Serialize;

use crate::client::Store;

/// Flattened event row for the `events` table.
///
/// Field order matches the insert column list; `_inserted_at` is filled by
/// the table default.
#[derive(Debug, Clone, Row, Serialize)]
pub struct EventRow {
    /// DateTime64(3) as milliseconds since epoch.
    pub timestamp: i64,
    pub service: String,
    pub env: String,
    pub job_id: String,
    pub request_id: String,
    pub trace_id: String,
    pub name: String,
    pub level: String,
    /// JSON text; `{}` when the event carried no payload.
    pub data: String,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            timestamp: event.timestamp.timestamp_millis(),
            service: event.service.clone(),
            env: event.env.clone(),
            job_id: event.job_id.clone(),
            request_id: event.request_id.clone(),
            trace_id: event.trace_id.clone(),
            name: event.name.clone(),
            level: event.level.clone(),
            data: event.data_json(),
        }
    }
}

/// Insert a batch of events. Empty batches are a no-op.
pub async fn write_batch(store: &Store, events: &[Event]) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    let mut insert = store
        .inner()
        .insert("events")
        .map_err(|e| Error::store(format!("insert failed: {e}")))?;

    for event in events {
        insert
            .write(&EventRow::from(event))
            .await
            .map_err(|e| Error::store(format!("write failed: {e}")))?;
    }

    insert
        .end()
        .await
        .map_err(|e| Error::store(format!("commit failed: {e}")))?;

    Ok(events.len())
}

#[async_trait]
impl BatchWriter for Store {
    async fn write_batch(&self, events: &[Event]) -> Result<()> {
        write_batch(self, events).await?;
        Ok(())
    }
}
