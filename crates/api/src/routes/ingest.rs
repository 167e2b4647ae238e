//! NDJSON ingestion endpoint.

use axum::{body::Bytes, extract::State, Json};
use gateway_core::Event;
use tracing::debug;
use validator::Validate;

use crate::response::IngestResponse;
use crate::state::AppState;

/// POST /v1/events - newline-delimited JSON ingest.
///
/// Each line is parsed and validated independently; a bad line is skipped
/// and counted, it never aborts the batch. Valid events are offered to the
/// queue without waiting for a flush.
pub async fn ingest_events(
    State(state): State<AppState>,
    body: Bytes,
) -> Json<IngestResponse> {
    let mut accepted = 0u64;
    let mut skipped = 0u64;

    for line in body.split(|b| *b == b'\n') {
        let line = line.trim_ascii();
        if line.is_empty() {
            continue;
        }

        let event: Event = match serde_json::from_slice(line) {
            Ok(event) => event,
            Err(err) => {
                debug!(error = %err, "skipping malformed event line");
                skipped += 1;
                continue;
            }
        };

        if let Err(err) = event.validate() {
            debug!(error = %err, "skipping invalid event");
            skipped += 1;
            continue;
        }

        state.queue.try_enqueue(event);
        accepted += 1;
    }

    Json(IngestResponse { accepted, skipped })
}
