//! Health endpoint exposing queue counters.

use axum::{extract::State, Json};

use crate::response::HealthResponse;
use crate::state::AppState;

/// GET /health - status and queue counters.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.queue.stats();

    Json(HealthResponse {
        status: "ok".to_string(),
        enqueued: stats.enqueued,
        dropped: stats.dropped,
        pending: stats.pending,
    })
}
