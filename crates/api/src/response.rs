//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// Success response for ingestion.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    /// Valid events handed to the queue.
    pub accepted: u64,
    /// Malformed or invalid NDJSON lines that were dropped.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub skipped: u64,
}

/// Health check response with queue counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub enqueued: u64,
    pub dropped: u64,
    pub pending: u64,
}

/// Error payload: `{"error": "<message>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// API error carrying an HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<gateway_core::Error> for ApiError {
    fn from(err: gateway_core::Error) -> Self {
        let status =
            StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        // Store internals stay out of client responses.
        let message = match &err {
            gateway_core::Error::Store(_) => "query failed".to_string(),
            gateway_core::Error::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        Self::new(status, message)
    }
}
