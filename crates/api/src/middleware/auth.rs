//! API key authentication middleware.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::response::ApiError;
use crate::state::AppState;

/// Check the `X-Api-Key` header against the configured key. When no key is
/// configured all requests pass (development mode).
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = &state.api_key {
        let provided = request
            .headers()
            .get("x-api-key")
            .and_then(|v| v.to_str().ok());

        if provided != Some(expected.as_str()) {
            warn!(path = %request.uri().path(), "rejected request with missing or wrong API key");
            return Err(ApiError::unauthorized());
        }
    }

    Ok(next.run(request).await)
}
