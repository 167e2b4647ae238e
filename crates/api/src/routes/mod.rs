//! API routes.

pub mod analytics;
pub mod events;
pub mod health;
pub mod ingest;
pub mod params;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use gateway_core::limits::{MAX_INGEST_BODY_BYTES, MAX_QUERY_BODY_BYTES};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    decompression::RequestDecompressionLayer,
    trace::TraceLayer,
};

use crate::middleware::auth;
use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Ingest accepts large, optionally gzipped NDJSON bodies.
    let ingest_routes = Router::new()
        .route(
            "/events",
            post(ingest::ingest_events).get(events::search_events),
        )
        .layer(RequestDecompressionLayer::new())
        .layer(DefaultBodyLimit::max(MAX_INGEST_BODY_BYTES));

    // Read queries carry small JSON bodies.
    let query_routes = Router::new()
        .route("/labels/{label}/values", get(events::label_values))
        .route("/data/keys", get(events::data_keys))
        .route("/data/values", get(events::data_values))
        .route(
            "/analytics",
            post(analytics::analytics).get(analytics::analytics_query),
        )
        .route(
            "/timeseries",
            post(analytics::timeseries).get(analytics::timeseries_query),
        )
        .route("/topn", post(analytics::topn))
        .route("/gauge", post(analytics::gauge))
        .route("/compare", post(analytics::compare))
        .layer(DefaultBodyLimit::max(MAX_QUERY_BODY_BYTES));

    let v1 = ingest_routes
        .merge(query_routes)
        .layer(from_fn_with_state(state.clone(), auth::require_api_key));

    Router::new()
        .route("/health", get(health::health))
        .nest("/v1", v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
