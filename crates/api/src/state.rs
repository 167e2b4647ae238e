//! Application state shared across handlers.

use std::sync::Arc;

use clickhouse_store::Store;
use pipeline::Queue;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Store gateway; internally thread-safe.
    pub store: Arc<Store>,
    /// Ingest queue producer half.
    pub queue: Arc<Queue>,
    /// Expected `X-Api-Key` value; `None` disables authentication.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(store: Arc<Store>, queue: Arc<Queue>, api_key: Option<String>) -> Self {
        Self {
            store,
            queue,
            api_key,
        }
    }
}
