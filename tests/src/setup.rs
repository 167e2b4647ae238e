//! Test environment construction.
//!
//! Builds the real router against an in-process queue and a store handle
//! that never connects. Every covered path (ingest, auth, health,
//! validation failures) completes before any store round-trip, so no
//! ClickHouse instance is needed.

use std::sync::Arc;

use api::{router, AppState};
use axum::Router;
use clickhouse_store::{Store, StoreConfig};
use pipeline::{Queue, QueueConsumer};

pub struct TestContext {
    pub router: Router,
    pub queue: Arc<Queue>,
    /// Held so the queue stays open; tests may drain it directly.
    pub consumer: QueueConsumer,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(None, 1024)
    }

    pub fn with_api_key(api_key: &str) -> Self {
        Self::build(Some(api_key.to_string()), 1024)
    }

    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self::build(None, capacity)
    }

    fn build(api_key: Option<String>, queue_capacity: usize) -> Self {
        let store = Arc::new(Store::new(StoreConfig::default()));
        let (queue, consumer) = Queue::with_capacity(queue_capacity);
        let queue = Arc::new(queue);

        let state = AppState::new(store, queue.clone(), api_key);

        Self {
            router: router(state),
            queue,
            consumer,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
