//! Ingest pipeline: bounded event queue and batch flusher.

pub mod batcher;
pub mod queue;

pub use batcher::{BatchWriter, Batcher};
pub use queue::{Queue, QueueConsumer, QueueStats};
