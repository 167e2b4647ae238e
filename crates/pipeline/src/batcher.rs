//! Batch flusher: drains the queue and ships size- or time-triggered
//! batches to the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_core::{Event, Result};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::queue::QueueConsumer;

/// Destination for flushed batches.
#[async_trait]
pub trait BatchWriter: Send + Sync {
    async fn write_batch(&self, events: &[Event]) -> Result<()>;
}

#[async_trait]
impl<W> BatchWriter for Arc<W>
where
    W: BatchWriter + ?Sized,
{
    async fn write_batch(&self, events: &[Event]) -> Result<()> {
        (**self).write_batch(events).await
    }
}

/// Single consumer of the queue. Collects events into a preallocated
/// buffer and flushes when the batch is full, the interval elapses, the
/// queue closes, or shutdown is signalled.
pub struct Batcher<W> {
    consumer: QueueConsumer,
    writer: W,
    batch_size: usize,
    flush_interval: Duration,
    batch: Vec<Event>,
}

impl<W: BatchWriter> Batcher<W> {
    pub fn new(
        consumer: QueueConsumer,
        writer: W,
        batch_size: usize,
        flush_interval: Duration,
    ) -> Self {
        Self {
            consumer,
            writer,
            batch_size,
            flush_interval,
            batch: Vec::with_capacity(batch_size),
        }
    }

    /// Run until the queue closes or `shutdown` fires. The final flush runs
    /// after the loop exits, so events already queued are not lost.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.flush_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    self.flush().await;
                    return;
                }

                event = self.consumer.recv() => match event {
                    Some(event) => {
                        self.batch.push(event);
                        if self.batch.len() >= self.batch_size {
                            self.flush().await;
                        }
                    }
                    None => {
                        self.flush().await;
                        return;
                    }
                },

                _ = ticker.tick() => {
                    if !self.batch.is_empty() {
                        self.flush().await;
                    }
                }
            }
        }
    }

    /// Hand the current batch to the writer. The batch is reset afterwards
    /// whether the write succeeded or not; a failed batch is logged and
    /// lost.
    async fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let count = self.batch.len();
        let start = Instant::now();

        match self.writer.write_batch(&self.batch).await {
            Ok(()) => {
                info!(
                    count,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "flushed batch"
                );
            }
            Err(e) => {
                error!(count, error = %e, "failed to write batch");
            }
        }

        self.batch.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queue;
    use chrono::Utc;
    use gateway_core::Error;
    use parking_lot::Mutex;

    fn event(name: &str) -> Event {
        Event {
            timestamp: Utc::now(),
            service: "svc".into(),
            name: name.into(),
            env: String::new(),
            level: String::new(),
            job_id: String::new(),
            request_id: String::new(),
            trace_id: String::new(),
            data: None,
        }
    }

    /// Captures flushed batches in memory.
    #[derive(Clone, Default)]
    struct MockWriter {
        batches: Arc<Mutex<Vec<Vec<Event>>>>,
        should_fail: Arc<Mutex<bool>>,
    }

    impl MockWriter {
        fn batches(&self) -> Vec<Vec<Event>> {
            self.batches.lock().clone()
        }

        fn set_should_fail(&self, fail: bool) {
            *self.should_fail.lock() = fail;
        }
    }

    #[async_trait]
    impl BatchWriter for MockWriter {
        async fn write_batch(&self, events: &[Event]) -> Result<()> {
            if *self.should_fail.lock() {
                return Err(Error::store("mock writer failure"));
            }
            self.batches.lock().push(events.to_vec());
            Ok(())
        }
    }

    fn spawn_batcher(
        consumer: QueueConsumer,
        writer: MockWriter,
        batch_size: usize,
        flush_interval: Duration,
    ) -> (tokio::task::JoinHandle<()>, watch::Sender<bool>) {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let batcher = Batcher::new(consumer, writer, batch_size, flush_interval);
        (tokio::spawn(batcher.run(shutdown_rx)), shutdown_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn size_threshold_triggers_flush() {
        let (queue, consumer) = Queue::with_capacity(16);
        let writer = MockWriter::default();
        let (handle, _shutdown) =
            spawn_batcher(consumer, writer.clone(), 3, Duration::from_secs(3600));

        for i in 0..6 {
            assert!(queue.try_enqueue(event(&format!("e{i}"))));
        }
        queue.close();
        handle.await.unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[1].len(), 3);
        // Enqueue order is preserved across batches.
        assert_eq!(batches[0][0].name, "e0");
        assert_eq!(batches[1][2].name, "e5");
    }

    #[tokio::test(start_paused = true)]
    async fn interval_tick_flushes_partial_batch() {
        let (queue, consumer) = Queue::with_capacity(16);
        let writer = MockWriter::default();
        let (_handle, _shutdown) =
            spawn_batcher(consumer, writer.clone(), 100, Duration::from_secs(5));

        queue.try_enqueue(event("solo"));
        tokio::time::sleep(Duration::from_secs(6)).await;

        let batches = writer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 1);
        assert_eq!(batches[0][0].name, "solo");
    }

    #[tokio::test(start_paused = true)]
    async fn queue_close_flushes_remainder() {
        let (queue, consumer) = Queue::with_capacity(16);
        let writer = MockWriter::default();
        let (handle, _shutdown) =
            spawn_batcher(consumer, writer.clone(), 100, Duration::from_secs(3600));

        queue.try_enqueue(event("a"));
        queue.try_enqueue(event("b"));
        queue.close();
        handle.await.unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_flushes_pending_events() {
        let (queue, consumer) = Queue::with_capacity(16);
        let writer = MockWriter::default();
        let (handle, shutdown) =
            spawn_batcher(consumer, writer.clone(), 100, Duration::from_secs(3600));

        queue.try_enqueue(event("pending"));
        // Let the batcher pull the event off the queue before signalling.
        tokio::time::sleep(Duration::from_millis(10)).await;

        shutdown.send(true).unwrap();
        handle.await.unwrap();

        let batches = writer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].name, "pending");
        assert_eq!(queue.stats().pending, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_flush_discards_batch_and_continues() {
        let (queue, consumer) = Queue::with_capacity(16);
        let writer = MockWriter::default();
        writer.set_should_fail(true);
        let (handle, _shutdown) =
            spawn_batcher(consumer, writer.clone(), 2, Duration::from_secs(3600));

        queue.try_enqueue(event("lost-1"));
        queue.try_enqueue(event("lost-2"));
        tokio::time::sleep(Duration::from_millis(10)).await;

        writer.set_should_fail(false);
        queue.try_enqueue(event("kept-1"));
        queue.try_enqueue(event("kept-2"));
        queue.close();
        handle.await.unwrap();

        // Only the second batch made it; the failed one was not retried.
        let batches = writer.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].name, "kept-1");
        assert_eq!(batches[0][1].name, "kept-2");
    }
}
