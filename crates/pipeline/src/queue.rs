//! Bounded multi-producer single-consumer event queue.
//!
//! Producers never block: when the buffer is full the incoming event is
//! dropped and counted. The single consumer drains in FIFO order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use gateway_core::Event;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Default)]
struct Counters {
    enqueued: AtomicU64,
    dropped: AtomicU64,
    pending: AtomicU64,
}

/// Queue statistics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Total events accepted since startup.
    pub enqueued: u64,
    /// Total events dropped due to overflow since startup.
    pub dropped: u64,
    /// Events currently buffered.
    pub pending: u64,
}

/// Producer half of the queue.
pub struct Queue {
    tx: Mutex<Option<mpsc::Sender<Event>>>,
    counters: Arc<Counters>,
}

/// Consumer half of the queue; exactly one exists per queue.
pub struct QueueConsumer {
    rx: mpsc::Receiver<Event>,
    counters: Arc<Counters>,
}

impl Queue {
    /// Creates a queue with a fixed capacity and returns both halves.
    pub fn with_capacity(capacity: usize) -> (Queue, QueueConsumer) {
        let (tx, rx) = mpsc::channel(capacity);
        let counters = Arc::new(Counters::default());
        (
            Queue {
                tx: Mutex::new(Some(tx)),
                counters: counters.clone(),
            },
            QueueConsumer { rx, counters },
        )
    }

    /// Offer an event without blocking. Returns true when accepted; a full
    /// or closed queue drops the event (newest-dropped policy) and counts
    /// it.
    pub fn try_enqueue(&self, event: Event) -> bool {
        let tx = self.tx.lock().expect("queue sender lock poisoned").clone();
        let result = match tx {
            Some(tx) => tx.try_send(event),
            None => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        match result {
            Ok(()) => {
                self.counters.enqueued.fetch_add(1, Ordering::Relaxed);
                self.counters.pending.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(event))
            | Err(mpsc::error::TrySendError::Closed(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                info!(name = %event.name, "queue overflow, dropped event");
                false
            }
        }
    }

    /// Current counters; safe to call from any task.
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.counters.enqueued.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            pending: self.counters.pending.load(Ordering::Relaxed),
        }
    }

    /// Stop accepting events. The consumer drains what is already buffered
    /// and then ends.
    pub fn close(&self) {
        self.tx.lock().expect("queue sender lock poisoned").take();
    }
}

impl QueueConsumer {
    /// Receive the next event in FIFO order; `None` once the queue is
    /// closed and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        let event = self.rx.recv().await;
        if event.is_some() {
            self.counters.pending.fetch_sub(1, Ordering::Relaxed);
        }
        event
    }
}
