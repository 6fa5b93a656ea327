//! Sentinel-terminated work queue shared by the fix workers.
//!
//! A bounded FIFO channel with one producer (the coordinator) and many
//! consumers (the workers). Consumers share the receiving half behind a
//! mutex; the channel itself is the only synchronisation between workers.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// Default number of entries buffered before the producer has to wait.
pub const DEFAULT_CAPACITY: usize = 1024;

/// A single queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// An object key to process.
    Key(String),
    /// No more work; the worker receiving this must exit.
    Stop,
}

/// Result of waiting on the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum Dequeued {
    Entry(Entry),
    /// Nothing arrived within the wait ceiling.
    TimedOut,
    /// The producer is gone and the queue is drained.
    Closed,
}

/// Create a queue holding at most `capacity` pending entries.
pub fn channel(capacity: usize) -> (Producer, Consumer) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (Producer { sender }, Consumer { receiver: Arc::new(Mutex::new(receiver)) })
}

/// Sending half, owned by the coordinator.
#[derive(Debug)]
pub struct Producer {
    sender: mpsc::Sender<Entry>,
}

impl Producer {
    /// Enqueue an entry, waiting while the queue is full.
    ///
    /// Hands the entry back if every consumer has already gone away.
    pub async fn push(&self, entry: Entry) -> std::result::Result<(), Entry> {
        self.sender.send(entry).await.map_err(|err| err.0)
    }

    /// Enqueue one [`Entry::Stop`] per worker.
    ///
    /// Returns how many sentinels were actually delivered.
    pub async fn stop(&self, workers: usize) -> usize {
        let mut delivered = 0;
        for _ in 0..workers {
            if self.push(Entry::Stop).await.is_err() {
                break;
            }
            delivered += 1;
        }
        delivered
    }
}

/// Receiving half; cheap to clone, one clone per worker.
#[derive(Debug, Clone)]
pub struct Consumer {
    receiver: Arc<Mutex<mpsc::Receiver<Entry>>>,
}

impl Consumer {
    /// Wait up to `wait` for the next entry.
    ///
    /// Time spent waiting for another worker to release the queue counts
    /// against the same ceiling.
    pub async fn next(&self, wait: Duration) -> Dequeued {
        let receive = async { self.receiver.lock().await.recv().await };
        match tokio::time::timeout(wait, receive).await {
            Ok(Some(entry)) => Dequeued::Entry(entry),
            Ok(None) => Dequeued::Closed,
            Err(_) => Dequeued::TimedOut,
        }
    }
}
