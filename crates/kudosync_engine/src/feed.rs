//! Snapshot feeds for observing the cache and sync status.
//!
//! Pure fan-out: the engine publishes full snapshots, subscribers
//! receive the current value immediately on subscribe and every
//! subsequent value in publish order. Disconnected subscribers are
//! pruned on the next publish.

use parking_lot::RwLock;
use std::sync::mpsc::{self, Receiver, Sender};

/// A feed that retains the latest snapshot and fans it out to
/// subscribers.
pub struct SnapshotFeed<T: Clone> {
    subscribers: RwLock<Vec<Sender<T>>>,
    current: RwLock<T>,
}

impl<T: Clone> SnapshotFeed<T> {
    /// Creates a feed with the given initial snapshot.
    pub fn new(initial: T) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            current: RwLock::new(initial),
        }
    }

    /// Subscribes to the feed.
    ///
    /// The current snapshot is delivered immediately; every later
    /// publish delivers a fresh one. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> Receiver<T> {
        let (tx, rx) = mpsc::channel();
        // The initial send and the registration happen under the same
        // lock publish takes, so no publish can land between them and
        // leave the new subscriber a gap.
        let mut subscribers = self.subscribers.write();
        let _ = tx.send(self.current.read().clone());
        subscribers.push(tx);
        rx
    }

    /// Returns the latest snapshot.
    pub fn current(&self) -> T {
        self.current.read().clone()
    }

    /// Publishes a new snapshot to all live subscribers.
    ///
    /// Updating [`current`](Self::current) and notifying happen in one
    /// critical section, so delivery order always matches the order of
    /// `current` updates even with concurrent publishers.
    pub fn publish(&self, value: T) {
        let mut subscribers = self.subscribers.write();
        *self.current.write() = value.clone();
        subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
