//! Bounded channels and the end-of-input sentinel envelope

use std::io;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::item::WorkItem;

/// Capacity of the work and sink channels.
///
/// Bounds memory use and gives producers backpressure when workers or
/// sinks fall behind.
pub const CHANNEL_CAPACITY: usize = 100;

/// Channel envelope: a payload, or the end-of-input sentinel.
///
/// Exactly one `Done` is consumed per receiver during orderly shutdown.
#[derive(Clone, Debug)]
pub enum Message<T> {
    Record(T),
    Done,
}

/// Create a bounded sentinel-carrying channel.
pub fn channel<T>() -> (Sender<Message<T>>, Receiver<Message<T>>) {
    bounded(CHANNEL_CAPACITY)
}

/// Producer handle feeders push work descriptors into.
///
/// `put` blocks while the channel is full (backpressure) and reports a
/// closed channel as `BrokenPipe`, which only happens if the pool was
/// torn down while a feeder is still running.
#[derive(Clone)]
pub struct WorkQueue {
    tx: Sender<Message<WorkItem>>,
}

impl WorkQueue {
    pub fn new(tx: Sender<Message<WorkItem>>) -> Self {
        Self { tx }
    }

    /// Enqueue one item, blocking while the queue is full.
    pub fn put(&self, item: WorkItem) -> io::Result<()> {
        self.tx
            .send(Message::Record(item))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "work queue closed"))
    }
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("len", &self.tx.len())
            .finish_non_exhaustive()
    }
}
