//! Pool controller — lifecycle for workers and sinks

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::Sender;

use crate::error::PoolError;
use crate::item::WorkItem;
use crate::progress::SharedProgress;
use crate::queue::{self, Message, WorkQueue};
use crate::records::{FailureRecord, KnownFailedSet, StatsRecord};
use crate::sink;
use crate::transform::Transform;
use crate::worker::{self, WorkerContext};

/// How long `stop` waits to place each end-of-input sentinel. Workers that
/// stopped early (rate limit, fatal error) leave their queued items
/// behind; once this elapses the queue is simply dropped, which the
/// remaining workers observe as end of input.
const SENTINEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Pool configuration, supplied by the caller; the pool owns no global
/// state.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub workers: usize,
    /// Append-only failure log; also read once at start as the
    /// known-failed set.
    pub failure_log: PathBuf,
    /// Stats table path; `None` disables the stats sink entirely.
    pub stats_log: Option<PathBuf>,
}

/// Produces the work items for one run.
///
/// Runs synchronously on the controller thread; `put` blocks when the
/// queue is full, so a feeder naturally pauses while workers catch up.
pub trait Feeder {
    fn feed(&mut self, queue: &WorkQueue) -> io::Result<()>;
}

/// A closure is enough for ad-hoc feeding (and for tests).
impl<F> Feeder for F
where
    F: FnMut(&WorkQueue) -> io::Result<()>,
{
    fn feed(&mut self, queue: &WorkQueue) -> io::Result<()> {
        self(queue)
    }
}

/// A running worker pool.
///
/// Lifecycle: [`Pool::start`] loads the known-failed set and launches the
/// sinks first, then the workers; [`Pool::feed`] drives a feeder and then
/// enqueues one sentinel per worker; [`Pool::stop`] joins workers, then
/// tells each sink to stop and joins it. Sinks are never stopped before
/// all workers have, so no record is dropped.
///
/// Limitation, not an invariant: the sink channels are bounded, so a slow
/// sink plus saturated worker output can stall workers via backpressure.
pub struct Pool {
    queue: WorkQueue,
    work_tx: Sender<Message<WorkItem>>,
    workers: Vec<JoinHandle<()>>,
    failure_tx: Sender<Message<FailureRecord>>,
    failure_sink: JoinHandle<io::Result<()>>,
    stats_tx: Option<Sender<Message<StatsRecord>>>,
    stats_sink: Option<JoinHandle<io::Result<()>>>,
}

impl Pool {
    /// Launch sinks and workers. The known-failed set is read from the
    /// failure log exactly once, here.
    pub fn start(
        transform: Arc<dyn Transform>,
        config: &PoolConfig,
        progress: &SharedProgress,
    ) -> Result<Self, PoolError> {
        let known_failed = Arc::new(KnownFailedSet::load(&config.failure_log)?);
        if !known_failed.is_empty() {
            log::info!(
                "{} previously failed ids will be skipped this run",
                known_failed.len()
            );
        }

        let (work_tx, work_rx) = queue::channel();
        let (failure_tx, failure_rx) = queue::channel();

        let failure_path = config.failure_log.clone();
        let failure_sink = thread::Builder::new()
            .name("failure-sink".to_string())
            .spawn(move || sink::failure_sink(failure_rx, &failure_path))?;

        let (stats_tx, stats_sink) = match &config.stats_log {
            Some(path) => {
                let (tx, rx) = queue::channel();
                let path = path.clone();
                let handle = thread::Builder::new()
                    .name("stats-sink".to_string())
                    .spawn(move || sink::stats_sink(rx, &path))?;
                (Some(tx), Some(handle))
            }
            None => (None, None),
        };

        let mut workers = Vec::with_capacity(config.workers);
        for i in 0..config.workers {
            let name = format!("worker-{i}");
            let ctx = WorkerContext {
                name: name.clone(),
                work: work_rx.clone(),
                failures: failure_tx.clone(),
                stats: stats_tx.clone(),
                transform: Arc::clone(&transform),
                known_failed: Arc::clone(&known_failed),
                bar: progress.worker_bar(&name),
                dequeue_timeout: worker::DEQUEUE_TIMEOUT,
            };
            let handle = thread::Builder::new()
                .name(name)
                .spawn(move || worker::run(ctx))?;
            workers.push(handle);
        }
        log::debug!("pool started with {} workers", workers.len());

        Ok(Self {
            queue: WorkQueue::new(work_tx.clone()),
            work_tx,
            workers,
            failure_tx,
            failure_sink,
            stats_tx,
            stats_sink,
        })
    }

    /// Handle for pushing work items; blocks when the queue is full.
    pub fn queue(&self) -> &WorkQueue {
        &self.queue
    }

    /// Run a feeder to completion, then enqueue one end-of-input sentinel
    /// per worker.
    pub fn feed(&self, feeder: &mut dyn Feeder) -> io::Result<()> {
        feeder.feed(&self.queue)?;
        for _ in 0..self.workers.len() {
            if self
                .work_tx
                .send_timeout(Message::Done, SENTINEL_TIMEOUT)
                .is_err()
            {
                log::warn!("work queue rejected a shutdown sentinel; workers stopped early");
                break;
            }
        }
        Ok(())
    }

    /// Ordered shutdown: wait for every worker, then stop the sinks.
    ///
    /// Returns `Ok` regardless of how many items failed — per-item
    /// failures live in the failure log, not here. Only sink I/O errors
    /// surface.
    pub fn stop(self) -> Result<(), PoolError> {
        // Dropping the producer side unblocks any worker still waiting
        // after a missed sentinel.
        drop(self.queue);
        drop(self.work_tx);

        for handle in self.workers {
            let name = handle
                .thread()
                .name()
                .unwrap_or("worker")
                .to_string();
            if handle.join().is_err() {
                // Contained: sibling workers and the queues are unaffected.
                log::error!("{name} panicked; its last item is unaccounted for");
            }
        }

        let _ = self.failure_tx.send(Message::Done);
        drop(self.failure_tx);
        join_sink(self.failure_sink, "failure sink")?;

        if let Some(tx) = self.stats_tx {
            let _ = tx.send(Message::Done);
        }
        if let Some(handle) = self.stats_sink {
            join_sink(handle, "stats sink")?;
        }

        log::debug!("pool stopped");
        Ok(())
    }
}

fn join_sink(handle: JoinHandle<io::Result<()>>, what: &str) -> Result<(), PoolError> {
    match handle.join() {
        Ok(result) => result.map_err(PoolError::Io),
        Err(_) => {
            log::error!("{what} panicked");
            Ok(())
        }
    }
}
