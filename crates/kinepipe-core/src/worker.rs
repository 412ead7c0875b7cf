//! Worker loop — dequeue, skip checks, transform invocation, record routing

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use indicatif::ProgressBar;

use crate::item::{ItemStatus, Outcome, Timings, WorkItem};
use crate::queue::Message;
use crate::records::{FailureRecord, KnownFailedSet, StatsRecord};
use crate::shutdown::is_shutdown_requested;
use crate::transform::Transform;

/// How long a worker waits on the queue before concluding the sentinel
/// was lost and something upstream is wedged.
pub(crate) const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Error-message fragment identifying upstream throttling. A match stops
/// the detecting worker immediately — more requests would only produce
/// more throttled failures. Scoped to the one worker, not the pool.
pub const RATE_LIMIT_SIGNATURE: &str = "HTTP Error 429";

/// Synthetic item identity for the timeout path when no item was ever
/// dequeued.
const NO_ITEM_ID: &str = "<no item>";

/// Everything one worker thread owns.
pub(crate) struct WorkerContext {
    pub name: String,
    pub work: Receiver<Message<WorkItem>>,
    pub failures: Sender<Message<FailureRecord>>,
    pub stats: Option<Sender<Message<StatsRecord>>>,
    pub transform: Arc<dyn Transform>,
    pub known_failed: Arc<KnownFailedSet>,
    pub bar: ProgressBar,
    pub dequeue_timeout: Duration,
}

/// Per-worker running totals for the moving-average duration.
struct Tally {
    seq: usize,
    elapsed_total: Duration,
}

pub(crate) fn run(ctx: WorkerContext) {
    let mut tally = Tally {
        seq: 0,
        elapsed_total: Duration::ZERO,
    };
    // Identity of the most recently dequeued item, for the best-effort
    // failure emitted on a dequeue timeout.
    let mut last_seen: Option<(String, String)> = None;

    loop {
        if is_shutdown_requested() {
            log::debug!("{}: shutdown requested, stopping", ctx.name);
            break;
        }

        let item = match ctx.work.recv_timeout(ctx.dequeue_timeout) {
            Ok(Message::Record(item)) => item,
            Ok(Message::Done) => {
                log::debug!("{}: end of input", ctx.name);
                break;
            }
            Err(RecvTimeoutError::Timeout) => {
                let (id, label) = last_seen
                    .take()
                    .unwrap_or_else(|| (NO_ITEM_ID.to_string(), String::new()));
                log::error!(
                    "{}: no work or sentinel within {:?}, giving up",
                    ctx.name,
                    ctx.dequeue_timeout
                );
                let _ = ctx.failures.send(Message::Record(FailureRecord {
                    id,
                    label,
                    error: "timed out waiting for work".to_string(),
                }));
                break;
            }
            // All producers gone: the controller was torn down early.
            // Equivalent to a sentinel.
            Err(RecvTimeoutError::Disconnected) => break,
        };

        last_seen = Some((item.id.clone(), item.label.clone()));
        ctx.bar.set_message(item.id.clone());

        // Idempotent skip: the final artifact already exists, so reruns
        // over an already-populated tree cost one stat() per item.
        if ctx.transform.artifact_path(&item).exists() {
            log::debug!("{}: {} exists, skipping", ctx.name, item.id);
            send_stats(&ctx, &item, ItemStatus::SkippedExists, Timings::default(), &tally);
            continue;
        }

        // Known dead for this run — do not hammer the source again.
        if ctx.known_failed.contains(&item.id) {
            log::debug!("{}: {} previously failed, skipping", ctx.name, item.id);
            send_stats(&ctx, &item, ItemStatus::SkippedFailed, Timings::default(), &tally);
            continue;
        }

        match ctx.transform.process(&item) {
            Outcome::Completed(timings) => {
                tally.seq += 1;
                tally.elapsed_total += timings.total();
                log::debug!(
                    "{}: {} completed in {:.1}s",
                    ctx.name,
                    item.id,
                    timings.total().as_secs_f64()
                );
                send_stats(&ctx, &item, ItemStatus::Completed, timings, &tally);
            }
            Outcome::NoAudio => {
                log::debug!("{}: {} has no audio stream", ctx.name, item.id);
                send_stats(&ctx, &item, ItemStatus::NoAudio, Timings::default(), &tally);
            }
            Outcome::Failed(message) => {
                if message.contains(RATE_LIMIT_SIGNATURE) {
                    log::error!(
                        "{}: rate limited on {}, stopping this worker",
                        ctx.name,
                        item.id
                    );
                    break;
                }
                log::warn!("{}: {} failed: {}", ctx.name, item.id, first_line(&message));
                let _ = ctx.failures.send(Message::Record(FailureRecord {
                    id: item.id,
                    label: item.label,
                    error: message,
                }));
            }
        }
    }

    ctx.bar.finish_and_clear();
}

fn send_stats(
    ctx: &WorkerContext,
    item: &WorkItem,
    status: ItemStatus,
    timings: Timings,
    tally: &Tally,
) {
    let Some(tx) = &ctx.stats else { return };
    let avg = if tally.seq > 0 {
        tally.elapsed_total.as_secs_f64() / tally.seq as f64
    } else {
        0.0
    };
    let record = StatsRecord {
        id: item.id.clone(),
        label: item.label.clone(),
        status,
        fetch_secs: round1(timings.fetch.as_secs_f64()),
        transform_secs: round1(timings.transform.as_secs_f64()),
        total_secs: round1(timings.total().as_secs_f64()),
        elapsed_total_secs: round1(tally.elapsed_total.as_secs_f64()),
        avg_secs: round1(avg),
        seq: tally.seq,
        worker: ctx.name.clone(),
    };
    let _ = tx.send(Message::Record(record));
}

fn round1(secs: f64) -> f64 {
    (secs * 10.0).round() / 10.0
}

/// Error messages from external tools can be many lines; keep logs short.
fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}
