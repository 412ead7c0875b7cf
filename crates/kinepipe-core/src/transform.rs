//! Pluggable unit-of-work capability

use std::path::PathBuf;

use crate::item::{Outcome, WorkItem};

/// A pluggable, stateless unit of work.
///
/// One implementation per artifact kind (fetch+trim a video, decode to
/// frames, extract an audio track). Implementations share no state; the
/// same value is invoked concurrently from every worker.
///
/// Cleanup discipline: `process` must remove any intermediate file it
/// created before returning, on success and failure alike, so a retry of
/// the same item starts clean.
pub trait Transform: Send + Sync {
    /// Deterministic final artifact path (file or directory) for an item.
    ///
    /// Workers consult this before invoking [`process`](Self::process):
    /// an existing artifact short-circuits into a skipped-exists outcome.
    fn artifact_path(&self, item: &WorkItem) -> PathBuf;

    /// Perform the unit of work for one item.
    fn process(&self, item: &WorkItem) -> Outcome;
}
