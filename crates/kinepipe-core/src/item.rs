//! Work descriptors and per-item outcomes

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// One unit of work: a single fetch/frames/audio job.
///
/// Created by a feeder from corpus metadata, consumed exactly once by
/// exactly one worker, never mutated after creation.
#[derive(Clone, Debug)]
pub struct WorkItem {
    pub id: String,
    /// Class the item belongs to; empty for ungrouped (flat) scopes.
    pub label: String,
    /// Locator the transform understands: a remote source id or a local path.
    pub source: String,
    /// Directory the final artifact is written under.
    pub target_dir: PathBuf,
    /// Annotated `[start, end)` segment in seconds, for trimming transforms.
    pub segment: Option<(f64, f64)>,
}

/// External-tool latency split for one processed item.
#[derive(Clone, Copy, Debug, Default)]
pub struct Timings {
    pub fetch: Duration,
    pub transform: Duration,
}

impl Timings {
    pub fn total(&self) -> Duration {
        self.fetch + self.transform
    }
}

/// Result of one transform invocation.
///
/// Ephemeral — the worker converts it into a [`FailureRecord`] or
/// [`StatsRecord`] immediately.
///
/// [`FailureRecord`]: crate::records::FailureRecord
/// [`StatsRecord`]: crate::records::StatsRecord
#[derive(Clone, Debug)]
pub enum Outcome {
    Completed(Timings),
    /// Source carries no audio stream — a distinguished non-failure.
    NoAudio,
    Failed(String),
}

/// Terminal state of an item within a run, as recorded in the stats log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    Completed,
    SkippedExists,
    SkippedFailed,
    NoAudio,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Completed => "completed",
            Self::SkippedExists => "skipped-exists",
            Self::SkippedFailed => "skipped-failed",
            Self::NoAudio => "no-audio",
        };
        f.write_str(s)
    }
}
