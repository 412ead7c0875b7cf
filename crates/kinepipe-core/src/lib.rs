//! Kinepipe Core - Concurrent worker-pool pipeline for corpus preparation
//!
//! This crate provides the generic acquisition/transformation pipeline:
//! a bounded work queue, a fixed pool of workers running a pluggable
//! transform, and dedicated sink threads persisting failures and
//! per-item statistics.

pub mod error;
pub mod item;
pub mod logging;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod records;
pub mod shutdown;
pub mod sink;
pub mod transform;
pub mod worker;

// Re-exports for convenience
pub use error::PoolError;
pub use item::{ItemStatus, Outcome, Timings, WorkItem};
pub use logging::init_logging;
pub use pool::{Feeder, Pool, PoolConfig};
pub use progress::{ProgressContext, SharedProgress};
pub use queue::{Message, WorkQueue};
pub use records::{FailureRecord, KnownFailedSet, StatsRecord};
pub use shutdown::{is_shutdown_requested, request_shutdown, shutdown_flag};
pub use transform::Transform;
pub use worker::RATE_LIMIT_SIGNATURE;
