//! Kinepipe Kinetics - Corpus layout and pipeline runners
//!
//! Knows the Kinetics-700 annotation format and on-disk layout, and
//! drives the generic pool over it: fetch+trim whole subsets by class or
//! category, then derive frame sequences and audio tracks from the
//! clips already on disk.

pub mod config;
pub mod feeder;
pub mod metadata;
pub mod runner;
pub mod subset;

pub use config::Config;
pub use feeder::{LocalVideoFeeder, MetadataFeeder};
pub use runner::{RunOptions, Stage};
pub use subset::{DatasetLayout, Subset};
