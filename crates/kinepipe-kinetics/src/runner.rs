//! Pipeline orchestration: wire feeders, transforms, and pools together

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use kinepipe_core::{is_shutdown_requested, Feeder, Pool, PoolConfig, SharedProgress, Transform};
use kinepipe_media::{require_tools, ClipDownload, FrameExtract, SoundExtract};

use crate::config::Config;
use crate::feeder::{LocalVideoFeeder, MetadataFeeder};
use crate::metadata::{load_categories, load_metadata};
use crate::subset::Subset;

/// Which derivation the pool performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Download,
    Frames,
    Sound,
}

impl Stage {
    pub fn required_tools(self) -> &'static [&'static str] {
        match self {
            Self::Download => &["yt-dlp", "ffmpeg"],
            Self::Frames | Self::Sound => &["ffmpeg", "ffprobe"],
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Download => "download",
            Self::Frames => "frames",
            Self::Sound => "sound",
        };
        f.write_str(s)
    }
}

/// Per-invocation settings layered over the config file by the caller.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub workers: usize,
    /// Skip a whole class when its directory already exists (download
    /// stage only).
    pub skip_existing_class_dirs: bool,
}

fn effective_workers(requested: usize, config: &Config) -> usize {
    let max = config.workers.max.max(1);
    if requested > max {
        log::warn!("capping workers at the configured maximum of {max}");
    }
    requested.clamp(1, max)
}

fn build_transform(stage: Stage, config: &Config) -> Arc<dyn Transform> {
    let tool_log = config.logs.tool.clone();
    match stage {
        Stage::Download => Arc::new(ClipDownload { tool_log }),
        Stage::Frames => Arc::new(FrameExtract {
            resize: config.frames.resize.then_some(config.frames.shorter_side),
            tool_log,
        }),
        Stage::Sound => Arc::new(SoundExtract { tool_log }),
    }
}

fn build_feeder(
    stage: Stage,
    classes: Option<&[String]>,
    subset: Subset,
    config: &Config,
    opts: &RunOptions,
) -> Result<Box<dyn Feeder>> {
    let layout = config.layout();
    let classes = classes.map(|c| c.to_vec());
    match stage {
        Stage::Download => {
            let metadata = load_metadata(config.metadata_path(subset))?;
            log::info!("{} metadata holds {} videos", subset, metadata.len());
            Ok(Box::new(MetadataFeeder::new(
                metadata,
                classes,
                layout.videos_root(subset),
                opts.skip_existing_class_dirs,
            )))
        }
        Stage::Frames => Ok(Box::new(LocalVideoFeeder::new(
            layout.videos_root(subset),
            layout.frames_root(subset),
            classes,
        ))),
        Stage::Sound => Ok(Box::new(LocalVideoFeeder::new(
            layout.videos_root(subset),
            layout.sound_root(subset),
            classes,
        ))),
    }
}

fn run_subset(
    stage: Stage,
    classes: Option<&[String]>,
    subset: Subset,
    config: &Config,
    opts: &RunOptions,
    progress: &SharedProgress,
) -> Result<()> {
    let started = Instant::now();
    log::info!("{stage}: processing {subset} subset");

    let transform = build_transform(stage, config);
    let mut feeder = build_feeder(stage, classes, subset, config, opts)?;
    let pool_config = PoolConfig {
        workers: effective_workers(opts.workers, config),
        failure_log: config.logs.failed.clone(),
        stats_log: config.logs.stats.clone(),
    };

    let pool = Pool::start(transform, &pool_config, progress)?;
    pool.feed(feeder.as_mut())
        .context("feeding the work queue failed")?;
    pool.stop()?;

    log::info!(
        "{stage}: {subset} subset done in {:.1}s",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Process an explicit class list over the annotated subsets.
pub fn run_classes(
    stage: Stage,
    classes: &[String],
    config: &Config,
    opts: &RunOptions,
    progress: &SharedProgress,
) -> Result<()> {
    require_tools(stage.required_tools())?;
    for subset in Subset::annotated() {
        if is_shutdown_requested() {
            log::warn!("shutdown requested, not starting the {subset} subset");
            break;
        }
        run_subset(stage, Some(classes), subset, config, opts, progress)?;
    }
    Ok(())
}

/// Process every class of one category.
pub fn run_category(
    stage: Stage,
    category: &str,
    config: &Config,
    opts: &RunOptions,
    progress: &SharedProgress,
) -> Result<()> {
    let categories = load_categories(&config.metadata.categories)?;
    let Some(classes) = categories.get(category) else {
        bail!("category {category:?} not found in {}", config.metadata.categories.display());
    };
    log::info!("category {category}: {} classes", classes.len());
    run_classes(stage, classes, config, opts, progress)
}

/// Process every category in the categories file.
pub fn run_all(
    stage: Stage,
    config: &Config,
    opts: &RunOptions,
    progress: &SharedProgress,
) -> Result<()> {
    let categories = load_categories(&config.metadata.categories)?;
    log::info!("processing all {} categories", categories.len());
    for (category, classes) in &categories {
        if is_shutdown_requested() {
            log::warn!("shutdown requested, stopping before category {category}");
            break;
        }
        log::info!("category {category}: {} classes", classes.len());
        run_classes(stage, classes, config, opts, progress)?;
    }
    Ok(())
}

/// Process the test subset, which carries no class labels and lives in a
/// flat directory.
pub fn run_test(
    stage: Stage,
    config: &Config,
    opts: &RunOptions,
    progress: &SharedProgress,
) -> Result<()> {
    require_tools(stage.required_tools())?;
    run_subset(stage, None, Subset::Test, config, opts, progress)
}
