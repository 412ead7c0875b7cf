//! Configuration loading from TOML files

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::subset::{DatasetLayout, Subset};

/// Global configuration for kinepipe
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub metadata: MetadataConfig,
    pub logs: LogsConfig,
    pub workers: WorkersConfig,
    pub frames: FramesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub root: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./dataset"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub train: PathBuf,
    pub valid: PathBuf,
    pub test: PathBuf,
    pub classes: PathBuf,
    pub categories: PathBuf,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            train: PathBuf::from("resources/kinetics_700_train.json"),
            valid: PathBuf::from("resources/kinetics_700_val.json"),
            test: PathBuf::from("resources/kinetics_700_test.json"),
            classes: PathBuf::from("resources/classes.json"),
            categories: PathBuf::from("resources/categories.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Failure log; doubles as the known-failed skip set on the next run.
    pub failed: PathBuf,
    /// Per-run stats table; `None` disables stats collection.
    pub stats: Option<PathBuf>,
    /// Raw external-tool output, appended across invocations.
    pub tool: Option<PathBuf>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            failed: PathBuf::from("dataset/failed.csv"),
            stats: None,
            tool: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub max: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            default: cpus.min(8),
            max: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FramesConfig {
    /// Shorter-side target after rescaling, in pixels.
    pub shorter_side: u32,
    pub resize: bool,
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            shorter_side: kinepipe_media::FRAME_SHORT_SIDE,
            resize: true,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./kinepipe.toml (current directory)
    /// 2. ~/.config/kinepipe/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("kinepipe.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "kinepipe") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(&self.dataset.root)
    }

    /// Timestamped stats path under the dataset root, for runs that want
    /// stats without naming a file.
    pub fn timestamped_stats_path(&self) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y-%m-%d-%H-%M-%S");
        self.dataset.root.join(format!("{stamp}-stats.csv"))
    }

    /// Metadata file for one subset.
    pub fn metadata_path(&self, subset: Subset) -> &PathBuf {
        match subset {
            Subset::Train => &self.metadata.train,
            Subset::Valid => &self.metadata.valid,
            Subset::Test => &self.metadata.test,
        }
    }
}
