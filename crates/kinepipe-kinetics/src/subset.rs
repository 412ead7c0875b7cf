//! Dataset subsets and the on-disk directory layout

use std::path::{Path, PathBuf};

/// The three corpus partitions. Closed set; resolved to concrete
/// directories once, through [`DatasetLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Subset {
    Train,
    Valid,
    Test,
}

impl Subset {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "val",
            Self::Test => "test",
        }
    }

    /// The annotated subsets, in processing order. Test is handled
    /// separately because its metadata carries no labels.
    pub fn annotated() -> [Subset; 2] {
        [Self::Train, Self::Valid]
    }
}

impl std::fmt::Display for Subset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Resolves subsets to the directory tree under one dataset root:
/// `train/`, `val/`, `test/` for trimmed clips, `<subset>_frames/` for
/// frame dumps, `<subset>_sound/` for audio tracks.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn videos_root(&self, subset: Subset) -> PathBuf {
        self.root.join(subset.dir_name())
    }

    pub fn frames_root(&self, subset: Subset) -> PathBuf {
        self.root.join(format!("{}_frames", subset.dir_name()))
    }

    pub fn sound_root(&self, subset: Subset) -> PathBuf {
        self.root.join(format!("{}_sound", subset.dir_name()))
    }
}
