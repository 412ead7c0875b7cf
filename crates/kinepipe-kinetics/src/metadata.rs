//! Kinetics annotation files: per-video metadata, class and category lists

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// One video's annotation block.
#[derive(Clone, Debug, Deserialize)]
pub struct Annotations {
    pub label: String,
    /// Annotated `[start, end)` window in seconds.
    pub segment: (f64, f64),
}

/// One entry of a Kinetics metadata file, keyed by video id.
#[derive(Clone, Debug, Deserialize)]
pub struct VideoEntry {
    pub annotations: Annotations,
}

/// Full metadata for one subset: video id to annotation entry.
pub type Metadata = FxHashMap<String, VideoEntry>;

/// Load a Kinetics metadata JSON file
/// (`{"<video id>": {"annotations": {"label": ..., "segment": [s, e]}}, ...}`).
pub fn load_metadata(path: &Path) -> anyhow::Result<Metadata> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse metadata file: {}", path.display()))
}

/// Load a JSON list of class names.
pub fn load_classes(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read classes file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse classes file: {}", path.display()))
}

/// Load the category to class-list map. Ordered map so `--all` walks
/// categories deterministically.
pub fn load_categories(path: &Path) -> anyhow::Result<BTreeMap<String, Vec<String>>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read categories file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse categories file: {}", path.display()))
}

/// Directory name for a class label ("playing drums" -> "playing_drums").
pub fn class_dir_name(label: &str) -> String {
    label.replace(' ', "_")
}
