//! Persisted record types and the known-failed id set

use std::path::Path;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::item::ItemStatus;

/// One non-fatal item failure, appended to the failure log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureRecord {
    pub id: String,
    pub label: String,
    pub error: String,
}

/// One row of the stats table. Written once, never updated.
///
/// Durations are in seconds, rounded to one decimal. `elapsed_total_secs`
/// and `avg_secs` are per-worker running figures, not pool-wide.
#[derive(Clone, Debug, Serialize)]
pub struct StatsRecord {
    pub id: String,
    pub label: String,
    pub status: ItemStatus,
    pub fetch_secs: f64,
    pub transform_secs: f64,
    pub total_secs: f64,
    pub elapsed_total_secs: f64,
    pub avg_secs: f64,
    pub seq: usize,
    pub worker: String,
}

/// Ids recorded as permanently failed by earlier runs.
///
/// Materialized once per pool start from the first column of the failure
/// log; an id present here is never handed to a transform again within
/// the run. There is no live reload — rows appended while the pool runs
/// only take effect on the next start.
#[derive(Debug, Default)]
pub struct KnownFailedSet {
    ids: FxHashSet<String>,
}

impl KnownFailedSet {
    /// Read the failure log. A missing file yields an empty set.
    pub fn load(path: &Path) -> Result<Self, csv::Error> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;
        let mut ids = FxHashSet::default();
        for record in reader.records() {
            let record = record?;
            if let Some(id) = record.get(0) {
                if !id.is_empty() {
                    ids.insert(id.to_string());
                }
            }
        }
        log::debug!("loaded {} previously failed ids from {}", ids.len(), path.display());
        Ok(Self { ids })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let set = KnownFailedSet::load(&dir.path().join("failed.csv")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn load_reads_first_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "abc123,jogging,HTTP Error 404").unwrap();
        writeln!(file, "def456,dancing,removed by uploader").unwrap();
        drop(file);

        let set = KnownFailedSet::load(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("abc123"));
        assert!(set.contains("def456"));
        assert!(!set.contains("jogging"));
    }

    #[test]
    fn load_tolerates_short_rows() {
        // Older runs wrote id-only rows; the reader must accept both widths.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed.csv");
        std::fs::write(&path, "lonely-id\nfull,label,error\n").unwrap();

        let set = KnownFailedSet::load(&path).unwrap();
        assert!(set.contains("lonely-id"));
        assert!(set.contains("full"));
    }

    #[test]
    fn duplicate_ids_collapse() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("failed.csv");
        std::fs::write(&path, "same,a,x\nsame,a,y\n").unwrap();

        let set = KnownFailedSet::load(&path).unwrap();
        assert_eq!(set.len(), 1);
    }
}
