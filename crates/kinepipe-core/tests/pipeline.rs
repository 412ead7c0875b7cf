//! End-to-end pool behavior with mock transforms.
//!
//! No external tools are involved: transforms here write marker files and
//! return canned outcomes, which is enough to exercise conservation,
//! idempotent reruns, known-failure suppression and fail-fast scoping.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use kinepipe_core::{
    Outcome, Pool, PoolConfig, ProgressContext, SharedProgress, Timings, Transform, WorkItem,
    WorkQueue,
};
use tempfile::TempDir;

/// Mock transform: returns `fail_with` for ids listed in `failing`,
/// otherwise writes the artifact file and reports success.
struct ScriptedTransform {
    root: PathBuf,
    failing: Vec<&'static str>,
    fail_with: String,
    invocations: AtomicUsize,
}

impl ScriptedTransform {
    fn new(root: &TempDir) -> Self {
        Self {
            root: root.path().to_path_buf(),
            failing: Vec::new(),
            fail_with: "generic error".to_string(),
            invocations: AtomicUsize::new(0),
        }
    }

    fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl Transform for ScriptedTransform {
    fn artifact_path(&self, item: &WorkItem) -> PathBuf {
        self.root.join(format!("{}.mp4", item.id))
    }

    fn process(&self, item: &WorkItem) -> Outcome {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(&item.id.as_str()) {
            return Outcome::Failed(self.fail_with.clone());
        }
        std::fs::write(self.artifact_path(item), b"artifact").unwrap();
        Outcome::Completed(Timings {
            fetch: Duration::from_millis(100),
            transform: Duration::from_millis(100),
        })
    }
}

fn progress() -> SharedProgress {
    Arc::new(ProgressContext::new())
}

fn items(ids: &[&str], root: &TempDir) -> Vec<WorkItem> {
    ids.iter()
        .map(|id| WorkItem {
            id: id.to_string(),
            label: "jogging".to_string(),
            source: id.to_string(),
            target_dir: root.path().to_path_buf(),
            segment: Some((0.0, 10.0)),
        })
        .collect()
}

fn run_pool(
    transform: Arc<dyn Transform>,
    config: &PoolConfig,
    work: Vec<WorkItem>,
) -> Result<(), kinepipe_core::PoolError> {
    let pool = Pool::start(transform, config, &progress())?;
    let mut feeder = move |queue: &WorkQueue| {
        for item in work.clone() {
            queue.put(item)?;
        }
        Ok(())
    };
    pool.feed(&mut feeder).map_err(kinepipe_core::PoolError::Io)?;
    pool.stop()
}

fn read_rows(path: &std::path::Path, has_headers: bool) -> Vec<Vec<String>> {
    if !path.is_file() {
        return Vec::new();
    }
    csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .flexible(true)
        .from_path(path)
        .unwrap()
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[test]
fn scenario_single_worker_one_failure() {
    let dir = TempDir::new().unwrap();
    let failure_log = dir.path().join("failed.csv");
    let stats_log = dir.path().join("stats.csv");

    let transform = Arc::new(ScriptedTransform {
        failing: vec!["B"],
        ..ScriptedTransform::new(&dir)
    });
    let config = PoolConfig {
        workers: 1,
        failure_log: failure_log.clone(),
        stats_log: Some(stats_log.clone()),
    };
    run_pool(transform.clone(), &config, items(&["A", "B", "C"], &dir)).unwrap();

    let failures = read_rows(&failure_log, false);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0], ["B", "jogging", "generic error"]);

    // A then C, in feed order: a single worker preserves its own ordering.
    let stats = read_rows(&stats_log, true);
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0][0], "A");
    assert_eq!(stats[1][0], "C");
    for row in &stats {
        assert_eq!(row[2], "completed");
    }
    assert_eq!(transform.invocations(), 3);
}

#[test]
fn scenario_existing_artifact_is_never_processed() {
    let dir = TempDir::new().unwrap();
    let transform = Arc::new(ScriptedTransform::new(&dir));
    std::fs::write(dir.path().join("A.mp4"), b"already here").unwrap();

    let failure_log = dir.path().join("failed.csv");
    let stats_log = dir.path().join("stats.csv");
    let config = PoolConfig {
        workers: 1,
        failure_log: failure_log.clone(),
        stats_log: Some(stats_log.clone()),
    };
    run_pool(transform.clone(), &config, items(&["A"], &dir)).unwrap();

    assert_eq!(transform.invocations(), 0);
    assert!(read_rows(&failure_log, false).is_empty());
    let stats = read_rows(&stats_log, true);
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0][2], "skipped-exists");
}

#[test]
fn rerun_after_full_success_invokes_nothing() {
    let dir = TempDir::new().unwrap();
    let config = PoolConfig {
        workers: 2,
        failure_log: dir.path().join("failed.csv"),
        stats_log: None,
    };
    let ids = ["a", "b", "c", "d", "e"];

    let first = Arc::new(ScriptedTransform::new(&dir));
    run_pool(first.clone(), &config, items(&ids, &dir)).unwrap();
    assert_eq!(first.invocations(), ids.len());

    let second = Arc::new(ScriptedTransform::new(&dir));
    run_pool(second.clone(), &config, items(&ids, &dir)).unwrap();
    assert_eq!(second.invocations(), 0, "second run must be a pure skip pass");
}

#[test]
fn known_failed_ids_are_suppressed_without_new_records() {
    let dir = TempDir::new().unwrap();
    let failure_log = dir.path().join("failed.csv");
    std::fs::write(&failure_log, "X,jogging,HTTP Error 404\n").unwrap();

    let transform = Arc::new(ScriptedTransform::new(&dir));
    let config = PoolConfig {
        workers: 1,
        failure_log: failure_log.clone(),
        stats_log: None,
    };
    run_pool(transform.clone(), &config, items(&["X", "Y"], &dir)).unwrap();

    // Only Y reached the transform; the log still holds exactly one X row.
    assert_eq!(transform.invocations(), 1);
    assert!(dir.path().join("Y.mp4").is_file());
    assert!(!dir.path().join("X.mp4").exists());
    let failures = read_rows(&failure_log, false);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0][0], "X");
}

#[test]
fn conservation_every_item_has_exactly_one_terminal_record() {
    let dir = TempDir::new().unwrap();
    let failure_log = dir.path().join("failed.csv");
    let stats_log = dir.path().join("stats.csv");
    // Mixed bag: one pre-existing artifact, one known-failed id, two
    // failures, four successes.
    std::fs::write(&failure_log, "dead,jogging,gone\n").unwrap();

    let transform = Arc::new(ScriptedTransform {
        failing: vec!["f1", "f2"],
        ..ScriptedTransform::new(&dir)
    });
    std::fs::write(dir.path().join("done.mp4"), b"x").unwrap();

    let ids = ["done", "dead", "f1", "f2", "s1", "s2", "s3", "s4"];
    let config = PoolConfig {
        workers: 3,
        failure_log: failure_log.clone(),
        stats_log: Some(stats_log.clone()),
    };
    run_pool(transform, &config, items(&ids, &dir)).unwrap();

    let stats = read_rows(&stats_log, true);
    let failures = read_rows(&failure_log, false);
    // One pre-existing row plus the two new failures.
    assert_eq!(failures.len(), 3);
    // Every non-failed item produced exactly one stats row.
    assert_eq!(stats.len() + (failures.len() - 1), ids.len());

    let status_of = |id: &str| {
        stats
            .iter()
            .find(|row| row[0] == id)
            .map(|row| row[2].clone())
            .unwrap()
    };
    assert_eq!(status_of("done"), "skipped-exists");
    assert_eq!(status_of("dead"), "skipped-failed");
    for id in ["s1", "s2", "s3", "s4"] {
        assert_eq!(status_of(id), "completed");
    }
}

#[test]
fn rate_limited_worker_stops_while_sibling_pool_completes() {
    let dir = TempDir::new().unwrap();
    let failure_log = dir.path().join("failed.csv");

    // Worker hits the throttling signature on B and must not reach C.
    let throttled = Arc::new(ScriptedTransform {
        failing: vec!["B", "C"],
        fail_with: "ERROR: HTTP Error 429: Too Many Requests".to_string(),
        ..ScriptedTransform::new(&dir)
    });
    let config = PoolConfig {
        workers: 1,
        failure_log: failure_log.clone(),
        stats_log: None,
    };
    run_pool(throttled.clone(), &config, items(&["B", "C"], &dir)).unwrap();
    assert_eq!(throttled.invocations(), 1);
    assert!(
        read_rows(&failure_log, false).is_empty(),
        "throttling is not recorded as a per-item failure"
    );

    // A sibling pool with a healthy transform is unaffected.
    let healthy = Arc::new(ScriptedTransform::new(&dir));
    run_pool(healthy.clone(), &config, items(&["D", "E"], &dir)).unwrap();
    assert_eq!(healthy.invocations(), 2);
    assert!(dir.path().join("D.mp4").is_file());
    assert!(dir.path().join("E.mp4").is_file());
}

#[test]
fn stats_table_accumulates_across_sequential_pools() {
    // One run drives a pool per subset against the same stats path; a
    // later pool must not erase an earlier pool's rows.
    let dir = TempDir::new().unwrap();
    let stats_log = dir.path().join("stats.csv");
    let config = PoolConfig {
        workers: 1,
        failure_log: dir.path().join("failed.csv"),
        stats_log: Some(stats_log.clone()),
    };

    for id in ["train-item", "valid-item"] {
        let transform = Arc::new(ScriptedTransform::new(&dir));
        run_pool(transform, &config, items(&[id], &dir)).unwrap();
    }

    let stats = read_rows(&stats_log, true);
    let ids: Vec<&str> = stats.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, ["train-item", "valid-item"]);
    let content = std::fs::read_to_string(&stats_log).unwrap();
    assert_eq!(
        content.matches("id,label,status").count(),
        1,
        "header written once, not per pool"
    );
}

#[test]
fn failure_log_grows_monotonically_across_runs() {
    let dir = TempDir::new().unwrap();
    let failure_log = dir.path().join("failed.csv");
    let config = PoolConfig {
        workers: 1,
        failure_log: failure_log.clone(),
        stats_log: None,
    };

    let first = Arc::new(ScriptedTransform {
        failing: vec!["p"],
        ..ScriptedTransform::new(&dir)
    });
    run_pool(first, &config, items(&["p"], &dir)).unwrap();

    let second = Arc::new(ScriptedTransform {
        failing: vec!["q"],
        ..ScriptedTransform::new(&dir)
    });
    run_pool(second, &config, items(&["p", "q"], &dir)).unwrap();

    let failures = read_rows(&failure_log, false);
    let ids: Vec<&str> = failures.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(ids, ["p", "q"], "p is suppressed on the second run, never rewritten");
}
