//! Feeders producing work items from metadata or a local video tree

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kinepipe_core::{Feeder, WorkItem, WorkQueue};

use crate::metadata::{class_dir_name, Metadata};

/// Create a class directory, tolerating the sibling-feeder race where it
/// appeared after the existence check.
fn create_class_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

/// Feeds fetch+trim items out of a subset's annotation metadata.
///
/// With a class list, items are grouped into per-class directories;
/// without one, every video lands flat under the target root (the test
/// subset carries no labels).
pub struct MetadataFeeder {
    metadata: Metadata,
    classes: Option<Vec<String>>,
    target_root: PathBuf,
    /// Treat an existing class directory as "this class was already
    /// fetched" and skip the whole group. Coarse but cheap; per-item
    /// artifact checks still apply when this is off.
    skip_existing_class_dirs: bool,
}

impl MetadataFeeder {
    pub fn new(
        metadata: Metadata,
        classes: Option<Vec<String>>,
        target_root: PathBuf,
        skip_existing_class_dirs: bool,
    ) -> Self {
        Self {
            metadata,
            classes,
            target_root,
            skip_existing_class_dirs,
        }
    }

    fn feed_class(&self, class: &str, dir: &Path, queue: &WorkQueue) -> io::Result<()> {
        for (id, entry) in &self.metadata {
            let ann = &entry.annotations;
            if !ann.label.eq_ignore_ascii_case(class) {
                continue;
            }
            queue.put(WorkItem {
                id: id.clone(),
                label: ann.label.clone(),
                source: id.clone(),
                target_dir: dir.to_path_buf(),
                segment: Some(ann.segment),
            })?;
        }
        Ok(())
    }
}

impl Feeder for MetadataFeeder {
    fn feed(&mut self, queue: &WorkQueue) -> io::Result<()> {
        fs::create_dir_all(&self.target_root)?;

        let Some(classes) = self.classes.clone() else {
            for (id, entry) in &self.metadata {
                queue.put(WorkItem {
                    id: id.clone(),
                    label: String::new(),
                    source: id.clone(),
                    target_dir: self.target_root.clone(),
                    segment: Some(entry.annotations.segment),
                })?;
            }
            return Ok(());
        };

        for class in &classes {
            let dir = self.target_root.join(class_dir_name(class));
            if self.skip_existing_class_dirs && dir.is_dir() {
                log::info!("class directory exists, skipping {class}");
                continue;
            }
            create_class_dir(&dir)?;
            self.feed_class(class, &dir, queue)?;
        }
        Ok(())
    }
}

/// Feeds frames/sound items by enumerating clips already on disk.
///
/// Mirrors the download layout: grouped scans `<source root>/<class>/`,
/// flat scans the source root itself. The item id is the file name
/// without its extension; the source is the clip's full path.
pub struct LocalVideoFeeder {
    source_root: PathBuf,
    target_root: PathBuf,
    classes: Option<Vec<String>>,
}

impl LocalVideoFeeder {
    pub fn new(source_root: PathBuf, target_root: PathBuf, classes: Option<Vec<String>>) -> Self {
        Self {
            source_root,
            target_root,
            classes,
        }
    }

    fn feed_dir(
        &self,
        label: &str,
        source_dir: &Path,
        target_dir: &Path,
        queue: &WorkQueue,
    ) -> io::Result<()> {
        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            queue.put(WorkItem {
                id: stem.to_string(),
                label: label.to_string(),
                source: path.to_string_lossy().into_owned(),
                target_dir: target_dir.to_path_buf(),
                segment: None,
            })?;
        }
        Ok(())
    }
}

impl Feeder for LocalVideoFeeder {
    fn feed(&mut self, queue: &WorkQueue) -> io::Result<()> {
        let Some(classes) = self.classes.clone() else {
            fs::create_dir_all(&self.target_root)?;
            return self.feed_dir("", &self.source_root, &self.target_root, queue);
        };

        for class in &classes {
            let dir_name = class_dir_name(class);
            let source_dir = self.source_root.join(&dir_name);
            if !source_dir.is_dir() {
                continue;
            }
            let target_dir = self.target_root.join(&dir_name);
            fs::create_dir_all(&target_dir)?;
            self.feed_dir(class, &source_dir, &target_dir, queue)?;
        }
        Ok(())
    }
}
