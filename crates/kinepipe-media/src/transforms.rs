//! The three concrete transforms: fetch+trim, frames, audio

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use kinepipe_core::{Outcome, Timings, Transform, WorkItem};

use crate::error::MediaError;
use crate::ffmpeg;
use crate::probe::MediaInfo;
use crate::{download, FRAME_SHORT_SIDE};

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("cannot remove {}: {e}", path.display());
        }
    }
}

// === fetch + trim ===

/// Fetches a source video by id and trims it to the annotated segment.
pub struct ClipDownload {
    /// Diagnostic log the external tools append to, shared by all workers.
    pub tool_log: Option<PathBuf>,
}

impl ClipDownload {
    fn raw_path(&self, item: &WorkItem) -> PathBuf {
        item.target_dir.join(format!("{}_raw.mp4", item.id))
    }

    fn try_process(&self, item: &WorkItem) -> Result<Timings, MediaError> {
        let (start, end) = item.segment.ok_or_else(|| MediaError::Parse {
            tool: "metadata",
            message: format!("item {} has no annotated segment", item.id),
        })?;

        let raw = self.raw_path(item);
        let final_path = self.artifact_path(item);
        // residue from an interrupted earlier run; always restart clean
        remove_if_exists(&raw);
        remove_if_exists(&raw.with_extension("mkv"));

        let log = self.tool_log.as_deref();

        let fetch_start = Instant::now();
        let fetched = download::fetch_video(&item.source, &raw, log);
        let fetch = fetch_start.elapsed();

        // The best-format fallback can land as mkv under the same stem.
        let raw = if raw.exists() {
            raw
        } else {
            raw.with_extension("mkv")
        };
        if let Err(e) = fetched {
            remove_if_exists(&raw);
            return Err(e);
        }

        let trim_start = Instant::now();
        let trimmed = ffmpeg::cut_clip(&raw, &final_path, start, end, log);
        let transform = trim_start.elapsed();

        remove_if_exists(&raw);
        if let Err(e) = trimmed {
            remove_if_exists(&final_path);
            return Err(e);
        }
        Ok(Timings { fetch, transform })
    }
}

impl Transform for ClipDownload {
    fn artifact_path(&self, item: &WorkItem) -> PathBuf {
        item.target_dir.join(format!("{}.mp4", item.id))
    }

    fn process(&self, item: &WorkItem) -> Outcome {
        match self.try_process(item) {
            Ok(timings) => Outcome::Completed(timings),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

// === frames ===

/// Decodes every frame of a local clip into numbered JPEGs.
pub struct FrameExtract {
    /// Shorter-side target in pixels; `None` keeps the source resolution.
    pub resize: Option<u32>,
    pub tool_log: Option<PathBuf>,
}

impl Default for FrameExtract {
    fn default() -> Self {
        Self {
            resize: Some(FRAME_SHORT_SIDE),
            tool_log: None,
        }
    }
}

impl FrameExtract {
    fn try_process(&self, item: &WorkItem) -> Result<Timings, MediaError> {
        let src = PathBuf::from(&item.source);
        let dir = self.artifact_path(item);
        fs::create_dir_all(&dir)?;

        let started = Instant::now();
        let result = self.decode_and_verify(&src, &dir);
        let transform = started.elapsed();

        if let Err(e) = result {
            // a partial frame set must not satisfy the rerun skip check
            if let Err(rm) = fs::remove_dir_all(&dir) {
                log::warn!("cannot remove {}: {rm}", dir.display());
            }
            return Err(e);
        }
        Ok(Timings {
            fetch: Duration::ZERO,
            transform,
        })
    }

    fn decode_and_verify(&self, src: &Path, dir: &Path) -> Result<(), MediaError> {
        ffmpeg::extract_frames(src, dir, self.resize, self.tool_log.as_deref())?;

        let written = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".jpg"))
            .count() as u64;

        verify_frame_count(written, MediaInfo::probe(src)?.frame_count()?)
    }
}

/// Guard against partial or corrupt decodes: the number of written images
/// must match the container-reported count. A container that declares no
/// count degrades the check to "wrote at least one frame".
fn verify_frame_count(written: u64, expected: Option<u64>) -> Result<(), MediaError> {
    match expected {
        Some(expected) if written != expected => Err(MediaError::Parse {
            tool: "ffmpeg",
            message: format!("wrote {written} frames, container reports {expected}"),
        }),
        None if written == 0 => Err(MediaError::Parse {
            tool: "ffmpeg",
            message: "no frames written".to_string(),
        }),
        _ => Ok(()),
    }
}

impl Transform for FrameExtract {
    fn artifact_path(&self, item: &WorkItem) -> PathBuf {
        item.target_dir.join(&item.id)
    }

    fn process(&self, item: &WorkItem) -> Outcome {
        match self.try_process(item) {
            Ok(timings) => Outcome::Completed(timings),
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}

// === audio ===

/// Extracts the audio track of a local clip as mp3.
pub struct SoundExtract {
    pub tool_log: Option<PathBuf>,
}

impl SoundExtract {
    fn try_process(&self, item: &WorkItem) -> Result<Outcome, MediaError> {
        let src = PathBuf::from(&item.source);
        if !MediaInfo::probe(&src)?.has_audio() {
            return Ok(Outcome::NoAudio);
        }

        let dest = self.artifact_path(item);
        let started = Instant::now();
        let extracted = ffmpeg::extract_audio(&src, &dest, self.tool_log.as_deref());
        let transform = started.elapsed();

        if let Err(e) = extracted {
            remove_if_exists(&dest);
            return Err(e);
        }
        Ok(Outcome::Completed(Timings {
            fetch: Duration::ZERO,
            transform,
        }))
    }
}

impl Transform for SoundExtract {
    fn artifact_path(&self, item: &WorkItem) -> PathBuf {
        item.target_dir.join(format!("{}.mp3", item.id))
    }

    fn process(&self, item: &WorkItem) -> Outcome {
        match self.try_process(item) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e.to_string()),
        }
    }
}
