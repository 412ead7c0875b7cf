//! ffmpeg invocations: segment cut, frame dump, audio extraction

use std::path::Path;
use std::process::Command;

use crate::command::run_tool;
use crate::error::MediaError;

/// Target length of the shorter frame side after rescaling.
pub const FRAME_SHORT_SIDE: u32 = 256;

/// JPEG quality for dumped frames (ffmpeg qscale, 2 best to 31 worst).
pub const FRAME_QUALITY: u32 = 6;

/// Cut `[start, end]` seconds out of `src` into `dest` without
/// re-encoding.
pub fn cut_clip(
    src: &Path,
    dest: &Path,
    start: f64,
    end: f64,
    log_file: Option<&Path>,
) -> Result<(), MediaError> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-loglevel", "error", "-i"])
        .arg(src)
        .args(["-ss", &format!("{start}"), "-to", &format!("{end}")])
        .args(["-c", "copy", "-y"])
        .arg(dest);
    run_tool("ffmpeg", &mut cmd, log_file)
}

/// Scale filter keeping aspect ratio with the shorter side pinned to
/// `short_side`. `-2` keeps the free dimension even, which JPEG writers
/// require. The commas inside if() must be escaped so ffmpeg does not
/// split the filter on them.
pub(crate) fn scale_filter(short_side: u32) -> String {
    let s = short_side;
    format!("scale=if(gt(iw\\,ih)\\,-2\\,{s}):if(gt(iw\\,ih)\\,{s}\\,-2)")
}

/// Dump every frame of `src` as `frame0.jpg`, `frame1.jpg`, ... under
/// `dest_dir`, rescaled so the shorter side is `resize` when set.
pub fn extract_frames(
    src: &Path,
    dest_dir: &Path,
    resize: Option<u32>,
    log_file: Option<&Path>,
) -> Result<(), MediaError> {
    let pattern = dest_dir.join("frame%d.jpg");
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-loglevel", "error", "-i"]).arg(src);
    if let Some(short_side) = resize {
        cmd.args(["-vf", &scale_filter(short_side)]);
    }
    cmd.args(["-qscale:v", &FRAME_QUALITY.to_string()])
        .args(["-start_number", "0", "-y"])
        .arg(pattern);
    run_tool("ffmpeg", &mut cmd, log_file)
}

/// Extract the audio track of `src` into an mp3 at `dest`.
pub fn extract_audio(src: &Path, dest: &Path, log_file: Option<&Path>) -> Result<(), MediaError> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-loglevel", "error", "-i"])
        .arg(src)
        .args(["-vn", "-y"])
        .arg(dest);
    run_tool("ffmpeg", &mut cmd, log_file)
}
