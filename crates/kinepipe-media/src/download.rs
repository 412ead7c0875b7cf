//! Source video fetch via yt-dlp

use std::path::Path;
use std::process::Command;

use crate::command::run_tool;
use crate::error::MediaError;

/// Shorter-side cap requested from the downloader. Frame extraction
/// rescales to 256 afterwards, so anything above 360p is wasted transfer.
pub const MAX_HEIGHT: u32 = 360;

/// Fetch a video by its platform id into `dest`.
///
/// Prefers a standalone mp4 stream at or under [`MAX_HEIGHT`], falling
/// back to the best available format (which may land as mkv under a
/// different extension, handled by the caller). `--no-continue` forces a
/// clean fetch rather than resuming a truncated partial from an earlier
/// interrupted run.
pub fn fetch_video(id: &str, dest: &Path, log_file: Option<&Path>) -> Result<(), MediaError> {
    let url = format!("https://youtube.com/watch?v={id}");
    let format = format!("bestvideo[ext=mp4][height<={MAX_HEIGHT}]/best");
    let mut cmd = Command::new("yt-dlp");
    cmd.args(["--format", &format, "--no-continue", "--output"])
        .arg(dest)
        .arg(&url);
    run_tool("yt-dlp", &mut cmd, log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_selector_caps_height() {
        let format = format!("bestvideo[ext=mp4][height<={MAX_HEIGHT}]/best");
        assert_eq!(format, "bestvideo[ext=mp4][height<=360]/best");
    }
}
