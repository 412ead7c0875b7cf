//! Kinepipe Media - External-tool transforms
//!
//! Wraps the blocking external tools (yt-dlp, ffmpeg, ffprobe) and
//! provides the three concrete [`Transform`](kinepipe_core::Transform)
//! implementations: fetch+trim, decode-to-frames, decode-to-audio.

pub mod command;
pub mod download;
pub mod error;
pub mod ffmpeg;
pub mod probe;
pub mod transforms;

pub use command::require_tools;
pub use error::MediaError;
pub use ffmpeg::FRAME_SHORT_SIDE;
pub use transforms::{ClipDownload, FrameExtract, SoundExtract};
