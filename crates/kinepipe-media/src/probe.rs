//! Stream inspection via ffprobe

use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use crate::error::MediaError;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    codec_type: Option<String>,
    // ffprobe reports this as a JSON string, not a number
    nb_frames: Option<String>,
}

/// Parsed `ffprobe -show_streams` result for one media file.
#[derive(Debug)]
pub struct MediaInfo {
    streams: Vec<Stream>,
}

impl MediaInfo {
    pub fn probe(path: &Path) -> Result<Self, MediaError> {
        let output = Command::new("ffprobe")
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::MissingTool("ffprobe")
                } else {
                    MediaError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(MediaError::Tool {
                tool: "ffprobe",
                output: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Self::parse(&output.stdout)
    }

    fn parse(json: &[u8]) -> Result<Self, MediaError> {
        let parsed: ProbeOutput = serde_json::from_slice(json).map_err(|e| MediaError::Parse {
            tool: "ffprobe",
            message: e.to_string(),
        })?;
        Ok(Self {
            streams: parsed.streams,
        })
    }

    pub fn has_audio(&self) -> bool {
        self.streams
            .iter()
            .any(|s| s.codec_type.as_deref() == Some("audio"))
    }

    /// Declared frame count of the first video stream, when the container
    /// records one. Streams without `nb_frames` yield `None`.
    pub fn frame_count(&self) -> Result<Option<u64>, MediaError> {
        let video = self
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"));
        match video.and_then(|s| s.nb_frames.as_deref()) {
            Some(raw) => {
                let n = raw.parse::<u64>().map_err(|_| MediaError::Parse {
                    tool: "ffprobe",
                    message: format!("bad nb_frames value {raw:?}"),
                })?;
                Ok(Some(n))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH_STREAMS: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video", "nb_frames": "250"},
            {"index": 1, "codec_type": "audio", "nb_frames": "431"}
        ]
    }"#;

    const VIDEO_ONLY: &str = r#"{
        "streams": [
            {"index": 0, "codec_type": "video"}
        ]
    }"#;

    #[test]
    fn detects_audio_stream() {
        let info = MediaInfo::parse(BOTH_STREAMS.as_bytes()).unwrap();
        assert!(info.has_audio());
    }

    #[test]
    fn no_audio_stream() {
        let info = MediaInfo::parse(VIDEO_ONLY.as_bytes()).unwrap();
        assert!(!info.has_audio());
    }

    #[test]
    fn frame_count_from_video_stream() {
        let info = MediaInfo::parse(BOTH_STREAMS.as_bytes()).unwrap();
        assert_eq!(info.frame_count().unwrap(), Some(250));
    }

    #[test]
    fn frame_count_absent() {
        let info = MediaInfo::parse(VIDEO_ONLY.as_bytes()).unwrap();
        assert_eq!(info.frame_count().unwrap(), None);
    }

    #[test]
    fn empty_streams() {
        let info = MediaInfo::parse(br#"{"streams": []}"#).unwrap();
        assert!(!info.has_audio());
        assert_eq!(info.frame_count().unwrap(), None);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = MediaInfo::parse(b"not json").unwrap_err();
        assert!(matches!(err, MediaError::Parse { tool: "ffprobe", .. }));
    }

    #[test]
    fn bad_nb_frames_is_a_parse_error() {
        let json = r#"{"streams": [{"codec_type": "video", "nb_frames": "lots"}]}"#;
        let info = MediaInfo::parse(json.as_bytes()).unwrap();
        assert!(info.frame_count().is_err());
    }
}
