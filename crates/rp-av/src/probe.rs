//! ffprobe-based metadata extraction.
//!
//! Shells out to `ffprobe -v quiet -print_format json -show_format -show_streams`
//! and maps the JSON output into [`ProbedMedia`].

use std::path::Path;
use std::time::Duration;

use rp_core::SourceMetadata;
use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;

/// What ffprobe reported about one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbedMedia {
    /// Comma-separated demuxer names (e.g. `mov,mp4,m4a,3gp,3g2,mj2`).
    pub format_name: String,
    /// Container duration in seconds, if known.
    pub duration_secs: Option<f64>,
    /// File size in bytes as reported by ffprobe.
    pub size_bytes: Option<u64>,
    /// The first video stream, if any.
    pub video: Option<ProbedVideo>,
    /// Number of audio streams.
    pub audio_streams: usize,
}

/// The primary video stream of a probed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbedVideo {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
    /// Stream-level duration; some containers only report it here.
    pub duration_secs: Option<f64>,
}

impl ProbedMedia {
    /// Reduce the probe to what a frame source exposes.
    ///
    /// Returns `None` when there is no video stream with usable dimensions.
    pub fn metadata(&self) -> Option<SourceMetadata> {
        let video = self.video.as_ref()?;
        if video.width == 0 || video.height == 0 {
            return None;
        }
        let duration_secs = self
            .duration_secs
            .or(video.duration_secs)
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);

        Some(SourceMetadata {
            width: video.width,
            height: video.height,
            duration_secs,
            has_audio: self.audio_streams > 0,
        })
    }
}

/// Probe `input` with the ffprobe binary at `ffprobe`.
///
/// # Errors
///
/// Returns [`rp_core::Error::Tool`] if ffprobe fails or its JSON cannot be
/// parsed.
pub async fn probe_media(
    ffprobe: &Path,
    input: &Path,
    timeout: Duration,
) -> rp_core::Result<ProbedMedia> {
    let mut cmd = ToolCommand::new(ffprobe.to_path_buf());
    cmd.args([
        "-v", "quiet",
        "-print_format", "json",
        "-show_format",
        "-show_streams",
    ]);
    cmd.arg(input.to_string_lossy().as_ref());
    cmd.timeout(timeout);

    let output = cmd.execute().await?;
    parse_ffprobe_json(&output.stdout)
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

fn parse_ffprobe_json(json: &[u8]) -> rp_core::Result<ProbedMedia> {
    let ff: FfprobeOutput = serde_json::from_slice(json)
        .map_err(|e| rp_core::Error::tool("ffprobe", format!("JSON parse error: {e}")))?;

    let video = ff
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .map(|s| ProbedVideo {
            codec: s.codec_name.clone().unwrap_or_default(),
            width: s.width.unwrap_or(0),
            height: s.height.unwrap_or(0),
            frame_rate: s.r_frame_rate.as_deref().and_then(parse_frame_rate),
            duration_secs: s.duration.as_deref().and_then(|d| d.parse().ok()),
        });

    let audio_streams = ff
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref() == Some("audio"))
        .count();

    Ok(ProbedMedia {
        format_name: ff.format.format_name.unwrap_or_default(),
        duration_secs: ff.format.duration.and_then(|s| s.parse::<f64>().ok()),
        size_bytes: ff.format.size.and_then(|s| s.parse::<u64>().ok()),
        video,
        audio_streams,
    })
}

fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    let parts: Vec<&str> = rate_str.split('/').collect();
    if parts.len() == 2 {
        let num: f64 = parts[0].parse().ok()?;
        let den: f64 = parts[1].parse().ok()?;
        if den != 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate_str.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
             "r_frame_rate": "30000/1001", "duration": "59.9"},
            {"codec_type": "audio", "codec_name": "aac"}
        ],
        "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "60.000000",
                   "size": "52428800"}
    }"#;

    #[test]
    fn frame_rate_fraction() {
        assert!((parse_frame_rate("24000/1001").unwrap() - 23.976).abs() < 0.01);
        assert_eq!(parse_frame_rate("30/1"), Some(30.0));
        assert_eq!(parse_frame_rate("25"), Some(25.0));
        assert_eq!(parse_frame_rate("0/0"), None);
        assert_eq!(parse_frame_rate("invalid"), None);
    }

    #[test]
    fn parses_sample_output() {
        let probed = parse_ffprobe_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(probed.size_bytes, Some(52_428_800));
        assert_eq!(probed.audio_streams, 1);

        let video = probed.video.as_ref().unwrap();
        assert_eq!(video.codec, "h264");
        assert!((video.frame_rate.unwrap() - 29.97).abs() < 0.01);

        let meta = probed.metadata().unwrap();
        assert_eq!((meta.width, meta.height), (1920, 1080));
        assert_eq!(meta.duration_secs, 60.0);
        assert!(meta.has_audio);
    }

    #[test]
    fn stream_duration_used_when_format_lacks_one() {
        let json = r#"{"streams": [{"codec_type": "video", "width": 640, "height": 360,
                       "duration": "12.5"}], "format": {}}"#;
        let meta = parse_ffprobe_json(json.as_bytes()).unwrap().metadata().unwrap();
        assert_eq!(meta.duration_secs, 12.5);
        assert!(!meta.has_audio);
    }

    #[test]
    fn audio_only_has_no_metadata() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let probed = parse_ffprobe_json(json.as_bytes()).unwrap();
        assert!(probed.video.is_none());
        assert!(probed.metadata().is_none());
    }

    #[test]
    fn garbage_is_tool_error() {
        let err = parse_ffprobe_json(b"not json").unwrap_err();
        assert!(err.to_string().contains("ffprobe"));
    }
}
