//! Capability probing via `ffmpeg -encoders`.

use std::collections::BTreeSet;

use rp_core::{Container, MimeType, VideoCodec};
use rp_media::EncoderCapabilities;

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// The ffmpeg encoder that produces `mime`.
///
/// A bare container maps to the encoder its browsers historically default to:
/// VP8 for WebM, H.264 for MP4.
pub fn encoder_for(mime: &MimeType) -> &'static str {
    match (mime.container, mime.codec) {
        (Container::Webm, Some(VideoCodec::Vp9)) => "libvpx-vp9",
        (Container::Webm, Some(VideoCodec::Vp8)) | (Container::Webm, None) => "libvpx",
        (Container::Mp4, Some(VideoCodec::Avc1)) | (Container::Mp4, None) => "libx264",
        // Codec/container pairs no muxer accepts; the name never matches.
        (Container::Webm, Some(VideoCodec::Avc1)) => "libx264-in-webm",
        (Container::Mp4, Some(VideoCodec::Vp9)) => "libvpx-vp9-in-mp4",
        (Container::Mp4, Some(VideoCodec::Vp8)) => "libvpx-in-mp4",
    }
}

/// Extract encoder names from `ffmpeg -encoders` output.
///
/// Entries look like ` V....D libvpx-vp9    libvpx VP9 (codec vp9)`; only
/// video encoders (flag column starting with `V`) are kept.
pub fn parse_encoder_list(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .skip_while(|line| !line.trim_start().starts_with("------"))
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let flags = parts.next()?;
            let name = parts.next()?;
            flags.starts_with('V').then(|| name.to_string())
        })
        .collect()
}

/// What the local ffmpeg build can encode.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCapabilities {
    recorder: bool,
    encoders: BTreeSet<String>,
}

impl FfmpegCapabilities {
    /// Ask ffmpeg which encoders it was built with.
    ///
    /// A missing ffmpeg, or one whose encoder list cannot be read, yields an
    /// empty capability set.
    pub async fn probe(registry: &ToolRegistry) -> Self {
        let Ok(ffmpeg) = registry.require("ffmpeg") else {
            tracing::warn!("ffmpeg not found; no encoder is available");
            return Self::default();
        };

        let mut cmd = ToolCommand::new(ffmpeg.path.clone());
        cmd.args(["-hide_banner", "-encoders"]);
        cmd.timeout(registry.timeout());

        match cmd.execute().await {
            Ok(out) => Self::from_encoders(parse_encoder_list(&out.stdout_lossy())),
            Err(e) => {
                tracing::warn!("failed to list ffmpeg encoders: {e}");
                Self {
                    recorder: true,
                    encoders: BTreeSet::new(),
                }
            }
        }
    }

    /// Capabilities of an ffmpeg that reported `encoders`.
    pub fn from_encoders(encoders: BTreeSet<String>) -> Self {
        Self {
            recorder: true,
            encoders,
        }
    }

    pub fn recorder_available_flag(&self) -> bool {
        self.recorder
    }

    pub fn known_encoders(&self) -> Vec<&str> {
        self.encoders
            .iter()
            .filter(|e| e.starts_with("libvpx") || *e == "libx264")
            .map(String::as_str)
            .collect()
    }
}

impl EncoderCapabilities for FfmpegCapabilities {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn recorder_available(&self) -> bool {
        self.recorder
    }

    fn is_type_supported(&self, mime: &MimeType) -> bool {
        self.recorder && self.encoders.contains(encoder_for(mime))
    }
}
