//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! compression defaults and external tool overrides. Every section defaults
//! sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::media::QualityTier;
use crate::Error;

/// Default size target: 20 MiB.
pub const DEFAULT_TARGET_SIZE_BYTES: u64 = 20 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub compression: CompressionConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let c = &self.compression;

        if c.target_size_bytes == 0 {
            warnings.push(
                "compression.target_size_bytes is 0; every input will be re-encoded".into(),
            );
        }

        if c.thumbnail_width == 0 || c.thumbnail_height == 0 {
            warnings.push(format!(
                "compression thumbnail size {}x{} is empty; thumbnails will be omitted",
                c.thumbnail_width, c.thumbnail_height
            ));
        }

        if c.thumbnail_jpeg_quality == 0 || c.thumbnail_jpeg_quality > 100 {
            warnings.push(format!(
                "compression.thumbnail_jpeg_quality {} is outside 1-100",
                c.thumbnail_jpeg_quality
            ));
        }

        if !c.thumbnail_at_secs.is_finite() || c.thumbnail_at_secs < 0.0 {
            warnings.push(format!(
                "compression.thumbnail_at_secs {} is not a valid timestamp",
                c.thumbnail_at_secs
            ));
        }

        if self.tools.timeout_secs == 0 {
            warnings.push("tools.timeout_secs is 0; every tool call will time out".into());
        }

        for (name, path) in [
            ("ffmpeg_path", &self.tools.ffmpeg_path),
            ("ffprobe_path", &self.tools.ffprobe_path),
        ] {
            if let Some(p) = path {
                if !p.exists() {
                    warnings.push(format!(
                        "tools.{name} {} does not exist; falling back to PATH",
                        p.display()
                    ));
                }
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Defaults applied to every compression call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Inputs at or below this size are passed through untouched.
    pub target_size_bytes: u64,
    pub quality_tier: QualityTier,
    /// Advisory; only passthrough can actually keep the audio track.
    pub preserve_audio: bool,
    pub thumbnail_at_secs: f64,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    pub thumbnail_jpeg_quality: u8,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            target_size_bytes: DEFAULT_TARGET_SIZE_BYTES,
            quality_tier: QualityTier::Balanced,
            preserve_audio: true,
            thumbnail_at_secs: 5.0,
            thumbnail_width: 640,
            thumbnail_height: 360,
            thumbnail_jpeg_quality: 80,
        }
    }
}

/// Paths and limits for external CLI tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ffprobe_path: None,
            timeout_secs: 300,
        }
    }
}
