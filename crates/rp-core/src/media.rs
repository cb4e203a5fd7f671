//! Media-domain enums for containers, codecs, mime types, tiers, and
//! smoothing levels.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// Output containers the encoder may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Webm,
    Mp4,
}

impl Container {
    /// File extension (without the dot) for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

// ---------------------------------------------------------------------------
// VideoCodec
// ---------------------------------------------------------------------------

/// Video codecs that may be named in a mime type's `codecs=` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    Vp9,
    Vp8,
    Avc1,
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vp9 => write!(f, "vp9"),
            Self::Vp8 => write!(f, "vp8"),
            Self::Avc1 => write!(f, "avc1"),
        }
    }
}

// ---------------------------------------------------------------------------
// MimeType
// ---------------------------------------------------------------------------

/// A container plus an optional codec, e.g. `video/webm;codecs=vp9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MimeType {
    pub container: Container,
    pub codec: Option<VideoCodec>,
}

impl MimeType {
    /// A bare container type with no codec parameter.
    pub const fn container(container: Container) -> Self {
        Self {
            container,
            codec: None,
        }
    }

    /// A container type with an explicit codec parameter.
    pub const fn with_codec(container: Container, codec: VideoCodec) -> Self {
        Self {
            container,
            codec: Some(codec),
        }
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video/{}", self.container)?;
        if let Some(codec) = self.codec {
            write!(f, ";codecs={codec}")?;
        }
        Ok(())
    }
}

impl FromStr for MimeType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(';').map(str::trim);
        let container = match parts.next().unwrap_or("") {
            "video/webm" => Container::Webm,
            "video/mp4" => Container::Mp4,
            other => {
                return Err(Error::Validation(format!("unsupported mime type: {other}")))
            }
        };
        let codec = match parts.next() {
            None => None,
            Some(param) => {
                let value = param
                    .strip_prefix("codecs=")
                    .map(|v| v.trim_matches('"'))
                    .ok_or_else(|| Error::Validation(format!("bad mime parameter: {param}")))?;
                Some(match value {
                    "vp9" => VideoCodec::Vp9,
                    "vp8" => VideoCodec::Vp8,
                    v if v.starts_with("avc1") => VideoCodec::Avc1,
                    other => {
                        return Err(Error::Validation(format!("unsupported codec: {other}")))
                    }
                })
            }
        };
        Ok(Self { container, codec })
    }
}

// ---------------------------------------------------------------------------
// QualityTier
// ---------------------------------------------------------------------------

/// Caller-facing quality preference. Selects the robust and basic presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Premium,
    High,
    #[default]
    Balanced,
    Fast,
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Premium => write!(f, "premium"),
            Self::High => write!(f, "high"),
            Self::Balanced => write!(f, "balanced"),
            Self::Fast => write!(f, "fast"),
        }
    }
}

impl FromStr for QualityTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "premium" => Ok(Self::Premium),
            "high" => Ok(Self::High),
            "balanced" => Ok(Self::Balanced),
            "fast" => Ok(Self::Fast),
            other => Err(Error::Validation(format!("unknown quality tier: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Smoothing
// ---------------------------------------------------------------------------

/// Image smoothing quality used when scaling frames onto the raster surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoothing {
    Low,
    Medium,
    High,
}

impl fmt::Display for Smoothing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tier
// ---------------------------------------------------------------------------

/// The tier that produced a compression result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Robust,
    Basic,
    Passthrough,
}

impl Tier {
    /// Fixed, unmeasured quality score reported for results of this tier.
    pub fn quality_score(&self) -> u8 {
        match self {
            Self::Robust => 7,
            Self::Basic => 5,
            Self::Passthrough => 10,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Robust => write!(f, "robust"),
            Self::Basic => write!(f, "basic"),
            Self::Passthrough => write!(f, "passthrough"),
        }
    }
}
