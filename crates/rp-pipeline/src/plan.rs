//! Fixed encoding presets and the per-attempt [`EncodingPlan`].

use rp_core::{MimeType, QualityTier, Smoothing, SourceMetadata, Tier};
use rp_media::{scaled_dimensions, SessionSettings};

/// Scale, frame rate and smoothing for one tier at one quality setting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    pub scale: f64,
    pub frame_rate: u32,
    pub smoothing: Smoothing,
}

impl Preset {
    const fn new(scale: f64, frame_rate: u32, smoothing: Smoothing) -> Self {
        Self {
            scale,
            frame_rate,
            smoothing,
        }
    }

    /// The preset `tier` uses under `quality`. Passthrough has none.
    pub fn lookup(quality: QualityTier, tier: Tier) -> Option<Self> {
        use QualityTier::*;
        use Smoothing::{High as Hi, Low, Medium};

        let preset = match (tier, quality) {
            (Tier::Passthrough, _) => return None,
            (Tier::Robust, Premium | High) => Self::new(0.60, 15, Hi),
            (Tier::Robust, Balanced) => Self::new(0.60, 15, Medium),
            (Tier::Robust, Fast) => Self::new(0.55, 12, Low),
            (Tier::Basic, Premium) => Self::new(0.55, 12, Medium),
            (Tier::Basic, High | Balanced | Fast) => Self::new(0.50, 10, Low),
        };
        Some(preset)
    }
}

/// Number of frames a `duration_secs` clip yields at `frame_rate`.
///
/// Non-finite or negative durations yield zero frames.
pub fn total_frames(duration_secs: f64, frame_rate: u32) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs * f64::from(frame_rate)).floor() as u64
}

/// Everything one tier attempt needs, derived fresh from the loaded source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodingPlan {
    pub tier: Tier,
    pub scale: f64,
    pub frame_rate: u32,
    pub smoothing: Smoothing,
    pub mime_type: MimeType,
    pub width: u32,
    pub height: u32,
    pub total_frames: u64,
}

impl EncodingPlan {
    pub fn new(tier: Tier, preset: Preset, metadata: &SourceMetadata, mime_type: MimeType) -> Self {
        let (width, height) = scaled_dimensions(metadata.width, metadata.height, preset.scale);
        Self {
            tier,
            scale: preset.scale,
            frame_rate: preset.frame_rate,
            smoothing: preset.smoothing,
            mime_type,
            width,
            height,
            total_frames: total_frames(metadata.duration_secs, preset.frame_rate),
        }
    }

    /// Source timestamp of frame `index`.
    pub fn timestamp(&self, index: u64) -> f64 {
        index as f64 / f64::from(self.frame_rate)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            width: self.width,
            height: self.height,
            frame_rate: self.frame_rate,
            mime_type: self.mime_type,
        }
    }
}
