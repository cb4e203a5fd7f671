//! Options and progress plumbing shared by every tier of one compression.

use std::sync::Arc;

use rp_core::config::{CompressionConfig, DEFAULT_TARGET_SIZE_BYTES};
use rp_core::QualityTier;
use rp_media::ThumbnailSettings;
use tokio_util::sync::CancellationToken;

/// Sender for reporting progress from within the frame loop.
///
/// Wraps a callback that receives a progress percentage (0.0 -- 100.0) and a
/// short step description (the active tier name).
pub struct ProgressSender {
    callback: Box<dyn Fn(f32, &str) + Send + Sync>,
}

impl ProgressSender {
    /// Create a new sender from the given callback.
    pub fn new(callback: impl Fn(f32, &str) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Create a no-op sender that discards all progress reports.
    pub fn noop() -> Self {
        Self {
            callback: Box::new(|_, _| {}),
        }
    }

    /// Report progress.
    pub fn send(&self, progress: f32, step: &str) {
        (self.callback)(progress, step);
    }
}

impl std::fmt::Debug for ProgressSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSender").finish_non_exhaustive()
    }
}

/// Per-call view of a [`ProgressSender`] that never reports a lower value
/// than it already has.
///
/// Escalating from one tier to the next restarts the frame count; the
/// high-water mark hides that from the caller.
#[derive(Debug)]
pub struct MonotonicProgress<'a> {
    sender: &'a ProgressSender,
    high_water: f32,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(sender: &'a ProgressSender) -> Self {
        Self {
            sender,
            high_water: 0.0,
        }
    }

    /// Forward `progress`, clamped to `[high_water, 100]`.
    pub fn report(&mut self, progress: f32, step: &str) {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.high_water = self.high_water.max(progress);
        self.sender.send(self.high_water, step);
    }

    /// The highest value reported so far.
    pub fn high_water(&self) -> f32 {
        self.high_water
    }
}

/// Options for one `compress` call.
#[derive(Debug, Clone)]
pub struct CompressionOptions {
    /// Inputs at or below this size are passed through untouched.
    pub target_size_bytes: u64,
    /// Selects the robust and basic presets.
    pub quality_tier: QualityTier,
    /// Advisory. Re-encoding tiers cannot carry the original audio track.
    pub preserve_audio: bool,
    /// Thumbnail placement and size; `None` skips thumbnail extraction.
    pub thumbnail: Option<ThumbnailSettings>,
    /// Checked before each tier, at every frame and before finalization.
    pub cancellation: CancellationToken,
    /// Progress sink, invoked once per processed frame.
    pub progress: Arc<ProgressSender>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            target_size_bytes: DEFAULT_TARGET_SIZE_BYTES,
            quality_tier: QualityTier::default(),
            preserve_audio: true,
            thumbnail: Some(ThumbnailSettings::default()),
            cancellation: CancellationToken::new(),
            progress: Arc::new(ProgressSender::noop()),
        }
    }
}

impl CompressionOptions {
    /// Build options from the `compression` config section.
    ///
    /// An empty thumbnail size disables thumbnail extraction.
    pub fn from_config(cfg: &CompressionConfig) -> Self {
        let thumbnail = (cfg.thumbnail_width > 0 && cfg.thumbnail_height > 0)
            .then(|| ThumbnailSettings::from(cfg));

        Self {
            target_size_bytes: cfg.target_size_bytes,
            quality_tier: cfg.quality_tier,
            preserve_audio: cfg.preserve_audio,
            thumbnail,
            ..Self::default()
        }
    }

    /// Builder: set the passthrough threshold.
    pub fn with_target_size(mut self, bytes: u64) -> Self {
        self.target_size_bytes = bytes;
        self
    }

    /// Builder: set the quality tier.
    pub fn with_quality_tier(mut self, tier: QualityTier) -> Self {
        self.quality_tier = tier;
        self
    }

    /// Builder: replace or disable thumbnail extraction.
    pub fn with_thumbnail(mut self, thumbnail: Option<ThumbnailSettings>) -> Self {
        self.thumbnail = thumbnail;
        self
    }

    /// Builder: attach a cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builder: attach a progress sender.
    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Arc::new(progress);
        self
    }
}
