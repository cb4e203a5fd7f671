//! Tiered compression: passthrough, then robust, then basic.
//!
//! The escalation policy lives in [`StrategyState::next`], a pure transition
//! function over the error taxonomy, so it can be tested without running a
//! single frame. [`TieredStrategy`] drives it.

use std::time::Instant;

use bytes::Bytes;
use rp_core::{Error, Escalation, SourceVideo, Tier};
use rp_media::{extract_thumbnail, FormatNegotiator, MediaRuntime, ThumbnailSettings};

use crate::context::{CompressionOptions, MonotonicProgress};
use crate::plan::Preset;
use crate::result::{compression_ratio, CompressionResult};
use crate::tier::{run_tier, TierOutput};

/// Where the strategy is in its escalation sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    NotStarted,
    TryingRobust,
    TryingBasic,
    Succeeded(Tier),
    Failed,
}

/// Inputs to [`StrategyState::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyEvent {
    /// The size check ran; `within_target` selects passthrough.
    Begin { within_target: bool },
    TierSucceeded,
    TierFailed(Escalation),
}

impl StrategyState {
    /// Apply `event`. Events that make no sense in the current state leave
    /// it unchanged.
    pub fn next(self, event: StrategyEvent) -> Self {
        use StrategyEvent::*;
        use StrategyState::*;

        match (self, event) {
            (NotStarted, Begin { within_target: true }) => Succeeded(Tier::Passthrough),
            (NotStarted, Begin { within_target: false }) => TryingRobust,
            (TryingRobust, TierSucceeded) => Succeeded(Tier::Robust),
            (TryingRobust, TierFailed(Escalation::NextTier)) => TryingBasic,
            (TryingRobust, TierFailed(Escalation::Fatal)) => Failed,
            (TryingBasic, TierSucceeded) => Succeeded(Tier::Basic),
            (TryingBasic, TierFailed(_)) => Failed,
            (state, _) => state,
        }
    }

    /// The tier currently being attempted, if any.
    pub fn attempting(&self) -> Option<Tier> {
        match self {
            Self::TryingRobust => Some(Tier::Robust),
            Self::TryingBasic => Some(Tier::Basic),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed)
    }
}

/// Best-effort video downsizing over a [`MediaRuntime`].
///
/// Each call to [`compress`](Self::compress) is fully isolated: every tier
/// and the thumbnail load their own frame source and own their surface and
/// session. Tiers never overlap.
#[derive(Debug, Clone)]
pub struct TieredStrategy {
    runtime: MediaRuntime,
    negotiator: FormatNegotiator,
}

impl TieredStrategy {
    pub fn new(runtime: MediaRuntime) -> Self {
        Self {
            runtime,
            negotiator: FormatNegotiator::default(),
        }
    }

    /// Builder: replace the output type preference list.
    pub fn with_negotiator(mut self, negotiator: FormatNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    pub fn runtime(&self) -> &MediaRuntime {
        &self.runtime
    }

    /// Compress `source`.
    ///
    /// # Errors
    ///
    /// - `SourceLoadFailed`, `ContextUnavailable` and `Cancelled` as soon as
    ///   they occur, from whichever tier raised them.
    /// - Otherwise the basic tier's error once both tiers have failed.
    pub async fn compress(
        &self,
        source: SourceVideo,
        options: &CompressionOptions,
    ) -> rp_core::Result<CompressionResult> {
        let started = Instant::now();
        if options.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut progress = MonotonicProgress::new(&options.progress);
        let within_target = source.byte_size() <= options.target_size_bytes;
        let mut state = StrategyState::NotStarted.next(StrategyEvent::Begin { within_target });

        let mut output: Option<TierOutput> = None;
        let mut last_error: Option<Error> = None;

        while let Some(tier) = state.attempting() {
            let preset = Preset::lookup(options.quality_tier, tier)
                .ok_or_else(|| Error::Validation(format!("no preset for {tier} tier")))?;

            let event = match run_tier(
                &self.runtime,
                &self.negotiator,
                &source,
                tier,
                preset,
                &options.cancellation,
                &mut progress,
            )
            .await
            {
                Ok(out) => {
                    output = Some(out);
                    StrategyEvent::TierSucceeded
                }
                Err(e) => {
                    let escalation = e.escalation();
                    match (escalation, tier) {
                        (Escalation::NextTier, Tier::Robust) => {
                            tracing::warn!(tier = %tier, error = %e, "tier failed; escalating")
                        }
                        _ => tracing::error!(tier = %tier, error = %e, "compression failed"),
                    }
                    last_error = Some(e);
                    StrategyEvent::TierFailed(escalation)
                }
            };
            state = state.next(event);
        }

        let tier = match state {
            StrategyState::Succeeded(tier) => tier,
            _ => {
                return Err(last_error
                    .unwrap_or_else(|| Error::encode_failed("no tier produced output")))
            }
        };

        let thumbnail = self.thumbnail(&source, options.thumbnail.as_ref()).await;
        progress.report(100.0, "complete");

        let original_size = source.byte_size();
        let result = match (tier, output) {
            (Tier::Passthrough, _) => {
                tracing::info!(
                    source = source.name(),
                    size = original_size,
                    target = options.target_size_bytes,
                    "within target size; passing through"
                );
                CompressionResult {
                    file_name: source.name().to_string(),
                    data: source.data().clone(),
                    mime_type: source.mime_type().to_string(),
                    original_size,
                    compressed_size: original_size,
                    compression_ratio: 1.0,
                    processing_time: started.elapsed(),
                    tier,
                    quality_score: tier.quality_score(),
                    audio_preserved: true,
                    thumbnail,
                    encoding: None,
                }
            }
            (_, Some(TierOutput { data, stats, source_had_audio })) => {
                if options.preserve_audio && source_had_audio {
                    tracing::warn!(
                        tier = %tier,
                        "audio cannot be carried through a re-encode; output is silent"
                    );
                }
                let compressed_size = data.len() as u64;
                CompressionResult {
                    file_name: format!(
                        "{}_{tier}_compressed.{}",
                        source.stem(),
                        stats.mime_type.container.extension()
                    ),
                    data,
                    mime_type: stats.mime_type.to_string(),
                    original_size,
                    compressed_size,
                    compression_ratio: compression_ratio(original_size, compressed_size),
                    processing_time: started.elapsed(),
                    tier,
                    quality_score: tier.quality_score(),
                    audio_preserved: false,
                    thumbnail,
                    encoding: Some(stats),
                }
            }
            (_, None) => return Err(Error::encode_failed(format!("{tier} tier produced no output"))),
        };

        tracing::info!(
            tier = %result.tier,
            original = result.original_size,
            compressed = result.compressed_size,
            ratio = result.compression_ratio,
            elapsed_ms = result.processing_time.as_millis() as u64,
            "compression complete"
        );
        Ok(result)
    }

    /// Thumbnail of the original source. Failure is logged, not returned.
    async fn thumbnail(
        &self,
        source: &SourceVideo,
        settings: Option<&ThumbnailSettings>,
    ) -> Option<Bytes> {
        let settings = settings?;
        match extract_thumbnail(self.runtime.loader.as_ref(), source, settings).await {
            Ok(jpeg) => Some(jpeg),
            Err(e) => {
                tracing::warn!(source = source.name(), error = %e, "thumbnail extraction failed");
                None
            }
        }
    }
}
