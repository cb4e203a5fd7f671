//! The per-tier frame loop: Frame Source -> Rasterizer -> Encoder Session.

use std::future::Future;

use bytes::Bytes;
use rp_core::{Error, SourceVideo, Tier};
use rp_media::{concat_chunks, EncoderSession, FormatNegotiator, MediaRuntime, Rasterizer, Seek};
use tokio_util::sync::CancellationToken;

use crate::context::MonotonicProgress;
use crate::plan::{EncodingPlan, Preset};
use crate::result::EncodingStats;

/// What a successful tier hands back to the strategy.
#[derive(Debug, Clone)]
pub struct TierOutput {
    pub data: Bytes,
    pub stats: EncodingStats,
    /// Whether the loaded source carried an audio track.
    pub source_had_audio: bool,
}

fn check_cancelled(token: &CancellationToken) -> rp_core::Result<()> {
    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Resolve `work`, or fail with [`Error::Cancelled`] as soon as the token
/// fires. Dropping `work` aborts whatever backend call it was blocked in.
async fn until_cancelled<T>(
    token: &CancellationToken,
    work: impl Future<Output = rp_core::Result<T>>,
) -> rp_core::Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        res = work => res,
    }
}

/// Run one tier to completion.
///
/// Errors follow the taxonomy the strategy escalates on: load and surface
/// failures come back unchanged, session construction failures as
/// `EncoderUnsupported` (opening and starting the recorder), and anything during the frame loop or finalization
/// as `EncodeFailed`. The session is dropped, and so aborted, on any error.
pub async fn run_tier(
    runtime: &MediaRuntime,
    negotiator: &FormatNegotiator,
    source: &SourceVideo,
    tier: Tier,
    preset: Preset,
    cancellation: &CancellationToken,
    progress: &mut MonotonicProgress<'_>,
) -> rp_core::Result<TierOutput> {
    check_cancelled(cancellation)?;

    let mut frames = runtime.loader.load(source).await?;
    let metadata = frames.metadata();
    let mime_type = negotiator.select(runtime.capabilities.as_ref());
    let plan = EncodingPlan::new(tier, preset, &metadata, mime_type);

    tracing::info!(
        tier = %tier,
        width = plan.width,
        height = plan.height,
        fps = plan.frame_rate,
        frames = plan.total_frames,
        mime = %plan.mime_type,
        "starting tier"
    );

    let mut raster = Rasterizer::new(plan.width, plan.height, plan.smoothing)?;

    if !runtime.capabilities.recorder_available() {
        return Err(Error::encoder_unsupported(format!(
            "{} runtime has no recorder",
            runtime.capabilities.name()
        )));
    }
    let unsupported = |e: Error| match e {
        Error::EncoderUnsupported(_) | Error::Cancelled => e,
        other => Error::encoder_unsupported(other.to_string()),
    };
    let mut session = runtime
        .encoder
        .open_session(&plan.session_settings())
        .map_err(unsupported)?;
    session.start().await.map_err(unsupported)?;

    let submitted = frame_loop(
        &plan,
        frames.as_mut(),
        &mut raster,
        session.as_mut(),
        cancellation,
        progress,
    )
    .await?;

    check_cancelled(cancellation)?;
    let chunks = until_cancelled(cancellation, session.stop())
        .await
        .map_err(|e| e.into_encode_failed("finalization"))?;
    let data = concat_chunks(chunks);

    tracing::info!(tier = %tier, frames = submitted, bytes = data.len(), "tier finished");

    Ok(TierOutput {
        data,
        stats: EncodingStats {
            width: plan.width,
            height: plan.height,
            frame_rate: plan.frame_rate,
            frames: submitted,
            mime_type: plan.mime_type,
        },
        source_had_audio: metadata.has_audio,
    })
}

/// Seek, draw and submit frames in playback order. Returns the number of
/// frames submitted.
async fn frame_loop(
    plan: &EncodingPlan,
    frames: &mut dyn rp_media::FrameSource,
    raster: &mut Rasterizer,
    session: &mut dyn EncoderSession,
    cancellation: &CancellationToken,
    progress: &mut MonotonicProgress<'_>,
) -> rp_core::Result<u64> {
    let step = plan.tier.to_string();
    let mut submitted = 0;

    for index in 0..plan.total_frames {
        check_cancelled(cancellation)?;

        let at = plan.timestamp(index);
        let frame = match until_cancelled(cancellation, frames.seek(at))
            .await
            .map_err(|e| e.into_encode_failed("seek"))?
        {
            Seek::Frame(frame) => frame,
            Seek::EndOfStream => {
                tracing::debug!(index, at, "end of stream before last planned frame");
                break;
            }
        };

        raster
            .draw(&frame)
            .map_err(|e| e.into_encode_failed("draw"))?;
        until_cancelled(cancellation, session.submit(raster.surface()))
            .await
            .map_err(|e| e.into_encode_failed("capture"))?;
        submitted += 1;

        let pct = 100.0 * (index + 1) as f32 / plan.total_frames as f32;
        progress.report(pct, &step);
        tracing::trace!(index, at, pct, "frame submitted");

        tokio::task::yield_now().await;
    }

    Ok(submitted)
}
