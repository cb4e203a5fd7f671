//! Pipeline integration tests
//!
//! End-to-end runs of the tiered strategy against the synthetic runtime.

use assert_matches::assert_matches;
use rp_core::{Error, QualityTier, SourceMetadata, SourceVideo, Tier};
use rp_media::synthetic::{self, ScriptedEncoder, StaticCapabilities, SyntheticLoader};
use rp_media::ThumbnailSettings;
use rp_pipeline::{CompressionOptions, TieredStrategy};

const MIB: usize = 1024 * 1024;

fn meta(width: u32, height: u32, duration_secs: f64) -> SourceMetadata {
    SourceMetadata {
        width,
        height,
        duration_secs,
        has_audio: true,
    }
}

fn source(bytes: usize) -> SourceVideo {
    SourceVideo::new("match_highlights.mp4", vec![0x5Au8; bytes])
}

fn twenty_mib() -> CompressionOptions {
    CompressionOptions::default().with_target_size(20 * MIB as u64)
}

/// 50 MB, 60 s, 1920x1080 input; the robust tier succeeds.
#[tokio::test]
async fn full_hd_minute_compresses_on_robust_tier() {
    let encoder = ScriptedEncoder::new().with_bytes_per_frame(16);
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(1920, 1080, 60.0)),
        StaticCapabilities::all(),
        encoder.clone(),
    ));

    let result = strategy.compress(source(50 * MIB), &twenty_mib()).await.unwrap();

    assert_eq!(result.tier, Tier::Robust);
    assert_eq!(result.quality_score, 7);
    assert!(!result.audio_preserved);

    let stats = result.encoding.unwrap();
    assert_eq!((stats.width, stats.height), (1152, 648));
    assert_eq!(stats.frame_rate, 15);
    assert_eq!(stats.frames, 900);

    let sessions = encoder.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].frames, 900);
    assert_eq!(result.compressed_size, 900 * 16);
    assert_eq!(result.file_name, "match_highlights_robust_compressed.webm");
    assert!(result.thumbnail.is_some());
}

/// 5 MB input under a 20 MiB target passes through untouched.
#[tokio::test]
async fn small_input_passes_through_unchanged() {
    let loader = SyntheticLoader::new(meta(1920, 1080, 60.0));
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        loader.clone(),
        StaticCapabilities::all(),
        encoder.clone(),
    ));
    let input = source(5 * MIB);
    let original = input.data().clone();

    let result = strategy.compress(input, &twenty_mib()).await.unwrap();

    assert_eq!(result.tier, Tier::Passthrough);
    assert_eq!(result.compression_ratio, 1.0);
    assert_eq!(result.quality_score, 10);
    assert!(result.audio_preserved);
    assert_eq!(result.data, original);
    assert_eq!(result.file_name, "match_highlights.mp4");
    assert!(result.encoding.is_none());
    assert!(result.thumbnail.is_some());

    // Only the thumbnail seek; no frame loop ran.
    assert_eq!(encoder.open_attempts(), 0);
    assert_eq!(loader.seek_log(), vec![5.0]);
}

#[tokio::test]
async fn input_exactly_at_target_passes_through() {
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(64, 36, 1.0)),
        StaticCapabilities::all(),
        encoder.clone(),
    ));
    let opts = CompressionOptions::default().with_target_size(1000);

    let result = strategy.compress(source(1000), &opts).await.unwrap();
    assert_eq!(result.tier, Tier::Passthrough);
    assert_eq!(encoder.open_attempts(), 0);
}

/// Robust session construction fails; exactly one escalation to basic.
#[tokio::test]
async fn unsupported_robust_encoder_escalates_once() {
    let encoder = ScriptedEncoder::new().fail_open(0);
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(1920, 1080, 3.0)),
        StaticCapabilities::all(),
        encoder.clone(),
    ));

    let result = strategy.compress(source(30 * MIB), &twenty_mib()).await.unwrap();

    assert_eq!(result.tier, Tier::Basic);
    assert_eq!(result.quality_score, 5);
    let stats = result.encoding.unwrap();
    assert_eq!((stats.width, stats.height), (960, 540));
    assert_eq!(stats.frame_rate, 10);
    assert_eq!(stats.frames, 30);
    assert_eq!(result.file_name, "match_highlights_basic_compressed.webm");

    assert_eq!(encoder.open_attempts(), 2);
    let sessions = encoder.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].settings.frame_rate, 10);
}

#[tokio::test]
async fn robust_frame_loop_failure_escalates_to_basic() {
    let encoder = ScriptedEncoder::new().fail_submit(0, 4);
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(320, 240, 2.0)),
        StaticCapabilities::all(),
        encoder.clone(),
    ));

    let result = strategy.compress(source(2 * MIB), &twenty_mib().with_target_size(MIB as u64)).await.unwrap();

    assert_eq!(result.tier, Tier::Basic);
    let sessions = encoder.sessions();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].frames, 4);
    assert!(!sessions[0].stopped);
    assert!(sessions[1].stopped);
}

#[tokio::test]
async fn robust_success_never_attempts_basic() {
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(320, 240, 2.0)),
        StaticCapabilities::all(),
        encoder.clone(),
    ));

    let result = strategy.compress(source(2 * MIB), &twenty_mib().with_target_size(0)).await.unwrap();

    assert_eq!(result.tier, Tier::Robust);
    assert_eq!(encoder.open_attempts(), 1);
}

#[tokio::test]
async fn frame_count_is_independent_of_resolution() {
    for (width, height) in [(160, 90), (640, 360), (1280, 720)] {
        let encoder = ScriptedEncoder::new();
        let strategy = TieredStrategy::new(synthetic::runtime(
            SyntheticLoader::new(meta(width, height, 2.5)),
            StaticCapabilities::all(),
            encoder.clone(),
        ));
        let opts = CompressionOptions::default()
            .with_target_size(0)
            .with_thumbnail(None);

        let result = strategy.compress(source(64), &opts).await.unwrap();
        // floor(2.5 * 15)
        assert_eq!(result.encoding.unwrap().frames, 37, "{width}x{height}");
        assert_eq!(encoder.sessions()[0].frames, 37);
    }
}

#[tokio::test]
async fn source_load_failure_is_fatal() {
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(640, 360, 10.0)).failing_load(),
        StaticCapabilities::all(),
        encoder.clone(),
    ));

    let err = strategy.compress(source(2 * MIB), &twenty_mib().with_target_size(MIB as u64)).await.unwrap_err();
    assert_matches!(err, Error::SourceLoadFailed(_));
    assert_eq!(encoder.open_attempts(), 0);
}

#[tokio::test]
async fn context_unavailable_is_fatal() {
    let loader = SyntheticLoader::new(meta(30_000, 30_000, 1.0));
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        loader.clone(),
        StaticCapabilities::all(),
        encoder.clone(),
    ));

    let err = strategy.compress(source(64), &twenty_mib().with_target_size(0)).await.unwrap_err();
    assert_matches!(err, Error::ContextUnavailable(_));
    // Robust loaded once; basic never ran.
    assert_eq!(loader.load_count(), 1);
    assert_eq!(encoder.open_attempts(), 0);
}

#[tokio::test]
async fn both_tiers_unsupported_is_terminal_error() {
    let encoder = ScriptedEncoder::new().fail_open(0).fail_open(1);
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(320, 240, 1.0)),
        StaticCapabilities::none(),
        encoder.clone(),
    ));

    let err = strategy.compress(source(64), &twenty_mib().with_target_size(0)).await.unwrap_err();
    assert_matches!(err, Error::EncoderUnsupported(_));
    assert_eq!(encoder.open_attempts(), 2);
}

#[tokio::test]
async fn fallback_mime_is_used_when_nothing_is_supported() {
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(320, 240, 1.0)),
        StaticCapabilities::none(),
        encoder.clone(),
    ));

    let result = strategy.compress(source(64), &twenty_mib().with_target_size(0)).await.unwrap();
    assert_eq!(result.mime_type, "video/webm");
    assert_eq!(result.file_name, "match_highlights_robust_compressed.webm");
}

#[tokio::test]
async fn thumbnail_failure_does_not_fail_compression() {
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(320, 240, 1.0)),
        StaticCapabilities::all(),
        ScriptedEncoder::new(),
    ));
    let opts = twenty_mib().with_target_size(0).with_thumbnail(Some(ThumbnailSettings {
        width: 0,
        ..Default::default()
    }));

    let result = strategy.compress(source(64), &opts).await.unwrap();
    assert_eq!(result.tier, Tier::Robust);
    assert!(result.thumbnail.is_none());
}

#[tokio::test]
async fn output_may_grow_under_reencoding() {
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(160, 90, 1.0)),
        StaticCapabilities::all(),
        ScriptedEncoder::new().with_bytes_per_frame(1024),
    ));

    let result = strategy.compress(source(100), &twenty_mib().with_target_size(0)).await.unwrap();
    assert!(result.compressed_size > result.original_size);
    assert!(result.compression_ratio < 1.0);
}

#[tokio::test]
async fn quality_tier_selects_preset() {
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        SyntheticLoader::new(meta(1000, 1000, 1.0)),
        StaticCapabilities::all(),
        encoder.clone(),
    ));
    let opts = twenty_mib()
        .with_target_size(0)
        .with_quality_tier(QualityTier::Fast)
        .with_thumbnail(None);

    let result = strategy.compress(source(64), &opts).await.unwrap();
    let stats = result.encoding.unwrap();
    assert_eq!((stats.width, stats.height), (550, 550));
    assert_eq!(stats.frame_rate, 12);
    assert_eq!(stats.frames, 12);
}

#[tokio::test]
async fn concurrent_calls_are_isolated() {
    let loader = SyntheticLoader::new(meta(160, 90, 1.0));
    let encoder = ScriptedEncoder::new();
    let strategy = TieredStrategy::new(synthetic::runtime(
        loader.clone(),
        StaticCapabilities::all(),
        encoder.clone(),
    ));
    let opts = twenty_mib().with_target_size(0).with_thumbnail(None);

    let (a, b) = tokio::join!(
        strategy.compress(source(64), &opts),
        strategy.compress(source(64), &opts)
    );

    assert_eq!(a.unwrap().encoding.unwrap().frames, 15);
    assert_eq!(b.unwrap().encoding.unwrap().frames, 15);
    assert_eq!(loader.load_count(), 2);
    assert_eq!(encoder.sessions().len(), 2);
    assert!(encoder.sessions().iter().all(|s| s.frames == 15 && s.stopped));
}
