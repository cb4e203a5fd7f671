//! ffmpeg-backed implementations of the `rp-media` runtime traits.

mod capabilities;
mod encoder;
mod source;
#[cfg(all(test, unix))]
mod stub_tools;

use std::sync::Arc;

pub use capabilities::{encoder_for, parse_encoder_list, FfmpegCapabilities};
pub use encoder::{session_args, FfmpegEncoderBackend, FfmpegEncoderSession};
pub use source::{FfmpegFrameSource, FfmpegLoader};

use rp_media::MediaRuntime;

use crate::tools::ToolRegistry;

/// Discover ffmpeg/ffprobe and assemble a [`MediaRuntime`] around them.
///
/// Never fails: missing tools surface later as `SourceLoadFailed` (no
/// ffprobe) or `EncoderUnsupported` (no ffmpeg), which is exactly how the
/// pipeline expects an incapable runtime to behave.
pub async fn discover_runtime(tools_config: &rp_core::config::ToolsConfig) -> MediaRuntime {
    let registry = ToolRegistry::discover(tools_config);
    let capabilities = Arc::new(FfmpegCapabilities::probe(&registry).await);

    tracing::info!(
        recorder = capabilities.recorder_available_flag(),
        encoders = ?capabilities.known_encoders(),
        "ffmpeg runtime discovered"
    );

    MediaRuntime::new(
        Arc::new(FfmpegLoader::new(registry.clone())),
        capabilities.clone(),
        Arc::new(FfmpegEncoderBackend::new(registry, capabilities)),
    )
}
