//! The [`FrameSource`] trait: seekable access to the frames of one input.

use async_trait::async_trait;
use rp_core::{SourceMetadata, SourceVideo};

/// A decoded RGBA frame.
pub type Frame = image::RgbaImage;

/// Outcome of a seek.
#[derive(Debug, Clone)]
pub enum Seek {
    /// The frame visible at the requested time.
    Frame(Frame),
    /// The requested time lies at or past the end of the stream.
    ///
    /// This is the natural terminal condition for a frame loop, not an error.
    EndOfStream,
}

/// A loaded, seekable video.
///
/// Owns the decode lifecycle of one input; dropping it releases every
/// resource the decoder held.
#[async_trait]
pub trait FrameSource: Send {
    /// Natural dimensions and duration, available as soon as loading
    /// succeeded.
    fn metadata(&self) -> SourceMetadata;

    /// Seek to `time_secs` and return the frame visible there.
    async fn seek(&mut self, time_secs: f64) -> rp_core::Result<Seek>;
}

/// Opens [`FrameSource`]s for input videos.
///
/// Implementations must be safe to share across threads (`Send + Sync`);
/// every call to [`load`](FrameSourceLoader::load) yields an independent
/// source so concurrent compressions never share decoder state.
#[async_trait]
pub trait FrameSourceLoader: Send + Sync {
    /// Human-readable name identifying this loader implementation.
    fn name(&self) -> &'static str;

    /// Load `source` for decoding.
    ///
    /// Fails with [`rp_core::Error::SourceLoadFailed`] when the input cannot
    /// be decoded at all (corrupt file, unsupported container).
    async fn load(&self, source: &SourceVideo) -> rp_core::Result<Box<dyn FrameSource>>;
}
