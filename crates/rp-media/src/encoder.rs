//! Encoder seams: capability probing, session construction, and the
//! stateful [`EncoderSession`] itself.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use rp_core::MimeType;

use crate::frame::{Frame, FrameSourceLoader};

/// What the encoding runtime reports it can do.
///
/// Kept separate from [`EncoderBackend`] so format negotiation can be tested
/// against a plain capability set.
pub trait EncoderCapabilities: Send + Sync {
    /// Human-readable name identifying this capability probe.
    fn name(&self) -> &'static str;

    /// Whether any session can be constructed at all.
    fn recorder_available(&self) -> bool;

    /// Whether the runtime claims to encode `mime`.
    ///
    /// `true` does not guarantee that
    /// [`EncoderBackend::open_session`] will succeed.
    fn is_type_supported(&self, mime: &MimeType) -> bool;
}

/// Parameters a session is constructed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Capture rate; frames are submitted at exactly this cadence.
    pub frame_rate: u32,
    /// Negotiated output type.
    pub mime_type: MimeType,
}

/// A stateful encoder consuming rasterized surfaces in playback order.
///
/// Lifecycle: [`start`](Self::start) once, any number of
/// [`submit`](Self::submit) calls, then [`stop`](Self::stop) once. Dropping a
/// session without stopping it aborts the encode.
#[async_trait]
pub trait EncoderSession: Send {
    /// Begin capturing.
    async fn start(&mut self) -> rp_core::Result<()>;

    /// Capture one frame from the surface.
    async fn submit(&mut self, surface: &Frame) -> rp_core::Result<()>;

    /// Signal end of input and wait for finalization.
    ///
    /// Returns the encoded chunks in output order. A session that captured
    /// nothing may return no chunks at all.
    async fn stop(&mut self) -> rp_core::Result<Vec<Bytes>>;
}

/// Constructs [`EncoderSession`]s.
pub trait EncoderBackend: Send + Sync {
    /// Human-readable name identifying this backend.
    fn name(&self) -> &'static str;

    /// Construct a session bound to `settings`.
    ///
    /// Fails with [`rp_core::Error::EncoderUnsupported`] on capability or
    /// resource exhaustion.
    fn open_session(&self, settings: &SessionSettings) -> rp_core::Result<Box<dyn EncoderSession>>;
}

/// Everything the pipeline needs from the host media environment.
#[derive(Clone)]
pub struct MediaRuntime {
    pub loader: Arc<dyn FrameSourceLoader>,
    pub capabilities: Arc<dyn EncoderCapabilities>,
    pub encoder: Arc<dyn EncoderBackend>,
}

impl MediaRuntime {
    pub fn new(
        loader: Arc<dyn FrameSourceLoader>,
        capabilities: Arc<dyn EncoderCapabilities>,
        encoder: Arc<dyn EncoderBackend>,
    ) -> Self {
        Self {
            loader,
            capabilities,
            encoder,
        }
    }
}

impl std::fmt::Debug for MediaRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRuntime")
            .field("loader", &self.loader.name())
            .field("capabilities", &self.capabilities.name())
            .field("encoder", &self.encoder.name())
            .finish()
    }
}

/// Concatenate encoded chunks into one contiguous byte stream.
pub fn concat_chunks(chunks: Vec<Bytes>) -> Bytes {
    match chunks.len() {
        0 => Bytes::new(),
        1 => chunks.into_iter().next().unwrap_or_default(),
        _ => {
            let total = chunks.iter().map(Bytes::len).sum();
            let mut out = BytesMut::with_capacity(total);
            for chunk in &chunks {
                out.extend_from_slice(chunk);
            }
            out.freeze()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_empty() {
        assert!(concat_chunks(Vec::new()).is_empty());
    }

    #[test]
    fn concat_single_is_zero_copy() {
        let chunk = Bytes::from_static(b"abc");
        let ptr = chunk.as_ptr();
        let out = concat_chunks(vec![chunk]);
        assert_eq!(out.as_ptr(), ptr);
    }

    #[test]
    fn concat_preserves_order() {
        let out = concat_chunks(vec![
            Bytes::from_static(b"ab"),
            Bytes::from_static(b""),
            Bytes::from_static(b"cde"),
        ]);
        assert_eq!(&out[..], b"abcde");
    }
}
