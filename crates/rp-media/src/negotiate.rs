//! Output format negotiation against an [`EncoderCapabilities`] set.

use rp_core::{Container, MimeType, VideoCodec};

use crate::encoder::EncoderCapabilities;

/// Preferred output types, most desirable first.
pub const PREFERRED_MIME_TYPES: [MimeType; 5] = [
    MimeType::with_codec(Container::Webm, VideoCodec::Vp9),
    MimeType::container(Container::Webm),
    MimeType::with_codec(Container::Webm, VideoCodec::Vp8),
    MimeType::with_codec(Container::Mp4, VideoCodec::Avc1),
    MimeType::container(Container::Mp4),
];

/// Returned when no candidate is reported as supported.
pub const FALLBACK_MIME_TYPE: MimeType = MimeType::container(Container::Webm);

/// Tries each candidate in order and returns the first supported one.
#[derive(Debug, Clone)]
pub struct FormatNegotiator {
    candidates: Vec<MimeType>,
    fallback: MimeType,
}

impl Default for FormatNegotiator {
    fn default() -> Self {
        Self::new(PREFERRED_MIME_TYPES.to_vec(), FALLBACK_MIME_TYPE)
    }
}

impl FormatNegotiator {
    /// Create a negotiator from an ordered candidate list and a fallback.
    pub fn new(candidates: Vec<MimeType>, fallback: MimeType) -> Self {
        Self {
            candidates,
            fallback,
        }
    }

    /// The ordered candidate list.
    pub fn candidates(&self) -> &[MimeType] {
        &self.candidates
    }

    /// Select the output type.
    ///
    /// Never fails: if nothing is supported the fallback is returned, and it
    /// is up to session construction to reject it.
    pub fn select(&self, capabilities: &dyn EncoderCapabilities) -> MimeType {
        for candidate in &self.candidates {
            if capabilities.is_type_supported(candidate) {
                tracing::debug!(
                    capabilities = capabilities.name(),
                    mime = %candidate,
                    "negotiated output type"
                );
                return *candidate;
            }
            tracing::trace!(mime = %candidate, "output type unsupported, trying next");
        }

        tracing::debug!(
            capabilities = capabilities.name(),
            mime = %self.fallback,
            "no preferred output type supported; using fallback"
        );
        self.fallback
    }
}
