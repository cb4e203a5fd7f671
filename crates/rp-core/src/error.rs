//! Unified error type for the reelpress workspace.
//!
//! The four compression variants ([`Error::ContextUnavailable`],
//! [`Error::EncoderUnsupported`], [`Error::SourceLoadFailed`] and
//! [`Error::EncodeFailed`]) form the taxonomy the tiered strategy reasons
//! about. Every backend maps its own failures into one of them at the trait
//! boundary; [`Error::escalation`] tells the strategy what to do next.

/// What the tiered strategy should do after a tier fails with a given error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// The failure is tier-specific; try the next, more conservative tier.
    NextTier,
    /// The whole pipeline cannot proceed; surface the error immediately.
    Fatal,
}

/// Unified error type covering all failure modes in reelpress.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The rasterization surface could not be created.
    #[error("Rasterization context unavailable: {0}")]
    ContextUnavailable(String),

    /// No construction path for an encoder session succeeded.
    #[error("Encoder unsupported: {0}")]
    EncoderUnsupported(String),

    /// The input could not be decoded at all.
    #[error("Source load failed: {0}")]
    SourceLoadFailed(String),

    /// The frame loop or session finalization failed.
    #[error("Encode failed: {0}")]
    EncodeFailed(String),

    /// The caller cancelled the compression.
    #[error("Compression cancelled")]
    Cancelled,

    /// An external tool (ffmpeg, ffprobe) returned an error.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Configuration or caller input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Decide whether a tier failing with this error may escalate.
    ///
    /// Only encoder construction and frame-loop failures are tier-specific.
    /// Everything else (no surface, undecodable input, cancellation, raw
    /// tool or I/O errors that escaped a backend) stops the pipeline.
    pub fn escalation(&self) -> Escalation {
        match self {
            Error::EncoderUnsupported(_) | Error::EncodeFailed(_) => Escalation::NextTier,
            Error::ContextUnavailable(_)
            | Error::SourceLoadFailed(_)
            | Error::Cancelled
            | Error::Tool { .. }
            | Error::Io { .. }
            | Error::Validation(_) => Escalation::Fatal,
        }
    }

    /// Convenience constructor for [`Error::ContextUnavailable`].
    pub fn context_unavailable(message: impl Into<String>) -> Self {
        Error::ContextUnavailable(message.into())
    }

    /// Convenience constructor for [`Error::EncoderUnsupported`].
    pub fn encoder_unsupported(message: impl Into<String>) -> Self {
        Error::EncoderUnsupported(message.into())
    }

    /// Convenience constructor for [`Error::SourceLoadFailed`].
    pub fn source_load_failed(message: impl Into<String>) -> Self {
        Error::SourceLoadFailed(message.into())
    }

    /// Convenience constructor for [`Error::EncodeFailed`].
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Error::EncodeFailed(message.into())
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Re-tag this error as an [`Error::EncodeFailed`], keeping
    /// cancellation intact.
    ///
    /// Used inside the frame loop where any collaborator failure aborts the
    /// tier as an encode failure.
    pub fn into_encode_failed(self, what: &str) -> Self {
        match self {
            Error::Cancelled => Error::Cancelled,
            Error::EncodeFailed(msg) => Error::EncodeFailed(format!("{what}: {msg}")),
            other => Error::EncodeFailed(format!("{what}: {other}")),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_unavailable_is_fatal() {
        let err = Error::context_unavailable("zero-sized surface");
        assert_eq!(
            err.to_string(),
            "Rasterization context unavailable: zero-sized surface"
        );
        assert_eq!(err.escalation(), Escalation::Fatal);
    }

    #[test]
    fn encoder_unsupported_escalates() {
        let err = Error::encoder_unsupported("no vp9");
        assert_eq!(err.to_string(), "Encoder unsupported: no vp9");
        assert_eq!(err.escalation(), Escalation::NextTier);
    }

    #[test]
    fn source_load_failed_is_fatal() {
        let err = Error::source_load_failed("corrupt header");
        assert_eq!(err.to_string(), "Source load failed: corrupt header");
        assert_eq!(err.escalation(), Escalation::Fatal);
    }

    #[test]
    fn encode_failed_escalates() {
        let err = Error::encode_failed("broken pipe");
        assert_eq!(err.to_string(), "Encode failed: broken pipe");
        assert_eq!(err.escalation(), Escalation::NextTier);
    }

    #[test]
    fn cancelled_is_fatal() {
        assert_eq!(Error::Cancelled.escalation(), Escalation::Fatal);
        assert_eq!(Error::Cancelled.to_string(), "Compression cancelled");
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.escalation(), Escalation::Fatal);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn into_encode_failed_wraps_foreign_errors() {
        let err = Error::tool("ffmpeg", "killed").into_encode_failed("finalize");
        assert!(matches!(err, Error::EncodeFailed(_)));
        assert_eq!(
            err.to_string(),
            "Encode failed: finalize: Tool error [ffmpeg]: killed"
        );
    }

    #[test]
    fn into_encode_failed_keeps_cancellation() {
        let err = Error::Cancelled.into_encode_failed("seek");
        assert!(matches!(err, Error::Cancelled));
    }
}
