//! The input side of a compression: the immutable [`SourceVideo`] handle and
//! the [`SourceMetadata`] a frame source exposes once loaded.

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Immutable handle to the bytes of a user-supplied video.
///
/// Cloning is cheap: the payload is reference counted, so a passthrough
/// result can hand back the exact same bytes.
#[derive(Debug, Clone)]
pub struct SourceVideo {
    name: String,
    data: Bytes,
    mime_type: String,
}

impl SourceVideo {
    /// Wrap `data` under the given file name, guessing the container mime
    /// type from the extension.
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let mime_type = guess_mime_type(&name).to_string();
        Self {
            name,
            data: data.into(),
            mime_type,
        }
    }

    /// Override the declared container mime type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Original file name, including extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw input bytes.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the input in bytes.
    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Declared container mime type (e.g. `video/mp4`).
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("video")
    }

    /// Lower-cased extension of the original file name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }
}

/// Properties of a loaded source, reported by a frame source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Natural width of the video in pixels.
    pub width: u32,
    /// Natural height of the video in pixels.
    pub height: u32,
    /// Declared duration in seconds.
    pub duration_secs: f64,
    /// Whether the container carries at least one audio stream.
    pub has_audio: bool,
}

fn guess_mime_type(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_size_and_name_parts() {
        let src = SourceVideo::new("Match Day.MP4", vec![0u8; 1234]);
        assert_eq!(src.byte_size(), 1234);
        assert_eq!(src.stem(), "Match Day");
        assert_eq!(src.extension().as_deref(), Some("mp4"));
        assert_eq!(src.mime_type(), "video/mp4");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        let src = SourceVideo::new("clip", Vec::new());
        assert_eq!(src.mime_type(), "application/octet-stream");
        assert_eq!(src.extension(), None);
        assert_eq!(src.stem(), "clip");
    }

    #[test]
    fn clone_shares_payload() {
        let src = SourceVideo::new("a.webm", vec![1u8, 2, 3]);
        let copy = src.clone();
        assert_eq!(src.data().as_ptr(), copy.data().as_ptr());
    }

    #[test]
    fn explicit_mime_override() {
        let src = SourceVideo::new("a.bin", vec![]).with_mime_type("video/webm");
        assert_eq!(src.mime_type(), "video/webm");
    }
}
