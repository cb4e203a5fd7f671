//! The output bundle of a successful compression.

use std::time::Duration;

use bytes::Bytes;
use rp_core::{MimeType, Tier};
use serde::{Serialize, Serializer};

/// How a re-encoding tier configured its session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EncodingStats {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    /// Frames actually submitted to the encoder session.
    pub frames: u64,
    #[serde(serialize_with = "serialize_display")]
    pub mime_type: MimeType,
}

/// A compressed file plus metrics.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub file_name: String,
    pub data: Bytes,
    pub mime_type: String,
    pub original_size: u64,
    pub compressed_size: u64,
    /// `original_size / compressed_size`; exactly 1 for passthrough.
    pub compression_ratio: f64,
    pub processing_time: Duration,
    pub tier: Tier,
    /// Fixed per tier, not measured.
    pub quality_score: u8,
    pub audio_preserved: bool,
    pub thumbnail: Option<Bytes>,
    /// `None` for passthrough.
    pub encoding: Option<EncodingStats>,
}

impl CompressionResult {
    /// Summary without the byte payloads.
    pub fn report(&self) -> CompressionReport {
        CompressionReport {
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            original_size: self.original_size,
            compressed_size: self.compressed_size,
            compression_ratio: self.compression_ratio,
            processing_time_ms: self.processing_time.as_millis() as u64,
            tier: self.tier,
            quality_score: self.quality_score,
            audio_preserved: self.audio_preserved,
            thumbnail_size: self.thumbnail.as_ref().map(|t| t.len() as u64),
            encoding: self.encoding,
        }
    }
}

/// Ratio of input to output size, finite even for an empty output.
pub fn compression_ratio(original_size: u64, compressed_size: u64) -> f64 {
    original_size as f64 / compressed_size.max(1) as f64
}

/// Serializable form of a [`CompressionResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionReport {
    pub file_name: String,
    pub mime_type: String,
    pub original_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    pub processing_time_ms: u64,
    pub tier: Tier,
    pub quality_score: u8,
    pub audio_preserved: bool,
    pub thumbnail_size: Option<u64>,
    pub encoding: Option<EncodingStats>,
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: std::fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
