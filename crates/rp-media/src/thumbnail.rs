//! Single-frame JPEG thumbnail extraction.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use rp_core::config::CompressionConfig;
use rp_core::{Error, Smoothing, SourceVideo};

use crate::frame::{FrameSourceLoader, Seek};
use crate::raster::Rasterizer;

/// Where and how large to render a thumbnail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThumbnailSettings {
    /// Preferred timestamp. Clamped to half the duration for short clips.
    pub at_secs: f64,
    pub width: u32,
    pub height: u32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            at_secs: 5.0,
            width: 640,
            height: 360,
            jpeg_quality: 80,
        }
    }
}

impl From<&CompressionConfig> for ThumbnailSettings {
    fn from(cfg: &CompressionConfig) -> Self {
        Self {
            at_secs: cfg.thumbnail_at_secs,
            width: cfg.thumbnail_width,
            height: cfg.thumbnail_height,
            jpeg_quality: cfg.thumbnail_jpeg_quality,
        }
    }
}

/// Render one still of `source` as JPEG bytes.
///
/// Loads its own frame source, so it never shares decoder state with a
/// running tier. If the clamped timestamp turns out to be past the end of the
/// stream, one more attempt is made at `t = 0`.
pub async fn extract_thumbnail(
    loader: &dyn FrameSourceLoader,
    source: &SourceVideo,
    settings: &ThumbnailSettings,
) -> rp_core::Result<Bytes> {
    let mut frames = loader.load(source).await?;
    let duration = frames.metadata().duration_secs;
    let at = settings.at_secs.max(0.0).min(duration / 2.0).max(0.0);

    let frame = match frames.seek(at).await? {
        Seek::Frame(frame) => frame,
        Seek::EndOfStream => match frames.seek(0.0).await? {
            Seek::Frame(frame) => frame,
            Seek::EndOfStream => {
                return Err(Error::encode_failed(format!(
                    "no frame available for thumbnail of {}",
                    source.name()
                )))
            }
        },
    };

    let mut raster = Rasterizer::new(settings.width, settings.height, Smoothing::Medium)?;
    raster.draw(&frame)?;

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgba8(raster.surface().clone()).into_rgb8();
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, settings.jpeg_quality.clamp(1, 100))
        .encode_image(&rgb)
        .map_err(|e| Error::encode_failed(format!("thumbnail JPEG encoding failed: {e}")))?;

    tracing::debug!(
        source = source.name(),
        at_secs = at,
        bytes = buf.get_ref().len(),
        "thumbnail extracted"
    );
    Ok(Bytes::from(buf.into_inner()))
}
