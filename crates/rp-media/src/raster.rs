//! Draws decoded frames onto a fixed-resolution RGBA surface.
//!
//! The output dimensions are fixed when the [`Rasterizer`] is created and are
//! independent of the resolution of the frames drawn into it.

use image::imageops::{self, FilterType};
use rp_core::{Error, Smoothing};

use crate::frame::Frame;

/// Largest surface edge we are willing to allocate.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// Scale natural dimensions by `scale`, rounding each edge to the nearest
/// pixel.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (f64::from(width) * scale).round();
    let h = (f64::from(height) * scale).round();
    (w.max(0.0) as u32, h.max(0.0) as u32)
}

fn filter_for(smoothing: Smoothing) -> FilterType {
    match smoothing {
        Smoothing::Low => FilterType::Triangle,
        Smoothing::Medium => FilterType::CatmullRom,
        Smoothing::High => FilterType::Lanczos3,
    }
}

/// A 2D drawing surface of fixed size.
pub struct Rasterizer {
    surface: Frame,
    smoothing: Smoothing,
}

impl Rasterizer {
    /// Allocate a `width` x `height` surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContextUnavailable`] if either edge is zero or exceeds
    /// [`MAX_SURFACE_DIMENSION`].
    pub fn new(width: u32, height: u32, smoothing: Smoothing) -> rp_core::Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::context_unavailable(format!(
                "cannot create a {width}x{height} surface"
            )));
        }
        if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            return Err(Error::context_unavailable(format!(
                "{width}x{height} exceeds the {MAX_SURFACE_DIMENSION}px surface limit"
            )));
        }

        Ok(Self {
            surface: Frame::new(width, height),
            smoothing,
        })
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Draw `frame` so that it covers the whole surface.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodeFailed`] for an empty frame.
    pub fn draw(&mut self, frame: &Frame) -> rp_core::Result<()> {
        if frame.width() == 0 || frame.height() == 0 {
            return Err(Error::encode_failed("cannot draw an empty frame"));
        }

        if frame.dimensions() == self.surface.dimensions() {
            self.surface.copy_from_slice(frame.as_raw());
        } else {
            self.surface = imageops::resize(
                frame,
                self.surface.width(),
                self.surface.height(),
                filter_for(self.smoothing),
            );
        }
        Ok(())
    }

    /// The current surface contents.
    pub fn surface(&self) -> &Frame {
        &self.surface
    }
}

impl std::fmt::Debug for Rasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rasterizer")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("smoothing", &self.smoothing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use image::Rgba;

    #[test]
    fn scaled_dimensions_round_to_nearest() {
        assert_eq!(scaled_dimensions(1920, 1080, 0.6), (1152, 648));
        assert_eq!(scaled_dimensions(1920, 1080, 0.5), (960, 540));
        // 0.6 * 1279 = 767.4, 0.6 * 719 = 431.4
        assert_eq!(scaled_dimensions(1279, 719, 0.6), (767, 431));
        // 0.5 * 3 = 1.5 rounds away from zero
        assert_eq!(scaled_dimensions(3, 3, 0.5), (2, 2));
    }

    #[test]
    fn zero_surface_is_context_unavailable() {
        assert_matches!(
            Rasterizer::new(0, 10, Smoothing::Low),
            Err(Error::ContextUnavailable(_))
        );
    }

    #[test]
    fn oversized_surface_is_context_unavailable() {
        assert_matches!(
            Rasterizer::new(MAX_SURFACE_DIMENSION + 1, 10, Smoothing::Low),
            Err(Error::ContextUnavailable(_))
        );
    }

    #[test]
    fn draw_scales_to_surface() {
        let mut r = Rasterizer::new(8, 4, Smoothing::Medium).unwrap();
        let frame = Frame::from_pixel(32, 16, Rgba([200, 10, 10, 255]));
        r.draw(&frame).unwrap();
        assert_eq!(r.surface().dimensions(), (8, 4));
        let px = r.surface().get_pixel(3, 2);
        assert_eq!(px.0[3], 255);
        assert!(px.0[0] > 150, "expected red-dominant pixel, got {:?}", px);
    }

    #[test]
    fn draw_same_size_copies() {
        let mut r = Rasterizer::new(4, 4, Smoothing::High).unwrap();
        let frame = Frame::from_pixel(4, 4, Rgba([1, 2, 3, 4]));
        r.draw(&frame).unwrap();
        assert_eq!(r.surface(), &frame);
    }

    #[test]
    fn draw_empty_frame_fails() {
        let mut r = Rasterizer::new(4, 4, Smoothing::Low).unwrap();
        assert_matches!(r.draw(&Frame::new(0, 0)), Err(Error::EncodeFailed(_)));
    }
}
