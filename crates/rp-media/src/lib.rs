//! # rp-media
//!
//! Runtime-facing seams and pure media logic for the reelpress pipeline.
//!
//! This crate provides:
//!
//! - **[`FrameSource`] / [`FrameSourceLoader`]** -- decode and seek within an
//!   input video.
//! - **[`EncoderCapabilities`], [`EncoderBackend`], [`EncoderSession`]** --
//!   an injectable view of what the encoding runtime can do, and the stateful
//!   session that turns rasterized surfaces into encoded chunks.
//! - **[`MediaRuntime`]** -- the bundle of the above handed to the pipeline.
//! - **[`FormatNegotiator`]** -- picks an output mime type from an ordered
//!   preference list.
//! - **[`Rasterizer`]** -- draws decoded frames onto a fixed-size surface.
//! - **[`extract_thumbnail`]** -- seeks once and encodes a JPEG still.
//!
//! With the `test-support` feature, [`synthetic`] offers a deterministic
//! in-memory runtime with failure injection.

pub mod encoder;
pub mod frame;
pub mod negotiate;
pub mod raster;
#[cfg(any(test, feature = "test-support"))]
pub mod synthetic;
pub mod thumbnail;

pub use encoder::{
    concat_chunks, EncoderBackend, EncoderCapabilities, EncoderSession, MediaRuntime,
    SessionSettings,
};
pub use frame::{Frame, FrameSource, FrameSourceLoader, Seek};
pub use negotiate::{FormatNegotiator, FALLBACK_MIME_TYPE, PREFERRED_MIME_TYPES};
pub use raster::{scaled_dimensions, Rasterizer, MAX_SURFACE_DIMENSION};
pub use thumbnail::{extract_thumbnail, ThumbnailSettings};
