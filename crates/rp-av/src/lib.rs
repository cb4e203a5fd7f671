//! # rp-av
//!
//! ffmpeg-backed media runtime for the reelpress pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`], [`ToolProcess`]) -- async
//!   builder with timeout support, plus incremental stdin streaming.
//! - **Workspace management** ([`Workspace`]) -- temporary directory
//!   lifecycle for materialised inputs and encoder outputs.
//! - **Probing** ([`probe_media`]) -- ffprobe JSON into [`ProbedMedia`].
//! - **Runtime** ([`ffmpeg`]) -- implementations of the `rp-media` frame
//!   source, capability, and encoder traits, assembled by
//!   [`discover_runtime`].

pub mod command;
pub mod ffmpeg;
pub mod probe;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput, ToolProcess};
pub use ffmpeg::{
    discover_runtime, FfmpegCapabilities, FfmpegEncoderBackend, FfmpegFrameSource, FfmpegLoader,
};
pub use probe::{probe_media, ProbedMedia};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::Workspace;
