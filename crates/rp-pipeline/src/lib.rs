//! # rp-pipeline
//!
//! Orchestration of tiered video compression.
//!
//! This crate provides:
//!
//! - **[`TieredStrategy`]** -- passthrough when the input already fits,
//!   otherwise the robust tier, then the basic tier, driven by the
//!   [`StrategyState`] machine.
//! - **[`CompressionOptions`]** -- size target, quality tier, thumbnail
//!   settings, cancellation and progress.
//! - **[`EncodingPlan`]** -- fixed per-tier [`Preset`]s resolved against the
//!   loaded source.
//! - **[`run_tier`]** -- the frame loop shared by every re-encoding tier.
//! - **[`CompressionResult`]** -- the output bundle and its serializable
//!   [`CompressionReport`].

pub mod context;
pub mod plan;
pub mod result;
pub mod strategy;
pub mod tier;

// Re-export key types at the crate root.
pub use context::{CompressionOptions, MonotonicProgress, ProgressSender};
pub use plan::{total_frames, EncodingPlan, Preset};
pub use result::{compression_ratio, CompressionReport, CompressionResult, EncodingStats};
pub use strategy::{StrategyEvent, StrategyState, TieredStrategy};
pub use tier::{run_tier, TierOutput};
