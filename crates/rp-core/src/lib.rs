//! rp-core: shared types, errors, and configuration.
//!
//! This crate is the foundational dependency for all other rp-* crates,
//! providing the compression error taxonomy, media-domain enums, the
//! source video handle, and application configuration.

pub mod config;
pub mod error;
pub mod media;
pub mod source;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Escalation, Result};
pub use media::*;
pub use source::{SourceMetadata, SourceVideo};
