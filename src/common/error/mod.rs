//! Error types for the compound file reader.
//!
//! All decoding stages report through the single [`Error`] enum so callers
//! can match on the failed check regardless of which stage raised it.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, FormatCheck, Result};
