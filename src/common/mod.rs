//! Types and utilities shared by the compound file decoding stages.

// Submodule declarations
pub mod binary;
pub mod error;

// Re-exports for convenience
pub use binary::ByteOrder;
pub use error::{Error, FormatCheck, Result};
