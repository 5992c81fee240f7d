//! Error types for compound file decoding.
//!
//! Every failure the reader can report is a variant of [`Error`]. Load-time
//! variants abort [`Document::open`](crate::Document::open) or
//! [`Document::root`](crate::Document::root); per-call variants
//! (`SeekRange`, `EndOfStream`, `NotStream`) only affect the call that raised them.
use thiserror::Error;

/// Header check that rejected a container.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCheck {
    /// The first eight bytes are not the compound file magic.
    #[error("bad signature")]
    Signature,

    /// The header CLSID is not all zeros.
    #[error("bad header CLSID")]
    Clsid,

    /// Major version is neither 3 nor 4, or minor version is not 0x3E.
    #[error("bad version")]
    Version,

    /// Sector shift does not match the major version (9 for v3, 12 for v4).
    #[error("invalid sector shift, expected 9 or 12")]
    SectorShift,

    /// Mini sector shift is not 6.
    #[error("invalid mini sector shift, expected 6")]
    MiniSectorShift,

    /// Mini stream cutoff is not 0x1000.
    #[error("incorrect mini stream cutoff size")]
    MiniStreamCutoff,
}

/// Main error type for compound file operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Header validation failed
    #[error("Invalid format: {0}")]
    Format(#[from] FormatCheck),

    /// A sector, mini sector or the header was shorter than its fixed size
    #[error("Bad sector read: expected {expected} bytes, got {actual}")]
    SectorSize { expected: usize, actual: usize },

    /// The root directory entry declares siblings
    #[error("Root directory has illegal siblings")]
    RootSibling,

    /// Declared name length exceeds 64 bytes
    #[error("Invalid name property length: {0}")]
    NameLength(u16),

    /// Object type outside the known range
    #[error("Unknown storage type: {0}")]
    StorageType(u8),

    /// A storage entry declares a non-zero stream size
    #[error("Storage entry {id} declares size {size}")]
    StorageSize { id: u32, size: u64 },

    /// The container needs DIFAT sectors to locate its FAT
    #[error("Unsupported allocation chaining: {0}")]
    UnsupportedChaining(String),

    /// Corrupted or malformed file
    #[error("Corrupted file: {0}")]
    CorruptedFile(String),

    /// Seek target is negative or past the logical end of the stream
    #[error("Seek target {target} outside stream of {size} bytes")]
    SeekRange { target: i128, size: u64 },

    /// A fixed-width read needs more bytes than remain in the stream
    #[error("Unexpected end of stream: needed {needed} bytes, {available} available")]
    EndOfStream { needed: usize, available: u64 },

    /// A stream was requested from a storage or other non-stream entry
    #[error("Entry '{0}' is not a stream")]
    NotStream(String),

    /// No entry exists at the requested path
    #[error("Entry not found: {0}")]
    EntryNotFound(String),
}

/// Result type for compound file operations.
pub type Result<T> = std::result::Result<T, Error>;
