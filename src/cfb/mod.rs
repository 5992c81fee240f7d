/// Format constants and sentinel sector ids
pub mod consts;

/// Options controlling how containers are opened
mod config;

/// Header decoding and validation
pub mod header;

/// Sector ingestion
pub mod sector;

/// The file allocation table and chain walking
pub mod fat;

/// Mini FAT and mini stream
pub mod minifat;

/// Directory record decoding
pub mod directory;

/// Directory tree reconstruction and entry handles
mod tree;

/// Seekable readers over stream contents
pub mod stream;

/// The document entry point
mod document;

#[cfg(test)]
mod test_support;


// Re-export public types for convenient access
pub use config::CfbOptions;
pub use directory::{DirectoryRecord, EntryType, FileTime, Guid, NodeColor};
pub use document::Document;
pub use fat::AllocationTable;
pub use header::{Header, is_cfb_file};
pub use stream::{StreamLocation, StreamReader};
pub use tree::DirectoryEntry;
