//! cfbtree - A Rust library for reading Compound File Binary containers
//!
//! Compound files (also called OLE2 structured storage) hold a small
//! filesystem inside a single file: storages act as directories and streams
//! as files. Legacy Office documents (.doc, .xls, .ppt), MSI packages and
//! Outlook messages all use this container.
//!
//! # Features
//!
//! - **Header validation**: Signature, version, sector sizes and cutoff are checked on open
//! - **Both allocation paths**: Regular FAT chains and mini FAT chains inside the mini stream
//! - **Directory tree**: The per-storage red-black trees are flattened into ordered child lists
//! - **Seekable streams**: Every stream reader implements `Read` and `Seek`
//! - **Zero-copy sectors**: In-memory containers are sliced, not copied
//!
//! # Example - Listing a container
//!
//! ```no_run
//! use cfbtree::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = Document::open_path("document.doc")?;
//!
//! doc.walk(|entry| {
//!     let indent = "  ".repeat(entry.level() as usize);
//!     println!("{}{} ({} bytes)", indent, entry.name(), entry.size());
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Reading a stream
//!
//! ```no_run
//! use std::io::{Read, Seek, SeekFrom};
//! use cfbtree::Document;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let doc = Document::open_path("document.doc")?;
//! let root = doc.root()?;
//!
//! if let Some(entry) = root.find(&["WordDocument"]) {
//!     let mut stream = entry.open_stream()?;
//!     stream.seek(SeekFrom::Start(0x0A))?;
//!     let flags = stream.read_u16()?;
//!     println!("FIB flags: {:#06x}", flags);
//!
//!     let mut rest = Vec::new();
//!     stream.read_to_end(&mut rest)?;
//! }
//! # Ok(())
//! # }
//! ```

/// Compound File Binary container reader
///
/// This module decodes the header, the sector allocation tables and the
/// directory, and exposes streams through [`Document`].
pub mod cfb;

/// Shared byte-level helpers and the crate error type
pub mod common;

// Re-export commonly used types for convenience
pub use cfb::{
    CfbOptions, DirectoryEntry, Document, EntryType, FileTime, Guid, Header, StreamLocation,
    StreamReader, is_cfb_file,
};
pub use common::{Error, Result};
