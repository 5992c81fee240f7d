//! Error conversion implementations.
//!
//! This module contains From trait implementations between the crate error
//! type and the error types it meets at its boundaries.

use super::types::Error;
use crate::common::binary::BinaryError;
use std::io;

impl From<BinaryError> for Error {
    fn from(err: BinaryError) -> Self {
        Error::CorruptedFile(err.to_string())
    }
}

// `std::io::Seek` can only report `io::Error`, so stream errors are wrapped
// with a kind that matches their meaning.
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::SeekRange { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::EndOfStream { .. } | Error::SectorSize { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, err)
            },
            other => io::Error::other(other),
        }
    }
}
