//! Binary data parsing utilities shared across the decoding stages.
//!
//! Compound files declare their byte order in the header, so every
//! multi-byte read outside the header itself goes through [`ByteOrder`].

use thiserror::Error;
use zerocopy::{BE, FromBytes, LE, U16, U32, U64};

/// Failure to pull a fixed-width value out of a byte slice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BinaryError {
    /// The slice ends before `expected` bytes
    #[error("slice holds {available} bytes, field needs {expected}")]
    InsufficientData { expected: usize, available: usize },
    #[error("cannot decode {0}")]
    ParseError(&'static str),
}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

#[inline]
fn field(data: &[u8], offset: usize, width: usize) -> BinaryResult<&[u8]> {
    let end = offset.checked_add(width).ok_or(BinaryError::InsufficientData {
        expected: usize::MAX,
        available: data.len(),
    })?;
    data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })
}

/// Read a little-endian u16 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use cfbtree::common::binary::read_u16_le;
/// // minor version 0x3E, major version 3
/// let data = [0x3E, 0x00, 0x03, 0x00];
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 3);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    U16::<LE>::read_from_bytes(field(data, offset, 2)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("u16"))
}

/// Read a big-endian u16 from a byte slice at the given offset.
#[inline]
pub fn read_u16_be(data: &[u8], offset: usize) -> BinaryResult<u16> {
    U16::<BE>::read_from_bytes(field(data, offset, 2)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("u16"))
}

/// Read a little-endian u32 from a byte slice at the given offset.
///
/// # Examples
///
/// ```
/// use cfbtree::common::binary::read_u32_le;
/// let end_of_chain = [0xFE, 0xFF, 0xFF, 0xFF];
/// assert_eq!(read_u32_le(&end_of_chain, 0).unwrap(), 0xFFFF_FFFE);
/// assert!(read_u32_le(&end_of_chain, 1).is_err());
/// ```
#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    U32::<LE>::read_from_bytes(field(data, offset, 4)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("u32"))
}

/// Read a big-endian u32 from a byte slice at the given offset.
#[inline]
pub fn read_u32_be(data: &[u8], offset: usize) -> BinaryResult<u32> {
    U32::<BE>::read_from_bytes(field(data, offset, 4)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("u32"))
}

/// Read a little-endian u64 from a byte slice at the given offset.
#[inline]
pub fn read_u64_le(data: &[u8], offset: usize) -> BinaryResult<u64> {
    U64::<LE>::read_from_bytes(field(data, offset, 8)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("u64"))
}

/// Read a big-endian u64 from a byte slice at the given offset.
#[inline]
pub fn read_u64_be(data: &[u8], offset: usize) -> BinaryResult<u64> {
    U64::<BE>::read_from_bytes(field(data, offset, 8)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("u64"))
}

/// Byte order declared by a container's byte-order mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Byte-order mark value that selects little-endian decoding.
    pub const LITTLE_ENDIAN_MARK: u16 = 0xFFFE;

    /// Derive the byte order from the header's order-mark field.
    ///
    /// Only `0xFFFE` selects little-endian; every other value is taken as big-endian.
    #[inline]
    pub fn from_mark(mark: u16) -> Self {
        if mark == Self::LITTLE_ENDIAN_MARK {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    #[inline]
    pub fn read_u16(self, data: &[u8], offset: usize) -> BinaryResult<u16> {
        match self {
            ByteOrder::Little => read_u16_le(data, offset),
            ByteOrder::Big => read_u16_be(data, offset),
        }
    }

    #[inline]
    pub fn read_u32(self, data: &[u8], offset: usize) -> BinaryResult<u32> {
        match self {
            ByteOrder::Little => read_u32_le(data, offset),
            ByteOrder::Big => read_u32_be(data, offset),
        }
    }

    #[inline]
    pub fn read_u64(self, data: &[u8], offset: usize) -> BinaryResult<u64> {
        match self {
            ByteOrder::Little => read_u64_le(data, offset),
            ByteOrder::Big => read_u64_be(data, offset),
        }
    }

    /// Reinterpret a whole buffer as packed u32 values.
    ///
    /// Trailing bytes that do not fill a complete value are ignored.
    pub fn read_u32_array(self, data: &[u8]) -> Vec<u32> {
        data.chunks_exact(4)
            .map(|chunk| {
                let bytes = [chunk[0], chunk[1], chunk[2], chunk[3]];
                match self {
                    ByteOrder::Little => u32::from_le_bytes(bytes),
                    ByteOrder::Big => u32::from_be_bytes(bytes),
                }
            })
            .collect()
    }
}
