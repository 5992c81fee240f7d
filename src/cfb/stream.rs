//! Logical streams over sector chains.
//!
//! A [`StreamReader`] owns `Bytes` handles to the sectors (or mini sectors)
//! of one chain plus its own cursor. It never touches the document again
//! after construction, so readers can be moved to other threads freely.

use super::fat::AllocationTable;
use super::minifat::MiniAllocation;
use super::sector::SectorStore;
use crate::common::{Error, Result};
use bytes::Bytes;
use std::io::{self, Read, Seek, SeekFrom};

/// Which allocation path backs a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamLocation {
    /// Whole regular sectors chained by the FAT
    Regular,
    /// Mini sectors of the mini stream chained by the mini FAT
    Mini,
}

/// Seekable reader over one stream.
#[derive(Debug, Clone)]
pub struct StreamReader {
    segments: Vec<Bytes>,
    segment_size: usize,
    len: u64,
    pos: u64,
    location: StreamLocation,
}

impl StreamReader {
    /// Stream over a FAT chain of whole sectors.
    pub(crate) fn regular(
        fat: &AllocationTable,
        sectors: &SectorStore,
        start: u32,
        size: u64,
    ) -> Result<Self> {
        let segments = fat
            .chain(start)?
            .into_iter()
            .map(|id| sectors.get(id).cloned())
            .collect::<Result<Vec<_>>>()?;
        Self::with_segments(
            segments,
            sectors.sector_size(),
            size,
            StreamLocation::Regular,
        )
    }

    /// Stream over a mini FAT chain of mini sectors.
    pub(crate) fn mini(mini: &MiniAllocation, start: u32, size: u64) -> Result<Self> {
        let segments = mini
            .table
            .chain(start)?
            .into_iter()
            .map(|id| mini.stream.sector(id))
            .collect::<Result<Vec<_>>>()?;
        Self::with_segments(
            segments,
            mini.stream.mini_sector_size(),
            size,
            StreamLocation::Mini,
        )
    }

    /// Build a reader from equally sized segments.
    ///
    /// A `declared` size of 0 takes the length of all segments; otherwise the
    /// segments must hold at least `declared` bytes.
    pub(crate) fn with_segments(
        segments: Vec<Bytes>,
        segment_size: usize,
        declared: u64,
        location: StreamLocation,
    ) -> Result<Self> {
        let available = segments.len() as u64 * segment_size as u64;
        let len = match declared {
            0 => available,
            n if n > available => {
                return Err(Error::CorruptedFile(format!(
                    "stream declares {} bytes but its chain holds {}",
                    n, available
                )));
            },
            n => n,
        };

        Ok(StreamReader {
            segments,
            segment_size,
            len,
            pos: 0,
            location,
        })
    }

    /// Logical length in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    #[inline]
    pub fn location(&self) -> StreamLocation {
        self.location
    }

    /// Number of sectors or mini sectors visited by the chain.
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Move the cursor.
    ///
    /// Fails with [`Error::SeekRange`] when the target is negative or past
    /// the logical length. Seeking exactly to the end is allowed.
    pub fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(delta) => i128::from(self.pos) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len) + i128::from(delta),
        };
        if target < 0 || target > i128::from(self.len) {
            return Err(Error::SeekRange {
                target,
                size: self.len,
            });
        }
        self.pos = target as u64;
        Ok(self.pos)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let available = self.remaining();
        if available < N as u64 {
            return Err(Error::EndOfStream {
                needed: N,
                available,
            });
        }
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read everything from the cursor to the end.
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.remaining() as usize);
        self.read_to_end(&mut out)?;
        Ok(out)
    }

    /// Decode the rest of the stream as UTF-16.
    ///
    /// Little-endian unless a byte order mark says otherwise; the mark itself
    /// is not part of the result.
    pub fn read_unicode(&mut self) -> Result<String> {
        let bytes = self.read_all()?;
        let (text, _, _) = encoding_rs::UTF_16LE.decode(&bytes);
        Ok(text.into_owned())
    }

    /// The rest of the stream as UTF-8, with invalid sequences replaced.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_all()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }

        let index = (self.pos / self.segment_size as u64) as usize;
        let offset = (self.pos % self.segment_size as u64) as usize;
        let Some(segment) = self.segments.get(index) else {
            return Ok(0);
        };

        let in_segment = segment.len() - offset;
        let n = buf
            .len()
            .min(in_segment)
            .min(usize::try_from(self.remaining()).unwrap_or(usize::MAX));
        buf[..n].copy_from_slice(&segment[offset..offset + n]);
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for StreamReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_to(pos).map_err(io::Error::from)
    }
}
