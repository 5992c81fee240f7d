//! Sector ingestion.
//!
//! Everything after the header sector is a run of equally sized sectors.
//! They are kept in one shared buffer and handed out as cheap `Bytes` slices.

use crate::common::{Error, Result};
use bytes::Bytes;
use std::io::{ErrorKind, Read};

/// All regular sectors of a container, indexable by sector id.
#[derive(Debug, Clone)]
pub struct SectorStore {
    sectors: Vec<Bytes>,
    sector_size: usize,
}

impl SectorStore {
    /// Read sectors from `reader` until it is exhausted.
    ///
    /// A final block shorter than `sector_size` fails with
    /// [`Error::SectorSize`]; ending exactly on a sector boundary is fine.
    pub fn read_from<R: Read>(reader: &mut R, sector_size: usize) -> Result<Self> {
        let mut buffer = Vec::new();
        loop {
            let start = buffer.len();
            buffer.resize(start + sector_size, 0);
            let read = read_block(reader, &mut buffer[start..])?;
            if read == 0 {
                buffer.truncate(start);
                break;
            }
            if read < sector_size {
                return Err(Error::SectorSize {
                    expected: sector_size,
                    actual: read,
                });
            }
        }
        Self::from_bytes(Bytes::from(buffer), sector_size)
    }

    /// Slice an in-memory buffer into sectors without copying.
    pub fn from_bytes(data: Bytes, sector_size: usize) -> Result<Self> {
        let remainder = data.len() % sector_size;
        if remainder != 0 {
            return Err(Error::SectorSize {
                expected: sector_size,
                actual: remainder,
            });
        }

        let sectors = (0..data.len() / sector_size)
            .map(|i| data.slice(i * sector_size..(i + 1) * sector_size))
            .collect();
        Ok(SectorStore {
            sectors,
            sector_size,
        })
    }

    /// Get a sector by id.
    pub fn get(&self, id: u32) -> Result<&Bytes> {
        self.sectors.get(id as usize).ok_or_else(|| {
            Error::CorruptedFile(format!(
                "sector {} out of range ({} sectors)",
                id,
                self.sectors.len()
            ))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    #[inline]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }
}

/// Fill `buf` from `reader`, tolerating short reads. Returns bytes read,
/// which is less than `buf.len()` only when the reader is exhausted.
pub(crate) fn read_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
