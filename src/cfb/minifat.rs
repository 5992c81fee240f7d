//! Mini FAT and mini stream.
//!
//! Streams smaller than the header's cutoff are stored in 64-byte mini
//! sectors. Those mini sectors live inside the mini stream, which is the
//! root entry's own regular-sector chain, and are chained by the mini FAT.

use super::fat::AllocationTable;
use super::header::Header;
use super::sector::SectorStore;
use crate::common::{Error, Result};
use bytes::{Bytes, BytesMut};
use log::{debug, warn};

/// The root entry's chain, concatenated into one logical buffer.
#[derive(Debug, Clone)]
pub struct MiniStream {
    data: Bytes,
    mini_sector_size: usize,
}

impl MiniStream {
    /// Concatenate the regular chain starting at `start`, capped at `size` bytes.
    pub fn build(
        fat: &AllocationTable,
        sectors: &SectorStore,
        start: u32,
        size: u64,
        mini_sector_size: usize,
    ) -> Result<Self> {
        let chain = fat.chain(start)?;
        let mut data = BytesMut::with_capacity(chain.len() * sectors.sector_size());
        for id in chain {
            data.extend_from_slice(sectors.get(id)?);
        }

        let available = data.len() as u64;
        if available > size {
            data.truncate(size as usize);
        } else if available < size {
            warn!(
                "mini stream chain holds {} bytes but the root entry declares {}",
                available, size
            );
        }

        Ok(MiniStream {
            data: data.freeze(),
            mini_sector_size,
        })
    }

    /// The mini sector with the given id, as a slice of the mini stream.
    ///
    /// A mini sector reaching past the end of the mini stream fails with
    /// [`Error::SectorSize`].
    pub fn sector(&self, id: u32) -> Result<Bytes> {
        let offset = id as usize * self.mini_sector_size;
        let end = offset + self.mini_sector_size;
        if end > self.data.len() {
            return Err(Error::SectorSize {
                expected: self.mini_sector_size,
                actual: self.data.len().saturating_sub(offset),
            });
        }
        Ok(self.data.slice(offset..end))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn mini_sector_size(&self) -> usize {
        self.mini_sector_size
    }
}

/// The mini FAT together with the mini stream it addresses.
#[derive(Debug, Clone)]
pub struct MiniAllocation {
    pub table: AllocationTable,
    pub stream: MiniStream,
}

impl MiniAllocation {
    /// Build the mini FAT and mini stream for a root entry.
    ///
    /// Returns `None` when the header declares no mini FAT sectors.
    pub fn build(
        header: &Header,
        fat: &AllocationTable,
        sectors: &SectorStore,
        root_start: u32,
        root_size: u64,
    ) -> Result<Option<Self>> {
        if !header.has_minifat() {
            return Ok(None);
        }

        let mini_sector_size = header.mini_sector_size()?;
        let mut table = AllocationTable::from_chain(
            "MiniFAT",
            fat,
            sectors,
            header.first_minifat_sector,
            header.byte_order(),
        )?;
        table.truncate((root_size / mini_sector_size as u64) as usize);

        let stream = MiniStream::build(fat, sectors, root_start, root_size, mini_sector_size)?;
        debug!(
            "mini FAT assembled with {} entries over a {}-byte mini stream",
            table.len(),
            stream.len()
        );

        Ok(Some(MiniAllocation { table, stream }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfb::consts::*;
    use crate::cfb::test_support::{ContainerBuilder, pattern, table_sector};

    struct Loaded {
        header: Header,
        sectors: SectorStore,
        fat: AllocationTable,
    }

    fn load(builder: &ContainerBuilder) -> Loaded {
        let data = builder.build();
        let header = Header::parse(&data).unwrap();
        let sectors = SectorStore::from_bytes(Bytes::from(data).slice(512..), 512).unwrap();
        let fat = AllocationTable::build(&header, &sectors).unwrap();
        Loaded {
            header,
            sectors,
            fat,
        }
    }

    /// FAT in sector 0, mini FAT in sector 1, mini stream in sectors 2 -> 3.
    fn builder() -> ContainerBuilder {
        let mut builder = ContainerBuilder::new();
        builder.set_fat_ids(&[0]).set_minifat(1, 1);
        builder.push_sector(table_sector(&[FATSECT, ENDOFCHAIN, 3, ENDOFCHAIN]));
        builder.push_sector(table_sector(&[1, 2, ENDOFCHAIN, 4, ENDOFCHAIN]));
        builder.push_sector(pattern(0, 512));
        builder.push_sector(pattern(100, 512));
        builder
    }

    #[test]
    fn test_no_minifat_declared() {
        let mut builder = builder();
        builder.set_minifat(ENDOFCHAIN, 0);
        let loaded = load(&builder);
        let mini =
            MiniAllocation::build(&loaded.header, &loaded.fat, &loaded.sectors, 2, 1024).unwrap();
        assert!(mini.is_none());
    }

    #[test]
    fn test_minifat_truncated_to_root_size() {
        let loaded = load(&builder());
        let mini = MiniAllocation::build(&loaded.header, &loaded.fat, &loaded.sectors, 2, 320)
            .unwrap()
            .unwrap();
        assert_eq!(mini.table.entries(), &[1, 2, ENDOFCHAIN, 4, ENDOFCHAIN]);
        assert_eq!(mini.stream.len(), 320);
    }

    #[test]
    fn test_mini_stream_spans_sector_boundary() {
        let loaded = load(&builder());
        let stream = MiniStream::build(&loaded.fat, &loaded.sectors, 2, 1024, 64).unwrap();
        assert_eq!(stream.len(), 1024);
        let eighth = stream.sector(8).unwrap();
        assert_eq!(&eighth[..], &pattern(100, 64)[..]);
        assert_eq!(stream.sector(7).unwrap()[0], pattern(0, 512)[448]);
    }

    #[test]
    fn test_mini_sector_past_end() {
        let loaded = load(&builder());
        let stream = MiniStream::build(&loaded.fat, &loaded.sectors, 2, 100, 64).unwrap();
        assert_eq!(stream.len(), 100);
        assert!(stream.sector(0).is_ok());
        assert!(matches!(
            stream.sector(1),
            Err(Error::SectorSize {
                expected: 64,
                actual: 36
            })
        ));
    }

    #[test]
    fn test_short_root_chain_is_tolerated() {
        let loaded = load(&builder());
        let stream = MiniStream::build(&loaded.fat, &loaded.sectors, 3, 4000, 64).unwrap();
        assert_eq!(stream.len(), 512);
    }
}
