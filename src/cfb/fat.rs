//! Allocation tables and chain following.
//!
//! The FAT maps each regular sector to the next sector of its chain. The
//! mini FAT has the same shape but addresses mini sectors, so both are
//! represented by [`AllocationTable`].

use super::consts::*;
use super::header::Header;
use super::sector::SectorStore;
use crate::common::{ByteOrder, Error, Result};
use fixedbitset::FixedBitSet;
use log::{debug, trace};

/// An immutable sector-chain table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationTable {
    label: &'static str,
    entries: Vec<u32>,
}

impl AllocationTable {
    /// Assemble the FAT from the header's inline sector id list.
    ///
    /// Collection stops at the first `ENDOFCHAIN` id and skips `FREESECT`
    /// ids. The table is truncated to the number of sectors present.
    pub fn build(header: &Header, sectors: &SectorStore) -> Result<Self> {
        check_supported(header)?;

        let order = header.byte_order();
        let mut entries = Vec::new();
        for id in header.inline_fat_ids() {
            if id == FREESECT {
                continue;
            }
            entries.extend(order.read_u32_array(sectors.get(id)?));
        }

        if entries.len() > sectors.len() {
            debug!(
                "FAT truncated from {} to {} entries",
                entries.len(),
                sectors.len()
            );
            entries.truncate(sectors.len());
        }
        debug!("FAT assembled with {} entries", entries.len());

        Ok(AllocationTable {
            label: "FAT",
            entries,
        })
    }

    /// Assemble a table from every sector of a regular chain.
    pub(crate) fn from_chain(
        label: &'static str,
        fat: &AllocationTable,
        sectors: &SectorStore,
        start: u32,
        order: ByteOrder,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        for id in fat.chain(start)? {
            entries.extend(order.read_u32_array(sectors.get(id)?));
        }
        Ok(AllocationTable { label, entries })
    }

    /// Wrap an already decoded entry list.
    pub fn from_entries(label: &'static str, entries: Vec<u32>) -> Self {
        AllocationTable { label, entries }
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        if self.entries.len() > len {
            debug!(
                "{} truncated from {} to {} entries",
                self.label,
                self.entries.len(),
                len
            );
            self.entries.truncate(len);
        }
    }

    /// Follow a chain from `start` and return its ids in order.
    ///
    /// Any id above `MAXREGSECT` ends the chain. An id outside the table, or
    /// one that was already visited, is reported as a corrupted file, so the
    /// result never holds more than `self.len()` ids.
    pub fn chain(&self, start: u32) -> Result<Vec<u32>> {
        let mut ids = Vec::new();
        let mut visited = FixedBitSet::with_capacity(self.entries.len());
        let mut id = start;

        while id <= MAXREGSECT {
            let index = id as usize;
            if index >= self.entries.len() {
                return Err(Error::CorruptedFile(format!(
                    "{} id {} outside table of {} entries",
                    self.label,
                    id,
                    self.entries.len()
                )));
            }
            if visited.put(index) {
                return Err(Error::CorruptedFile(format!(
                    "{} chain starting at {} loops back to {}",
                    self.label, start, id
                )));
            }
            ids.push(id);
            id = self.entries[index];
        }

        trace!("{} chain from {} spans {} ids", self.label, start, ids.len());
        Ok(ids)
    }

    /// Next id after `id`, if `id` is inside the table.
    #[inline]
    pub fn next(&self, id: u32) -> Option<u32> {
        self.entries.get(id as usize).copied()
    }

    #[inline]
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reject containers whose FAT cannot be located from the header alone.
fn check_supported(header: &Header) -> Result<()> {
    if header.num_difat_sectors > 0 {
        return Err(Error::UnsupportedChaining(format!(
            "{} DIFAT sectors declared",
            header.num_difat_sectors
        )));
    }
    if header.num_fat_sectors as usize > HEADER_FAT_IDS {
        return Err(Error::UnsupportedChaining(format!(
            "{} FAT sectors declared, at most {} fit in the header",
            header.num_fat_sectors, HEADER_FAT_IDS
        )));
    }
    Ok(())
}
