//! Synthetic container builders shared by the unit tests.

use super::consts::*;

const SECTOR: usize = 512;

/// Builds version 3 (512-byte sector, little-endian) containers byte by byte.
pub(crate) struct ContainerBuilder {
    header: [u8; HEADER_SIZE],
    sectors: Vec<Vec<u8>>,
}

impl ContainerBuilder {
    /// A valid header with no FAT, no directory and no mini FAT.
    pub fn new() -> Self {
        let mut header = [0u8; HEADER_SIZE];
        header[0..8].copy_from_slice(MAGIC);
        header[0x18..0x1A].copy_from_slice(&MINOR_VERSION.to_le_bytes());
        header[0x1A..0x1C].copy_from_slice(&3u16.to_le_bytes());
        header[0x1C..0x1E].copy_from_slice(&0xFFFEu16.to_le_bytes());
        header[0x1E..0x20].copy_from_slice(&SECTOR_SHIFT_V3.to_le_bytes());
        header[0x20..0x22].copy_from_slice(&MINI_SECTOR_SHIFT.to_le_bytes());
        let mut builder = ContainerBuilder {
            header,
            sectors: Vec::new(),
        };
        builder.set_u32(0x30, ENDOFCHAIN);
        builder.set_u32(0x38, MINI_STREAM_CUTOFF);
        builder.set_u32(0x3C, ENDOFCHAIN);
        builder.set_u32(0x44, ENDOFCHAIN);
        for slot in 0..HEADER_FAT_IDS {
            builder.set_u32(0x4C + slot * 4, FREESECT);
        }
        builder
    }

    pub fn set_u32(&mut self, offset: usize, value: u32) -> &mut Self {
        self.header[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        self
    }

    /// Write the inline FAT id list and the FAT sector count.
    pub fn set_fat_ids(&mut self, ids: &[u32]) -> &mut Self {
        for (slot, &id) in ids.iter().enumerate() {
            self.set_u32(0x4C + slot * 4, id);
        }
        let count = ids.iter().filter(|&&id| id <= MAXREGSECT).count() as u32;
        self.set_u32(0x2C, count)
    }

    pub fn set_dir_start(&mut self, id: u32) -> &mut Self {
        self.set_u32(0x30, id)
    }

    pub fn set_minifat(&mut self, start: u32, count: u32) -> &mut Self {
        self.set_u32(0x3C, start);
        self.set_u32(0x40, count)
    }

    /// Append a sector, zero-padding it to 512 bytes.
    pub fn push_sector(&mut self, mut data: Vec<u8>) -> u32 {
        assert!(data.len() <= SECTOR);
        data.resize(SECTOR, 0);
        self.sectors.push(data);
        (self.sectors.len() - 1) as u32
    }

    pub fn header_bytes(&self) -> &[u8] {
        &self.header
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.header.to_vec();
        for sector in &self.sectors {
            out.extend_from_slice(sector);
        }
        out
    }
}

/// One sector of u32 table entries, padded with `FREESECT`.
pub(crate) fn table_sector(entries: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SECTOR);
    for slot in 0..SECTOR / 4 {
        let value = entries.get(slot).copied().unwrap_or(FREESECT);
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

/// Fields of one directory record.
#[derive(Clone)]
pub(crate) struct Record {
    pub name: &'static str,
    pub kind: u8,
    pub left: u32,
    pub right: u32,
    pub child: u32,
    pub start: u32,
    pub size: u32,
}

impl Record {
    pub fn new(name: &'static str, kind: u8) -> Self {
        Record {
            name,
            kind,
            left: NOSTREAM,
            right: NOSTREAM,
            child: NOSTREAM,
            start: ENDOFCHAIN,
            size: 0,
        }
    }

    pub fn root(child: u32) -> Self {
        Record {
            child,
            ..Record::new("Root Entry", STGTY_ROOT)
        }
    }

    pub fn stream(name: &'static str, start: u32, size: u32) -> Self {
        Record {
            start,
            size,
            ..Record::new(name, STGTY_STREAM)
        }
    }

    pub fn storage(name: &'static str, child: u32) -> Self {
        Record {
            child,
            ..Record::new(name, STGTY_STORAGE)
        }
    }

    pub fn siblings(mut self, left: u32, right: u32) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    pub fn located(mut self, start: u32, size: u32) -> Self {
        self.start = start;
        self.size = size;
        self
    }

    pub fn encode(&self) -> [u8; DIRENTRY_SIZE] {
        let mut out = [0u8; DIRENTRY_SIZE];
        let units: Vec<u16> = self.name.encode_utf16().collect();
        for (i, unit) in units.iter().enumerate() {
            out[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        let name_len = if units.is_empty() {
            0
        } else {
            ((units.len() + 1) * 2) as u16
        };
        out[0x40..0x42].copy_from_slice(&name_len.to_le_bytes());
        out[0x42] = self.kind;
        out[0x43] = DE_BLACK;
        out[0x44..0x48].copy_from_slice(&self.left.to_le_bytes());
        out[0x48..0x4C].copy_from_slice(&self.right.to_le_bytes());
        out[0x4C..0x50].copy_from_slice(&self.child.to_le_bytes());
        out[0x74..0x78].copy_from_slice(&self.start.to_le_bytes());
        out[0x78..0x7C].copy_from_slice(&self.size.to_le_bytes());
        out
    }
}

/// Unused directory slot.
pub(crate) fn empty_record() -> Record {
    Record::new("", STGTY_EMPTY)
}

/// Pack up to four records into one 512-byte directory sector.
pub(crate) fn directory_sector(records: &[Record]) -> Vec<u8> {
    assert!(records.len() <= SECTOR / DIRENTRY_SIZE);
    let mut out = Vec::with_capacity(SECTOR);
    for slot in 0..SECTOR / DIRENTRY_SIZE {
        let record = records.get(slot).cloned().unwrap_or_else(empty_record);
        out.extend_from_slice(&record.encode());
    }
    out
}

/// Deterministic filler so each sector's bytes are distinguishable.
pub(crate) fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

/// The minimal container: root storage with one 1000-byte stream "Test"
/// stored in a two-sector regular chain, and no mini FAT.
///
/// Sector 0 is the FAT, sector 1 the directory, sectors 2 and 3 the data.
pub(crate) fn single_stream_container() -> Vec<u8> {
    let mut builder = ContainerBuilder::new();
    builder.set_fat_ids(&[0]).set_dir_start(1);
    builder.push_sector(table_sector(&[FATSECT, ENDOFCHAIN, 3, ENDOFCHAIN]));
    builder.push_sector(directory_sector(&[
        Record::root(1),
        Record::stream("Test", 2, 1000),
    ]));
    builder.push_sector(pattern(0x10, SECTOR));
    builder.push_sector(pattern(0x80, SECTOR));
    builder.build()
}

/// A container exercising both allocation paths.
///
/// ```text
/// Root Entry (mini stream = sector 4, 192 bytes)
/// ├── Folder (storage)
/// │   └── Inner  (10 bytes, mini sector 2)
/// ├── Small      (100 bytes, mini sectors 0 -> 1)
/// └── Big        (4100 bytes, sectors 5..=13)
/// ```
///
/// Sector 0 is the FAT, sectors 1-2 the directory, sector 3 the mini FAT.
pub(crate) fn mixed_container() -> Vec<u8> {
    let mut builder = ContainerBuilder::new();
    builder.set_fat_ids(&[0]).set_dir_start(1).set_minifat(3, 1);

    let mut fat = vec![FATSECT, 2, ENDOFCHAIN, ENDOFCHAIN, ENDOFCHAIN];
    fat.extend(6..=13);
    fat.push(ENDOFCHAIN);
    builder.push_sector(table_sector(&fat));

    builder.push_sector(directory_sector(&[
        Record::root(2).located(4, 192),
        Record::stream("Small", 0, 100),
        Record::storage("Folder", 4).siblings(1, 3),
        Record::stream("Big", 5, 4100),
    ]));
    builder.push_sector(directory_sector(&[Record::stream("Inner", 2, 10)]));
    builder.push_sector(table_sector(&[1, ENDOFCHAIN, ENDOFCHAIN]));

    let mut ministream = pattern(0x20, 128);
    ministream.extend(pattern(0xA0, 64));
    builder.push_sector(ministream);

    for seed in 0..9u8 {
        builder.push_sector(pattern(seed.wrapping_mul(16), SECTOR));
    }
    builder.build()
}
