//! On-disk directory records.
//!
//! The directory stream is a flat array of 128-byte records. Each record
//! names a storage or stream and links to its siblings and first child by
//! index into that array.

use super::consts::*;
use crate::common::{ByteOrder, Error, Result};
use std::fmt;

/// Directory object type (offset 0x42).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    Invalid,
    Storage,
    Stream,
    LockBytes,
    Property,
    Root,
}

impl EntryType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            STGTY_EMPTY => Some(EntryType::Invalid),
            STGTY_STORAGE => Some(EntryType::Storage),
            STGTY_STREAM => Some(EntryType::Stream),
            STGTY_LOCKBYTES => Some(EntryType::LockBytes),
            STGTY_PROPERTY => Some(EntryType::Property),
            STGTY_ROOT => Some(EntryType::Root),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            EntryType::Invalid => STGTY_EMPTY,
            EntryType::Storage => STGTY_STORAGE,
            EntryType::Stream => STGTY_STREAM,
            EntryType::LockBytes => STGTY_LOCKBYTES,
            EntryType::Property => STGTY_PROPERTY,
            EntryType::Root => STGTY_ROOT,
        }
    }
}

/// Red-black tree color flag (offset 0x43). Decoded but not used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeColor {
    Red,
    Black,
}

impl NodeColor {
    fn from_u8(value: u8) -> Self {
        if value == DE_RED {
            NodeColor::Red
        } else {
            NodeColor::Black
        }
    }
}

/// 16-byte class identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    pub fn is_nil(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Guid {
    /// Formats as `{XXXXXXXX-XXXX-XXXX-XXXXXXXXXXXXXXXX}`; the first three
    /// groups are little-endian, the last eight bytes are printed in order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{{{:08X}-{:04X}-{:04X}-",
            u32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            u16::from_le_bytes([b[4], b[5]]),
            u16::from_le_bytes([b[6], b[7]]),
        )?;
        for byte in &b[8..] {
            write!(f, "{:02X}", byte)?;
        }
        f.write_str("}")
    }
}

/// Raw Windows FILETIME (100ns intervals since 1601-01-01), undecoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileTime(pub u64);

impl FileTime {
    #[inline]
    pub fn low(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub fn high(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

/// One decoded 128-byte directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub name_units: [u16; 32],
    /// Name length in bytes, including the terminator
    pub name_len: u16,
    pub object_type: u8,
    pub color: NodeColor,
    pub left_sibling: u32,
    pub right_sibling: u32,
    pub child: u32,
    pub clsid: Guid,
    pub user_flags: u32,
    pub created: FileTime,
    pub modified: FileTime,
    pub start_sector: u32,
    /// Declared stream size; only the low 32 bits are read for version 3
    pub size: u64,
    pub property_type: u16,
}

impl DirectoryRecord {
    /// Decode a record from the first 128 bytes of `data`.
    ///
    /// The name-length bound is always enforced; the remaining checks live
    /// in [`DirectoryRecord::validate`].
    pub fn decode(data: &[u8], order: ByteOrder, major_version: u16) -> Result<Self> {
        let data = data.get(..DIRENTRY_SIZE).ok_or(Error::SectorSize {
            expected: DIRENTRY_SIZE,
            actual: data.len(),
        })?;

        let name_len = order.read_u16(data, 0x40)?;
        if name_len > MAX_NAME_LEN {
            return Err(Error::NameLength(name_len));
        }

        let mut name_units = [0u16; 32];
        for (i, unit) in name_units.iter_mut().enumerate() {
            *unit = order.read_u16(data, i * 2)?;
        }

        let mut clsid = [0u8; 16];
        clsid.copy_from_slice(&data[0x50..0x60]);

        let size = if major_version >= 4 {
            order.read_u64(data, 0x78)?
        } else {
            u64::from(order.read_u32(data, 0x78)?)
        };

        Ok(DirectoryRecord {
            name_units,
            name_len,
            object_type: data[0x42],
            color: NodeColor::from_u8(data[0x43]),
            left_sibling: order.read_u32(data, 0x44)?,
            right_sibling: order.read_u32(data, 0x48)?,
            child: order.read_u32(data, 0x4C)?,
            clsid: Guid(clsid),
            user_flags: order.read_u32(data, 0x60)?,
            created: FileTime(order.read_u64(data, 0x64)?),
            modified: FileTime(order.read_u64(data, 0x6C)?),
            start_sector: order.read_u32(data, 0x74)?,
            size,
            property_type: order.read_u16(data, 0x7C)?,
        })
    }

    /// Check the object type and that storages declare no size.
    pub fn validate(&self, id: u32) -> Result<()> {
        if self.object_type > STGTY_ROOT {
            return Err(Error::StorageType(self.object_type));
        }
        if self.object_type == STGTY_STORAGE && self.size != 0 {
            return Err(Error::StorageSize {
                id,
                size: self.size,
            });
        }
        Ok(())
    }

    #[inline]
    pub fn entry_type(&self) -> Option<EntryType> {
        EntryType::from_u8(self.object_type)
    }

    /// Name code units without the terminator.
    fn name_slice(&self) -> &[u16] {
        let count = (usize::from(self.name_len) / 2)
            .saturating_sub(1)
            .min(self.name_units.len());
        &self.name_units[..count]
    }

    /// The stored name, exactly as recorded.
    pub fn raw_name(&self) -> String {
        String::from_utf16_lossy(self.name_slice())
    }

    /// The display name: a leading non-printable code unit such as the
    /// `\u{5}` of `\u{5}SummaryInformation` is dropped.
    pub fn name(&self) -> String {
        let units = self.name_slice();
        match units.split_first() {
            Some((&first, rest)) if !is_printable(first) => String::from_utf16_lossy(rest),
            _ => String::from_utf16_lossy(units),
        }
    }

    #[inline]
    pub fn has_siblings(&self) -> bool {
        self.left_sibling != NOSTREAM || self.right_sibling != NOSTREAM
    }
}

/// Printable in the sense of graphic characters plus the ASCII space:
/// controls (Cc), format characters (Cf), private-use characters (Co) and
/// separators other than U+0020 are not printable.
fn is_printable(unit: u16) -> bool {
    if is_format(unit) || (0xE000..=0xF8FF).contains(&unit) {
        return false;
    }
    match char::from_u32(u32::from(unit)) {
        Some(c) => !c.is_control() && (c == ' ' || !c.is_whitespace()),
        // A leading surrogate half starts a supplementary character and is kept.
        None => true,
    }
}

/// Format characters (Cf) in the Basic Multilingual Plane.
fn is_format(unit: u16) -> bool {
    matches!(
        unit,
        0x00AD
            | 0x0600..=0x0605
            | 0x061C
            | 0x06DD
            | 0x070F
            | 0x0890..=0x0891
            | 0x08E2
            | 0x180E
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x2064
            | 0x2066..=0x206F
            | 0xFEFF
            | 0xFFF9..=0xFFFB
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfb::test_support::Record;

    fn decode(record: &Record) -> DirectoryRecord {
        DirectoryRecord::decode(&record.encode(), ByteOrder::Little, 3).unwrap()
    }

    #[test]
    fn test_root_entry_name() {
        let mut bytes = [0u8; DIRENTRY_SIZE];
        for (i, unit) in "Root Entry".encode_utf16().enumerate() {
            bytes[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
        }
        bytes[0x40..0x42].copy_from_slice(&22u16.to_le_bytes());
        let record = DirectoryRecord::decode(&bytes, ByteOrder::Little, 3).unwrap();
        assert_eq!(record.name(), "Root Entry");
        assert_eq!(record.raw_name(), "Root Entry");
    }

    #[test]
    fn test_control_prefix_is_dropped() {
        let record = decode(&Record::stream("\u{5}SummaryInformation", 0, 10));
        assert_eq!(record.name(), "SummaryInformation");
        assert_eq!(record.raw_name(), "\u{5}SummaryInformation");
    }

    #[test]
    fn test_empty_and_degenerate_names() {
        let mut bytes = Record::stream("abc", 0, 0).encode();
        bytes[0x40..0x42].copy_from_slice(&0u16.to_le_bytes());
        let record = DirectoryRecord::decode(&bytes, ByteOrder::Little, 3).unwrap();
        assert_eq!(record.name(), "");

        bytes[0x40..0x42].copy_from_slice(&1u16.to_le_bytes());
        let record = DirectoryRecord::decode(&bytes, ByteOrder::Little, 3).unwrap();
        assert_eq!(record.name(), "");
    }

    #[test]
    fn test_name_length_bound() {
        let mut bytes = Record::stream("abc", 0, 0).encode();
        bytes[0x40..0x42].copy_from_slice(&64u16.to_le_bytes());
        assert!(DirectoryRecord::decode(&bytes, ByteOrder::Little, 3).is_ok());
        bytes[0x40..0x42].copy_from_slice(&66u16.to_le_bytes());
        assert!(matches!(
            DirectoryRecord::decode(&bytes, ByteOrder::Little, 3),
            Err(Error::NameLength(66))
        ));
    }

    #[test]
    fn test_fields() {
        let record = decode(&Record::storage("Folder", 4).siblings(1, 3));
        assert_eq!(record.entry_type(), Some(EntryType::Storage));
        assert_eq!(record.left_sibling, 1);
        assert_eq!(record.right_sibling, 3);
        assert_eq!(record.child, 4);
        assert_eq!(record.color, NodeColor::Black);
        assert!(record.has_siblings());
        assert!(record.clsid.is_nil());
    }

    #[test]
    fn test_v4_reads_64_bit_size() {
        let mut bytes = Record::stream("Big", 0, 16).encode();
        bytes[0x7C..0x80].copy_from_slice(&1u32.to_le_bytes());
        let v3 = DirectoryRecord::decode(&bytes, ByteOrder::Little, 3).unwrap();
        let v4 = DirectoryRecord::decode(&bytes, ByteOrder::Little, 4).unwrap();
        assert_eq!(v3.size, 16);
        assert_eq!(v4.size, (1u64 << 32) | 16);
        assert_eq!(v3.property_type, 1);
    }

    #[test]
    fn test_big_endian_record() {
        let mut bytes = [0u8; DIRENTRY_SIZE];
        bytes[0..2].copy_from_slice(&u16::from(b'A').to_be_bytes());
        bytes[0x40..0x42].copy_from_slice(&4u16.to_be_bytes());
        bytes[0x42] = STGTY_STREAM;
        bytes[0x44..0x48].copy_from_slice(&NOSTREAM.to_be_bytes());
        bytes[0x48..0x4C].copy_from_slice(&7u32.to_be_bytes());
        bytes[0x78..0x7C].copy_from_slice(&300u32.to_be_bytes());
        let record = DirectoryRecord::decode(&bytes, ByteOrder::Big, 3).unwrap();
        assert_eq!(record.name(), "A");
        assert_eq!(record.right_sibling, 7);
        assert_eq!(record.size, 300);
    }

    #[test]
    fn test_validate() {
        let mut bad_type = decode(&Record::stream("x", 0, 0));
        bad_type.object_type = 9;
        assert!(matches!(bad_type.validate(1), Err(Error::StorageType(9))));

        let sized_storage = decode(&Record::storage("s", NOSTREAM).located(0, 12));
        assert!(matches!(
            sized_storage.validate(3),
            Err(Error::StorageSize { id: 3, size: 12 })
        ));

        let root = decode(&Record::root(1).located(4, 192));
        assert!(root.validate(0).is_ok());
    }

    #[test]
    fn test_short_record() {
        assert!(matches!(
            DirectoryRecord::decode(&[0u8; 64], ByteOrder::Little, 3),
            Err(Error::SectorSize { .. })
        ));
    }

    #[test]
    fn test_leading_format_and_private_use_units_are_dropped() {
        for (raw, shown) in [
            ("\u{200B}Hidden", "Hidden"),
            ("\u{E000}Private", "Private"),
            ("\u{FEFF}Marked", "Marked"),
            ("\u{3000}Wide", "Wide"),
            (" Spaced", " Spaced"),
            ("\u{4E2D}\u{6587}", "\u{4E2D}\u{6587}"),
        ] {
            let record = decode(&Record::stream(raw, 0, 0));
            assert_eq!(record.name(), shown, "raw name {:?}", raw);
            assert_eq!(record.raw_name(), raw);
        }
    }

    #[test]
    fn test_guid_display() {
        let guid = Guid([
            0x00, 0x09, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x46,
        ]);
        assert_eq!(guid.to_string(), "{00020900-0000-0000-C000000000000046}");
        assert!(!guid.is_nil());
    }

    #[test]
    fn test_filetime_halves() {
        let time = FileTime(0x01D1_2345_6789_ABCD);
        assert_eq!(time.high(), 0x01D1_2345);
        assert_eq!(time.low(), 0x6789_ABCD);
        assert!(!time.is_zero());
    }
}
