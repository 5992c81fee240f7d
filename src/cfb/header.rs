//! Compound file header decoding and validation.
//!
//! The header is a fixed 512-byte structure at offset zero. It is always
//! little-endian; the byte order it declares applies to everything after it.

use super::consts::*;
use crate::common::{ByteOrder, Error, FormatCheck, Result};
use zerocopy::{FromBytes, LE, U16, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw header structure (512 bytes) as laid out on disk.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawHeader {
    signature: [u8; 8],
    clsid: [u8; 16],
    minor_version: U16<LE>,
    major_version: U16<LE>,
    byte_order: U16<LE>,
    sector_shift: U16<LE>,
    mini_sector_shift: U16<LE>,
    _reserved: [u8; 6],
    num_dir_sectors: U32<LE>,
    num_fat_sectors: U32<LE>,
    first_dir_sector: U32<LE>,
    transaction_signature: U32<LE>,
    mini_stream_cutoff: U32<LE>,
    first_minifat_sector: U32<LE>,
    num_minifat_sectors: U32<LE>,
    first_difat_sector: U32<LE>,
    num_difat_sectors: U32<LE>,
    fat_sectors: [U32<LE>; HEADER_FAT_IDS],
}

/// Decoded compound file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub signature: [u8; 8],
    pub clsid: [u8; 16],
    pub minor_version: u16,
    pub major_version: u16,
    pub byte_order_mark: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub num_dir_sectors: u32,
    pub num_fat_sectors: u32,
    pub first_dir_sector: u32,
    pub transaction_signature: u32,
    pub mini_stream_cutoff: u32,
    pub first_minifat_sector: u32,
    pub num_minifat_sectors: u32,
    pub first_difat_sector: u32,
    pub num_difat_sectors: u32,
    /// Inline FAT sector ids; unused slots hold `FREESECT`
    pub fat_sectors: [u32; HEADER_FAT_IDS],
}

impl Header {
    /// Decode the header fields without validating them.
    ///
    /// Only the first 512 bytes of `data` are looked at.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let bytes = data.get(..HEADER_SIZE).ok_or(Error::SectorSize {
            expected: HEADER_SIZE,
            actual: data.len(),
        })?;
        let raw = RawHeader::read_from_bytes(bytes).map_err(|_| Error::SectorSize {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        })?;

        Ok(Header {
            signature: raw.signature,
            clsid: raw.clsid,
            minor_version: raw.minor_version.get(),
            major_version: raw.major_version.get(),
            byte_order_mark: raw.byte_order.get(),
            sector_shift: raw.sector_shift.get(),
            mini_sector_shift: raw.mini_sector_shift.get(),
            num_dir_sectors: raw.num_dir_sectors.get(),
            num_fat_sectors: raw.num_fat_sectors.get(),
            first_dir_sector: raw.first_dir_sector.get(),
            transaction_signature: raw.transaction_signature.get(),
            mini_stream_cutoff: raw.mini_stream_cutoff.get(),
            first_minifat_sector: raw.first_minifat_sector.get(),
            num_minifat_sectors: raw.num_minifat_sectors.get(),
            first_difat_sector: raw.first_difat_sector.get(),
            num_difat_sectors: raw.num_difat_sectors.get(),
            fat_sectors: raw.fat_sectors.map(|id| id.get()),
        })
    }

    /// Decode and validate a header.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = Self::decode(data)?;
        header.validate()?;
        Ok(header)
    }

    /// Run every header check in order, stopping at the first failure.
    pub fn validate(&self) -> Result<()> {
        self.check_signature()?;
        self.check_clsid()?;
        self.check_version()?;
        self.check_sector_shift()?;
        self.check_mini_sector_shift()?;
        self.check_mini_stream_cutoff()?;
        Ok(())
    }

    pub fn check_signature(&self) -> Result<()> {
        if &self.signature != MAGIC {
            return Err(FormatCheck::Signature.into());
        }
        Ok(())
    }

    pub fn check_clsid(&self) -> Result<()> {
        if self.clsid.iter().any(|&b| b != 0) {
            return Err(FormatCheck::Clsid.into());
        }
        Ok(())
    }

    pub fn check_version(&self) -> Result<()> {
        if !matches!(self.major_version, 3 | 4) || self.minor_version != MINOR_VERSION {
            return Err(FormatCheck::Version.into());
        }
        Ok(())
    }

    pub fn check_sector_shift(&self) -> Result<()> {
        let expected = match self.major_version {
            3 => SECTOR_SHIFT_V3,
            4 => SECTOR_SHIFT_V4,
            _ => return Err(FormatCheck::Version.into()),
        };
        if self.sector_shift != expected {
            return Err(FormatCheck::SectorShift.into());
        }
        Ok(())
    }

    pub fn check_mini_sector_shift(&self) -> Result<()> {
        if self.mini_sector_shift != MINI_SECTOR_SHIFT {
            return Err(FormatCheck::MiniSectorShift.into());
        }
        Ok(())
    }

    pub fn check_mini_stream_cutoff(&self) -> Result<()> {
        if self.mini_stream_cutoff != MINI_STREAM_CUTOFF {
            return Err(FormatCheck::MiniStreamCutoff.into());
        }
        Ok(())
    }

    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        ByteOrder::from_mark(self.byte_order_mark)
    }

    /// Regular sector size in bytes (`1 << sector_shift`).
    ///
    /// A shift too wide for `usize`, possible on a header from
    /// [`Header::decode`], fails with [`FormatCheck::SectorShift`].
    #[inline]
    pub fn sector_size(&self) -> Result<usize> {
        shifted(self.sector_shift).ok_or(Error::Format(FormatCheck::SectorShift))
    }

    /// Mini sector size in bytes (`1 << mini_sector_shift`).
    #[inline]
    pub fn mini_sector_size(&self) -> Result<usize> {
        shifted(self.mini_sector_shift).ok_or(Error::Format(FormatCheck::MiniSectorShift))
    }

    /// Bytes occupied by the header before sector 0.
    ///
    /// Version 4 pads the header out to a full 4096-byte sector.
    #[inline]
    pub fn header_sector_len(&self) -> Result<usize> {
        Ok(self.sector_size()?.max(HEADER_SIZE))
    }

    /// Whether the container declares a mini FAT.
    #[inline]
    pub fn has_minifat(&self) -> bool {
        self.num_minifat_sectors > 0
    }

    /// The inline FAT sector ids up to the first end-of-chain marker.
    pub fn inline_fat_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.fat_sectors
            .iter()
            .copied()
            .take_while(|&id| id != ENDOFCHAIN)
    }
}

fn shifted(shift: u16) -> Option<usize> {
    1usize.checked_shl(u32::from(shift))
}

/// Check if a buffer starts like a compound file by checking magic bytes
pub fn is_cfb_file(data: &[u8]) -> bool {
    data.len() >= HEADER_SIZE && &data[0..8] == MAGIC
}
