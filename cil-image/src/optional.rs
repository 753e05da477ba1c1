//! PE32 / PE32+ optional header and its data directories.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::read::{u16_at, u32_at, u64_at};

/// Smallest optional header a PE32 image may declare.
pub const MIN_PE32_SIZE: u16 = 0xe0;
/// Smallest optional header a PE32+ image may declare.
pub const MIN_PE32_PLUS_SIZE: u16 = 0xf0;

/// Index of the CLI header in the data directory table.
pub const CLI_HEADER_DIRECTORY: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum OptionalMagic {
    Pe32 = 0x10b,
    Pe32Plus = 0x20b,
}

impl OptionalMagic {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x10b => Some(Self::Pe32),
            0x20b => Some(Self::Pe32Plus),
            _ => None,
        }
    }

    fn min_size(self) -> u16 {
        match self {
            Self::Pe32 => MIN_PE32_SIZE,
            Self::Pe32Plus => MIN_PE32_PLUS_SIZE,
        }
    }

    /// Offset of `NumberOfRvaAndSizes`; the directories follow it.
    fn rva_count_offset(self) -> usize {
        match self {
            Self::Pe32 => 92,
            Self::Pe32Plus => 108,
        }
    }
}

/// An RVA and size pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDirectory {
    pub virtual_address: u32,
    pub size: u32,
}

impl DataDirectory {
    pub const SIZE: usize = 8;

    pub(crate) fn parse(data: &[u8], offset: usize) -> Result<Self> {
        Ok(Self {
            virtual_address: u32_at(data, offset)?,
            size: u32_at(data, offset + 4)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.virtual_address == 0 || self.size == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionalHeader {
    pub magic: OptionalMagic,
    pub address_of_entry_point: u32,
    /// Widened to 64 bits for PE32.
    pub image_base: u64,
    pub section_alignment: u32,
    pub file_alignment: u32,
    pub size_of_image: u32,
    pub size_of_headers: u32,
    pub subsystem: u16,
    pub data_directories: Vec<DataDirectory>,
}

impl OptionalHeader {
    /// Parses an optional header of `size` bytes starting at `offset`.
    pub fn parse(data: &[u8], offset: usize, size: u16) -> Result<Self> {
        if size < MIN_PE32_SIZE {
            return Err(Error::OptionalHeaderTooSmall(size));
        }
        let raw_magic = u16_at(data, offset)?;
        let magic =
            OptionalMagic::from_u16(raw_magic).ok_or(Error::InvalidOptionalMagic(raw_magic))?;
        if size < magic.min_size() {
            return Err(Error::OptionalHeaderTooSmall(size));
        }

        let image_base = match magic {
            OptionalMagic::Pe32 => u32_at(data, offset + 28)?.into(),
            OptionalMagic::Pe32Plus => u64_at(data, offset + 24)?,
        };

        let count_at = magic.rva_count_offset();
        let declared = u32_at(data, offset + count_at)? as usize;
        let directories_at = count_at + 4;
        let room = (usize::from(size) - directories_at) / DataDirectory::SIZE;
        if declared > room {
            warn!("{declared} data directories declared, only {room} fit in the optional header");
        }
        let data_directories = (0..declared.min(room))
            .map(|i| DataDirectory::parse(data, offset + directories_at + i * DataDirectory::SIZE))
            .collect::<Result<Vec<_>>>()?;

        let header = Self {
            magic,
            address_of_entry_point: u32_at(data, offset + 16)?,
            image_base,
            section_alignment: u32_at(data, offset + 32)?,
            file_alignment: u32_at(data, offset + 36)?,
            size_of_image: u32_at(data, offset + 56)?,
            size_of_headers: u32_at(data, offset + 60)?,
            subsystem: u16_at(data, offset + 68)?,
            data_directories,
        };
        debug!(
            "Optional header: {:?}, image base {:#x}, {} data directories",
            header.magic,
            header.image_base,
            header.data_directories.len()
        );
        Ok(header)
    }

    /// The data directory at `index`, if the image declares that many.
    pub fn data_directory(&self, index: usize) -> Option<DataDirectory> {
        self.data_directories.get(index).copied()
    }
}
