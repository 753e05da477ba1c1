//! Section table and RVA translation.

use crate::error::Result;
use crate::read::{array_at, u32_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    pub name: [u8; 8],
    pub virtual_size: u32,
    pub virtual_address: u32,
    pub size_of_raw_data: u32,
    pub pointer_to_raw_data: u32,
    pub characteristics: u32,
}

impl SectionHeader {
    pub const SIZE: usize = 40;

    pub(crate) fn parse(data: &[u8], offset: usize) -> Result<Self> {
        Ok(Self {
            name: array_at(data, offset)?,
            virtual_size: u32_at(data, offset + 8)?,
            virtual_address: u32_at(data, offset + 12)?,
            size_of_raw_data: u32_at(data, offset + 16)?,
            pointer_to_raw_data: u32_at(data, offset + 20)?,
            characteristics: u32_at(data, offset + 36)?,
        })
    }

    /// Reads `count` consecutive headers starting at `offset`.
    pub(crate) fn parse_table(data: &[u8], offset: usize, count: u16) -> Result<Vec<Self>> {
        (0..usize::from(count))
            .map(|i| Self::parse(data, offset + i * Self::SIZE))
            .collect()
    }

    /// Section name up to the first NUL, lossily decoded.
    pub fn name(&self) -> String {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }

    /// Whether `rva` lies in the part of this section backed by file data.
    pub fn contains_rva(&self, rva: u32) -> bool {
        let extent = if self.virtual_size == 0 {
            self.size_of_raw_data
        } else {
            self.virtual_size.min(self.size_of_raw_data)
        };
        rva >= self.virtual_address
            && u64::from(rva) < u64::from(self.virtual_address) + u64::from(extent)
    }

    /// File offset of `rva`, or `None` when [`contains_rva`](Self::contains_rva) rejects it.
    pub fn offset_of(&self, rva: u32) -> Option<usize> {
        self.contains_rva(rva)
            .then(|| (rva - self.virtual_address) as usize + self.pointer_to_raw_data as usize)
    }
}

/// Maps `rva` to a file offset. RVAs inside the headers map to themselves.
pub(crate) fn resolve_rva(
    sections: &[SectionHeader],
    size_of_headers: u32,
    rva: u32,
) -> Option<usize> {
    if rva < size_of_headers {
        return Some(rva as usize);
    }
    sections.iter().find_map(|s| s.offset_of(rva))
}
