//! The CLI (COR20) header that marks an image as managed.

use bitflags::bitflags;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::optional::DataDirectory;
use crate::read::{u16_at, u32_at};

bitflags! {
    /// `COMIMAGE_FLAGS_*`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CorFlags: u32 {
        const IL_ONLY = 0x0000_0001;
        const REQUIRES_32BIT = 0x0000_0002;
        const IL_LIBRARY = 0x0000_0004;
        const STRONG_NAME_SIGNED = 0x0000_0008;
        const NATIVE_ENTRYPOINT = 0x0000_0010;
        const TRACK_DEBUG_DATA = 0x0001_0000;
        const PREFERS_32BIT = 0x0002_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CliHeader {
    pub cb: u32,
    pub major_runtime_version: u16,
    pub minor_runtime_version: u16,
    pub metadata: DataDirectory,
    pub flags: CorFlags,
    /// Method token of the entry point, or an RVA when
    /// [`CorFlags::NATIVE_ENTRYPOINT`] is set.
    pub entry_point_token: u32,
    pub resources: DataDirectory,
    pub strong_name_signature: DataDirectory,
}

impl CliHeader {
    pub const SIZE: usize = 0x48;

    pub(crate) fn parse(data: &[u8], offset: usize, strict: bool) -> Result<Self> {
        let header = Self {
            cb: u32_at(data, offset)?,
            major_runtime_version: u16_at(data, offset + 4)?,
            minor_runtime_version: u16_at(data, offset + 6)?,
            metadata: DataDirectory::parse(data, offset + 8)?,
            flags: CorFlags::from_bits_retain(u32_at(data, offset + 16)?),
            entry_point_token: u32_at(data, offset + 20)?,
            resources: DataDirectory::parse(data, offset + 24)?,
            strong_name_signature: DataDirectory::parse(data, offset + 32)?,
        };

        if header.cb as usize != Self::SIZE {
            if strict {
                return Err(Error::FieldMismatch {
                    field: "cb",
                    expected: Self::SIZE as u32,
                    actual: header.cb,
                });
            }
            warn!("CLI header cb is {:#x}, expected {:#x}", header.cb, Self::SIZE);
        }

        debug!(
            "CLI header: runtime {}.{}, flags {:?}",
            header.major_runtime_version, header.minor_runtime_version, header.flags
        );
        Ok(header)
    }

    /// Entry point method token, unless the image has a native entry point.
    pub fn entry_point_method(&self) -> Option<u32> {
        if self.flags.contains(CorFlags::NATIVE_ENTRYPOINT) || self.entry_point_token == 0 {
            None
        } else {
            Some(self.entry_point_token)
        }
    }
}
