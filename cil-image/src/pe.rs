//! PE signature and COFF file header.

use bitflags::bitflags;
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::read::{u16_at, u32_at};

/// `PE\0\0`
pub const PE_SIGNATURE: u32 = 0x0000_4550;

/// Target machine of an image (`IMAGE_FILE_MACHINE_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Machine {
    Unknown = 0x0,
    Am33 = 0x1d3,
    Amd64 = 0x8664,
    Arm = 0x1c0,
    Arm64 = 0xaa64,
    ArmNt = 0x1c4,
    Ebc = 0xebc,
    I386 = 0x14c,
    Ia64 = 0x200,
    M32R = 0x9041,
    Mips16 = 0x266,
    MipsFpu = 0x366,
    MipsFpu16 = 0x466,
    PowerPc = 0x1f0,
    PowerPcFp = 0x1f1,
    R4000 = 0x166,
    RiscV32 = 0x5032,
    RiscV64 = 0x5064,
    RiscV128 = 0x5128,
    Sh3 = 0x1a2,
    Sh3Dsp = 0x1a3,
    Sh4 = 0x1a6,
    Sh5 = 0x1a8,
    Thumb = 0x1c2,
    WceMipsV2 = 0x169,
}

impl Machine {
    pub fn from_u16(v: u16) -> Option<Self> {
        match v {
            0x0 => Some(Self::Unknown),
            0x1d3 => Some(Self::Am33),
            0x8664 => Some(Self::Amd64),
            0x1c0 => Some(Self::Arm),
            0xaa64 => Some(Self::Arm64),
            0x1c4 => Some(Self::ArmNt),
            0xebc => Some(Self::Ebc),
            0x14c => Some(Self::I386),
            0x200 => Some(Self::Ia64),
            0x9041 => Some(Self::M32R),
            0x266 => Some(Self::Mips16),
            0x366 => Some(Self::MipsFpu),
            0x466 => Some(Self::MipsFpu16),
            0x1f0 => Some(Self::PowerPc),
            0x1f1 => Some(Self::PowerPcFp),
            0x166 => Some(Self::R4000),
            0x5032 => Some(Self::RiscV32),
            0x5064 => Some(Self::RiscV64),
            0x5128 => Some(Self::RiscV128),
            0x1a2 => Some(Self::Sh3),
            0x1a3 => Some(Self::Sh3Dsp),
            0x1a6 => Some(Self::Sh4),
            0x1a8 => Some(Self::Sh5),
            0x1c2 => Some(Self::Thumb),
            0x169 => Some(Self::WceMipsV2),
            _ => None,
        }
    }
}

impl From<Machine> for u16 {
    #[inline]
    fn from(v: Machine) -> Self {
        v as u16
    }
}

bitflags! {
    /// `IMAGE_FILE_*` characteristics of the COFF header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Characteristics: u16 {
        const RELOCS_STRIPPED = 0x0001;
        const EXECUTABLE_IMAGE = 0x0002;
        const LINE_NUMS_STRIPPED = 0x0004;
        const LOCAL_SYMS_STRIPPED = 0x0008;
        const AGGRESSIVE_WS_TRIM = 0x0010;
        const LARGE_ADDRESS_AWARE = 0x0020;
        const BYTES_REVERSED_LO = 0x0080;
        const MACHINE_32BIT = 0x0100;
        const DEBUG_STRIPPED = 0x0200;
        const REMOVABLE_RUN_FROM_SWAP = 0x0400;
        const NET_RUN_FROM_SWAP = 0x0800;
        const SYSTEM = 0x1000;
        const DLL = 0x2000;
        const UP_SYSTEM_ONLY = 0x4000;
        const BYTES_REVERSED_HI = 0x8000;
    }
}

/// COFF file header that follows the PE signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Raw `Machine` field; see [`FileHeader::machine`].
    pub machine_raw: u16,
    pub number_of_sections: u16,
    pub time_date_stamp: u32,
    pub pointer_to_symbol_table: u32,
    pub number_of_symbols: u32,
    pub size_of_optional_header: u16,
    pub characteristics: Characteristics,
}

impl FileHeader {
    pub const SIZE: usize = 20;

    /// Checks the PE signature at `offset` and parses the COFF header after it.
    ///
    /// Managed images are always built for I386; strict mode rejects any
    /// other machine.
    pub fn parse(data: &[u8], offset: usize, strict: bool) -> Result<Self> {
        let signature = u32_at(data, offset)?;
        if signature != PE_SIGNATURE {
            return Err(Error::InvalidPeSignature(signature));
        }

        let at = offset + 4;
        let header = Self {
            machine_raw: u16_at(data, at)?,
            number_of_sections: u16_at(data, at + 2)?,
            time_date_stamp: u32_at(data, at + 4)?,
            pointer_to_symbol_table: u32_at(data, at + 8)?,
            number_of_symbols: u32_at(data, at + 12)?,
            size_of_optional_header: u16_at(data, at + 16)?,
            characteristics: Characteristics::from_bits_retain(u16_at(data, at + 18)?),
        };

        match header.machine() {
            Some(Machine::I386) => {}
            _ if strict => return Err(Error::UnsupportedMachine(header.machine_raw)),
            Some(machine) => debug!("Accepting machine {machine:?}"),
            None => warn!("Unknown machine {:#06x}", header.machine_raw),
        }

        debug!(
            "COFF header: {} sections, optional header {:#x} bytes",
            header.number_of_sections, header.size_of_optional_header
        );
        Ok(header)
    }

    pub fn machine(&self) -> Option<Machine> {
        Machine::from_u16(self.machine_raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn machine_roundtrip() {
        for machine in [Machine::I386, Machine::Amd64, Machine::Arm64, Machine::RiscV128] {
            assert_eq!(Machine::from_u16(machine.into()), Some(machine));
        }
        assert_eq!(Machine::from_u16(0x1234), None);
    }

    #[test]
    fn unknown_characteristics_bits_are_kept() {
        let c = Characteristics::from_bits_retain(0x0142);
        assert!(c.contains(Characteristics::EXECUTABLE_IMAGE | Characteristics::MACHINE_32BIT));
        assert_eq!(c.bits(), 0x0142);
    }
}
