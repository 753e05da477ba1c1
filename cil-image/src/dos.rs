//! MS-DOS header and stub that precede the PE headers.

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::read::{bytes, u16_at, u32_at};

/// `MZ`
pub const DOS_SIGNATURE: u16 = 0x5a4d;

/// The real-mode stub emitted by standard linkers, which prints
/// "This program cannot be run in DOS mode." and exits.
pub const DOS_STUB: [u8; 64] = [
    0x0E, 0x1F, 0xBA, 0x0E, 0x00, 0xB4, 0x09, 0xCD, 0x21, 0xB8, 0x01, 0x4C, 0xCD, 0x21, 0x54, 0x68,
    0x69, 0x73, 0x20, 0x70, 0x72, 0x6F, 0x67, 0x72, 0x61, 0x6D, 0x20, 0x63, 0x61, 0x6E, 0x6E, 0x6F,
    0x74, 0x20, 0x62, 0x65, 0x20, 0x72, 0x75, 0x6E, 0x20, 0x69, 0x6E, 0x20, 0x44, 0x4F, 0x53, 0x20,
    0x6D, 0x6F, 0x64, 0x65, 0x2E, 0x0D, 0x0D, 0x0A, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Field name, offset and the value standard linkers write.
const EXPECTED_FIELDS: [(&str, usize, u16); 15] = [
    ("e_cblp", 0x02, 0x0090),
    ("e_cp", 0x04, 0x0003),
    ("e_crlc", 0x06, 0),
    ("e_cparhdr", 0x08, 0x0004),
    ("e_minalloc", 0x0a, 0),
    ("e_maxalloc", 0x0c, 0xffff),
    ("e_ss", 0x0e, 0),
    ("e_sp", 0x10, 0x00b8),
    ("e_csum", 0x12, 0),
    ("e_ip", 0x14, 0),
    ("e_cs", 0x16, 0),
    ("e_lfarlc", 0x18, 0x0040),
    ("e_ovno", 0x1a, 0),
    ("e_oemid", 0x24, 0),
    ("e_oeminfo", 0x26, 0),
];

/// The parts of `IMAGE_DOS_HEADER` that matter for locating the PE headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosHeader {
    pub e_cblp: u16,
    pub e_cp: u16,
    pub e_cparhdr: u16,
    pub e_lfarlc: u16,
    /// File offset of the `PE\0\0` signature.
    pub e_lfanew: u32,
}

impl DosHeader {
    pub const SIZE: usize = 64;

    /// Parses the header at the start of `data`.
    ///
    /// The signature is always checked. In strict mode every field a standard
    /// linker fills with a fixed value must carry that value, and the stub
    /// that follows must be the canonical one.
    pub fn parse(data: &[u8], strict: bool) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::FileTooSmall(data.len()));
        }

        let magic = u16_at(data, 0)?;
        if magic != DOS_SIGNATURE {
            return Err(Error::InvalidDosSignature(magic));
        }

        for (field, offset, expected) in EXPECTED_FIELDS {
            let actual = u16_at(data, offset)?;
            if actual == expected {
                continue;
            }
            if strict {
                return Err(Error::FieldMismatch {
                    field,
                    expected: expected.into(),
                    actual: actual.into(),
                });
            }
            warn!("DOS header field {field} is {actual:#06x}, expected {expected:#06x}");
        }

        let header = Self {
            e_cblp: u16_at(data, 0x02)?,
            e_cp: u16_at(data, 0x04)?,
            e_cparhdr: u16_at(data, 0x08)?,
            e_lfarlc: u16_at(data, 0x18)?,
            e_lfanew: u32_at(data, 0x3c)?,
        };

        if strict {
            let stub = bytes(data, Self::SIZE, DOS_STUB.len()).map_err(|_| Error::InvalidDosStub)?;
            if stub != DOS_STUB {
                return Err(Error::InvalidDosStub);
            }
        }

        debug!("DOS header: e_lfanew={:#x}", header.e_lfanew);
        Ok(header)
    }
}
