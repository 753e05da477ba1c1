//! Method body headers (ECMA-335 Partition II §25.4).

use bitflags::bitflags;
use cil_isa::{Decoder, DecoderOptions};
use log::debug;

use crate::error::{Error, Result};
use crate::read::{bytes, u16_at, u32_at, u8_at};

const FORMAT_MASK: u8 = 0x3;
const TINY_FORMAT: u8 = 0x2;
const FAT_FORMAT: u8 = 0x3;
/// Fat header size in 4-byte units.
const FAT_HEADER_DWORDS: u16 = 3;
const FAT_HEADER_SIZE: usize = 12;
/// `max_stack` implied by a tiny header.
pub const TINY_MAX_STACK: u16 = 8;

bitflags! {
    /// Flags in the low 12 bits of a fat header, format bits excluded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u16 {
        /// Extra data sections follow the code.
        const MORE_SECTS = 0x08;
        /// Locals are zero-initialised on entry.
        const INIT_LOCALS = 0x10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Tiny,
    Fat,
}

/// A located method body and its code bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodBody<'a> {
    pub rva: u32,
    pub format: BodyFormat,
    pub max_stack: u16,
    pub flags: MethodFlags,
    /// Zero when the method has no locals or uses a tiny header.
    pub local_var_sig_token: u32,
    pub header_size: usize,
    code: &'a [u8],
}

impl<'a> MethodBody<'a> {
    /// Parses the header at file `offset`. `rva` is only used for reporting.
    pub(crate) fn parse(data: &'a [u8], offset: usize, rva: u32) -> Result<Self> {
        let first = u8_at(data, offset)?;
        let body = match first & FORMAT_MASK {
            TINY_FORMAT => {
                let code_size = usize::from(first >> 2);
                Self {
                    rva,
                    format: BodyFormat::Tiny,
                    max_stack: TINY_MAX_STACK,
                    flags: MethodFlags::empty(),
                    local_var_sig_token: 0,
                    header_size: 1,
                    code: bytes(data, offset + 1, code_size)?,
                }
            }
            FAT_FORMAT => {
                let flags_and_size = u16_at(data, offset)?;
                if flags_and_size >> 12 != FAT_HEADER_DWORDS {
                    return Err(Error::InvalidMethodHeader(rva, "fat header size is not 12 bytes"));
                }
                let code_size = u32_at(data, offset + 4)? as usize;
                Self {
                    rva,
                    format: BodyFormat::Fat,
                    max_stack: u16_at(data, offset + 2)?,
                    flags: MethodFlags::from_bits_retain(flags_and_size & 0x0ffc),
                    local_var_sig_token: u32_at(data, offset + 8)?,
                    header_size: FAT_HEADER_SIZE,
                    code: bytes(data, offset + FAT_HEADER_SIZE, code_size)?,
                }
            }
            _ => return Err(Error::InvalidMethodHeader(rva, "unknown header format")),
        };
        debug!(
            "Method body at RVA {rva:#x}: {:?}, {} code bytes",
            body.format,
            body.code.len()
        );
        Ok(body)
    }

    /// The IL code bytes, without the header.
    pub fn code(&self) -> &'a [u8] {
        self.code
    }

    /// Lazily decodes [`code`](Self::code).
    pub fn decoder(&self) -> Decoder<&'a [u8]> {
        Decoder::new(self.code)
    }

    pub fn decoder_with(&self, options: DecoderOptions) -> Decoder<&'a [u8]> {
        Decoder::with_options(self.code, options)
    }
}
