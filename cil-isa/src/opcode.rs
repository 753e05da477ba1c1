use std::fmt;

use serde::{Serialize, Serializer};

/// Lead byte that announces a two-byte opcode.
pub const TWO_BYTE_ESCAPE: u8 = 0xFE;

/// A one- or two-byte CIL opcode value.
///
/// Two ids are equal only if their first byte, second byte and length all
/// match, so `OpcodeId::single(0xFE)` and `OpcodeId::double(0xFE, 0x00)` are
/// distinct keys.
///
/// ```
/// use cil_isa::OpcodeId;
///
/// let call = OpcodeId::single(0x28);
/// assert_eq!(call.raw(), 0x28);
///
/// let ceq = OpcodeId::double(0xFE, 0x01);
/// assert_eq!(ceq.raw(), 0xFE01);
/// assert_eq!(ceq.to_string(), "fe 01");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpcodeId {
    bytes: [u8; 2],
    len: u8,
}

impl OpcodeId {
    /// A single-byte opcode.
    #[inline]
    pub const fn single(first: u8) -> Self {
        Self {
            bytes: [first, 0],
            len: 1,
        }
    }

    /// A two-byte opcode (`first` is normally [`TWO_BYTE_ESCAPE`]).
    #[inline]
    pub const fn double(first: u8, second: u8) -> Self {
        Self {
            bytes: [first, second],
            len: 2,
        }
    }

    /// First byte on the wire.
    #[inline]
    pub const fn first(&self) -> u8 {
        self.bytes[0]
    }

    /// Second byte on the wire, if this is a two-byte opcode.
    #[inline]
    pub const fn second(&self) -> Option<u8> {
        if self.len == 2 { Some(self.bytes[1]) } else { None }
    }

    /// Encoded length of the opcode itself (1 or 2).
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub const fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_two_byte(&self) -> bool {
        self.len == 2
    }

    /// Numeric value: `0x28` for `call`, `0xFE01` for `ceq`.
    #[inline]
    pub const fn raw(&self) -> u16 {
        if self.len == 2 {
            u16::from_be_bytes(self.bytes)
        } else {
            self.bytes[0] as u16
        }
    }

    /// The opcode bytes exactly as they appear in the stream.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

impl fmt::Display for OpcodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.second() {
            Some(second) => write!(f, "{:02x} {second:02x}", self.first()),
            None => write!(f, "{:02x}", self.first()),
        }
    }
}

// Serialized as the numeric value, which is unambiguous because every
// two-byte opcode starts with the escape byte.
impl Serialize for OpcodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.raw())
    }
}

impl fmt::Debug for OpcodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpcodeId({self})")
    }
}

/// Broad instruction family, as grouped by ECMA-335 Partition III.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OpcodeCategory {
    /// Base instructions (Partition III §3).
    Base,
    /// Object model instructions (Partition III §4).
    ObjectModel,
    /// Prefixes that modify the following instruction (Partition III §2).
    Prefix,
}

impl fmt::Display for OpcodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpcodeCategory::Base => "base",
            OpcodeCategory::ObjectModel => "object-model",
            OpcodeCategory::Prefix => "prefix",
        })
    }
}
