use std::fmt;

use serde::Serialize;

use crate::opcode::{OpcodeCategory, OpcodeId};
use crate::operand::OperandKind;
use crate::table::OpcodeInfo;

/// Column width of the mnemonic in listings.
pub const MNEMONIC_WIDTH: usize = 12;

/// One decoded instruction.
///
/// `operand` holds the operand bytes exactly as they appeared in the stream.
/// Nothing is byte-swapped or resolved. For `switch` that is the 4-byte
/// target count followed by the targets, so `len()` always equals
/// `opcode().len() + operand().len()`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Instruction {
    offset: usize,
    #[serde(flatten)]
    info: &'static OpcodeInfo,
    length: usize,
    #[serde(serialize_with = "serialize_hex")]
    operand: Box<[u8]>,
}

impl Instruction {
    pub(crate) fn new(offset: usize, info: &'static OpcodeInfo, operand: &[u8]) -> Self {
        Self {
            offset,
            info,
            length: info.opcode_len() + operand.len(),
            operand: operand.into(),
        }
    }

    /// Byte offset of the first opcode byte within the decoded stream.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn opcode(&self) -> OpcodeId {
        self.info.id()
    }

    #[inline]
    pub fn mnemonic(&self) -> &'static str {
        self.info.mnemonic()
    }

    #[inline]
    pub fn description(&self) -> &'static str {
        self.info.description()
    }

    #[inline]
    pub fn category(&self) -> OpcodeCategory {
        self.info.category()
    }

    #[inline]
    pub fn operand_kind(&self) -> OperandKind {
        self.info.operand_kind()
    }

    /// Catalog entry this instruction was decoded from.
    #[inline]
    pub fn info(&self) -> &'static OpcodeInfo {
        self.info
    }

    /// Total encoded length: opcode bytes plus operand bytes.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.length
    }

    /// Raw operand bytes (possibly empty).
    #[inline]
    pub fn operand(&self) -> &[u8] {
        &self.operand
    }

    /// Offset of the instruction that follows this one.
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Renders the classic raw listing line:
/// `IL_0003 call        3a 00 00 0a`.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IL_{:04x} {:<width$}",
            self.offset,
            self.mnemonic(),
            width = MNEMONIC_WIDTH
        )?;
        for (i, byte) in self.operand.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

fn serialize_hex<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    let hex: Vec<String> = bytes.iter().map(|b| format!("{b:02x}")).collect();
    serializer.serialize_str(&hex.join(" "))
}
