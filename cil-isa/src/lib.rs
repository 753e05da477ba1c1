//! ECMA-335 CIL instruction set: opcode catalog and streaming decoder.
//!
//! The [catalog](table) maps every one- and two-byte opcode to its mnemonic,
//! description and operand kind. [`Decoder`] walks a method body's byte
//! stream and yields one [`Instruction`] per opcode, with operands kept as
//! raw bytes.
//!
//! ```
//! let code = [0x02, 0x17, 0x58, 0x2a];
//! for insn in cil_isa::decode(&code)? {
//!     println!("{insn}");
//! }
//! # Ok::<(), cil_isa::DecodeError>(())
//! ```

mod decoder;
mod instruction;
mod opcode;
mod operand;
pub mod table;

pub use decoder::{
    DEFAULT_MAX_SWITCH_TARGETS, DecodeError, DecodeErrorKind, Decoder, DecoderOptions, decode,
    decode_with,
};
pub use instruction::{Instruction, MNEMONIC_WIDTH};
pub use opcode::{OpcodeCategory, OpcodeId, TWO_BYTE_ESCAPE};
pub use operand::{OperandKind, OperandSize, SWITCH_ENTRY_SIZE, operand_byte_size};
pub use table::{
    LeadByte, OpcodeInfo, classify_lead_byte, is_valid_lead_byte, is_valid_second_byte, lookup,
    lookup_mnemonic, opcode_count, opcode_table,
};
