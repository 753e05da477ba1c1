#![allow(dead_code)]

use cil_isa::*;

/// The method body used throughout the decoder tests: a small counting loop.
pub const SAMPLE_METHOD: [u8; 30] = [
    0x02, 0x4a, 0x14, 0x28, 0x3a, 0x00, 0x00, 0x0a, 0x14, 0x28, 0x10, 0x00, 0x00, 0x0a, 0x00,
    0x00, 0x06, 0x17, 0x58, 0x0a, 0x06, 0x1f, 0x0a, 0xfe, 0x04, 0x0b, 0x07, 0x2d, 0xdb, 0x2a,
];

/// Check the layout invariants every successful decode must satisfy.
pub fn assert_contiguous(instructions: &[Instruction], total_len: usize) {
    let mut expected_offset = 0;
    for insn in instructions {
        assert_eq!(
            insn.offset(),
            expected_offset,
            "{insn} does not start where the previous instruction ended"
        );
        assert_eq!(
            insn.len(),
            insn.opcode().len() + insn.operand().len(),
            "{insn} length disagrees with its parts"
        );
        expected_offset += insn.len();
    }
    assert_eq!(expected_offset, total_len, "lengths do not cover the input");
}

/// A `switch` instruction with the given little-endian targets.
pub fn switch_bytes(targets: &[i32]) -> Vec<u8> {
    let mut bytes = vec![0x45];
    bytes.extend_from_slice(&(targets.len() as u32).to_le_bytes());
    for t in targets {
        bytes.extend_from_slice(&t.to_le_bytes());
    }
    bytes
}
