use std::io::{self, Read};
use std::iter::FusedIterator;

use crate::instruction::Instruction;
use crate::opcode::{OpcodeId, TWO_BYTE_ESCAPE};
use crate::operand::{OperandKind, OperandSize, SWITCH_ENTRY_SIZE};
use crate::table::{self, OpcodeInfo};

/// Default ceiling on the number of `switch` targets accepted by a decoder.
/// Not a limit of the instruction set.
pub const DEFAULT_MAX_SWITCH_TARGETS: u32 = 32768;

/// Largest slice of a `switch` table read in one go.
const SWITCH_READ_CHUNK: usize = 4096;

/// Decoder configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderOptions {
    /// Largest `switch` target count accepted before decoding fails with
    /// [`DecodeError::OperandCountTooLarge`].
    pub max_switch_targets: u32,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            max_switch_targets: DEFAULT_MAX_SWITCH_TARGETS,
        }
    }
}

/// Errors from [`Decoder`] and [`decode`].
///
/// Every variant carries the offset of the instruction that could not be
/// decoded. All of them end the decode pass.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The opcode is not in the catalog.
    #[error("unknown opcode {opcode} at IL_{offset:04x}")]
    UnknownOpcode { offset: usize, opcode: OpcodeId },
    /// The stream ended between the escape byte and the second opcode byte.
    #[error("opcode escape {lead:#04x} without a second byte at IL_{offset:04x}")]
    TruncatedOpcode { offset: usize, lead: u8 },
    /// The stream ended inside an operand.
    #[error(
        "`{mnemonic}` at IL_{offset:04x} needs {expected} operand bytes, but the stream ended after {available}"
    )]
    TruncatedOperand {
        offset: usize,
        opcode: OpcodeId,
        mnemonic: &'static str,
        expected: usize,
        available: usize,
    },
    /// The stream ended inside the 4-byte `switch` target count.
    #[error("`{mnemonic}` at IL_{offset:04x}: stream ended inside the target count ({available} of 4 bytes)")]
    TruncatedDynamicCount {
        offset: usize,
        opcode: OpcodeId,
        mnemonic: &'static str,
        available: usize,
    },
    /// A `switch` declares more targets than the configured ceiling.
    #[error("`{mnemonic}` at IL_{offset:04x} declares {count} targets (limit {limit})")]
    OperandCountTooLarge {
        offset: usize,
        opcode: OpcodeId,
        mnemonic: &'static str,
        count: u32,
        limit: u32,
    },
    /// The underlying reader failed for a reason other than end of stream.
    #[error("read failed at IL_{offset:04x}: {source}")]
    Io {
        offset: usize,
        #[source]
        source: io::Error,
    },
}

/// Coarse classification of a [`DecodeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    UnrecognizedOpcode,
    /// Input ended mid-instruction: inside the opcode, a fixed operand, the
    /// `switch` count or the `switch` table.
    TruncatedStream,
    OperandCountExceedsSafetyLimit,
    Io,
}

impl DecodeError {
    pub fn kind(&self) -> DecodeErrorKind {
        match self {
            DecodeError::UnknownOpcode { .. } => DecodeErrorKind::UnrecognizedOpcode,
            DecodeError::TruncatedOpcode { .. }
            | DecodeError::TruncatedOperand { .. }
            | DecodeError::TruncatedDynamicCount { .. } => DecodeErrorKind::TruncatedStream,
            DecodeError::OperandCountTooLarge { .. } => {
                DecodeErrorKind::OperandCountExceedsSafetyLimit
            }
            DecodeError::Io { .. } => DecodeErrorKind::Io,
        }
    }

    /// Offset of the instruction being decoded when the error was detected.
    pub fn offset(&self) -> usize {
        match *self {
            DecodeError::UnknownOpcode { offset, .. }
            | DecodeError::TruncatedOpcode { offset, .. }
            | DecodeError::TruncatedOperand { offset, .. }
            | DecodeError::TruncatedDynamicCount { offset, .. }
            | DecodeError::OperandCountTooLarge { offset, .. }
            | DecodeError::Io { offset, .. } => offset,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Ready,
    Done,
    Failed,
}

/// Streaming CIL instruction decoder.
///
/// Pulls one instruction at a time from a forward-only reader positioned at
/// the first opcode of a method body. The stream may only end between
/// instructions; ending anywhere else is an error. After the stream ends or
/// an error is returned the decoder yields nothing more, and decoding the
/// same bytes again needs a fresh decoder over a fresh reader.
///
/// The decoder reuses one scratch buffer for every operand. It grows with
/// the `switch` table bytes actually read, never past the configured
/// ceiling. Decoding goes through `&mut self`, so an instance is only ever
/// driven by one caller at a time.
///
/// ```
/// use cil_isa::Decoder;
///
/// let code: &[u8] = &[0x02, 0x28, 0x3a, 0x00, 0x00, 0x0a, 0x2a];
/// let mnemonics: Vec<_> = Decoder::new(code)
///     .map(|insn| insn.map(|i| i.mnemonic()))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(mnemonics, ["ldarg.0", "call", "ret"]);
/// # Ok::<(), cil_isa::DecodeError>(())
/// ```
pub struct Decoder<R> {
    reader: R,
    offset: usize,
    max_switch_targets: u32,
    scratch: Vec<u8>,
    state: State,
}

impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecoderOptions::default())
    }

    pub fn with_options(reader: R, options: DecoderOptions) -> Self {
        Self {
            reader,
            offset: 0,
            max_switch_targets: options.max_switch_targets,
            scratch: vec![0u8; OperandKind::MAX_FIXED_SIZE],
            state: State::Ready,
        }
    }

    /// Offset of the next instruction to be decoded.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True once a decode error has ended this pass.
    #[inline]
    pub fn has_failed(&self) -> bool {
        self.state == State::Failed
    }

    /// Give back the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Decode the next instruction.
    ///
    /// Returns `Ok(None)` at a clean end of stream. Once an error has been
    /// returned every further call returns `Ok(None)`; check
    /// [`has_failed`](Self::has_failed) to tell the two apart.
    pub fn next_instruction(&mut self) -> Result<Option<Instruction>, DecodeError> {
        if self.state != State::Ready {
            return Ok(None);
        }
        match self.decode_one() {
            Ok(Some(insn)) => {
                log::trace!("{insn}");
                self.offset = insn.end();
                Ok(Some(insn))
            }
            Ok(None) => {
                self.state = State::Done;
                Ok(None)
            }
            Err(err) => {
                log::debug!("decode pass stopped: {err}");
                self.state = State::Failed;
                Err(err)
            }
        }
    }

    fn decode_one(&mut self) -> Result<Option<Instruction>, DecodeError> {
        let start = self.offset;
        let io_err = |source| DecodeError::Io {
            offset: start,
            source,
        };

        let mut lead = [0u8; 1];
        if read_full(&mut self.reader, &mut lead).map_err(io_err)? == 0 {
            return Ok(None);
        }

        let id = if lead[0] == TWO_BYTE_ESCAPE {
            let mut trail = [0u8; 1];
            if read_full(&mut self.reader, &mut trail).map_err(io_err)? == 0 {
                return Err(DecodeError::TruncatedOpcode {
                    offset: start,
                    lead: lead[0],
                });
            }
            OpcodeId::double(lead[0], trail[0])
        } else {
            OpcodeId::single(lead[0])
        };

        let info = table::lookup(id).ok_or(DecodeError::UnknownOpcode {
            offset: start,
            opcode: id,
        })?;

        let operand_len = match info.operand_kind().size() {
            OperandSize::Fixed(len) => self.read_fixed(start, info, len)?,
            OperandSize::Dynamic => self.read_switch(start, info)?,
        };

        Ok(Some(Instruction::new(
            start,
            info,
            &self.scratch[..operand_len],
        )))
    }

    fn read_fixed(
        &mut self,
        start: usize,
        info: &'static OpcodeInfo,
        len: usize,
    ) -> Result<usize, DecodeError> {
        let got = read_full(&mut self.reader, &mut self.scratch[..len])
            .map_err(|source| DecodeError::Io {
                offset: start,
                source,
            })?;
        if got != len {
            return Err(DecodeError::TruncatedOperand {
                offset: start,
                opcode: info.id(),
                mnemonic: info.mnemonic(),
                expected: len,
                available: got,
            });
        }
        Ok(len)
    }

    /// Reads the target count and the table behind it into the scratch
    /// buffer, returning the total operand length (count included).
    fn read_switch(&mut self, start: usize, info: &'static OpcodeInfo) -> Result<usize, DecodeError> {
        let io_err = |source| DecodeError::Io {
            offset: start,
            source,
        };

        let got = read_full(&mut self.reader, &mut self.scratch[..SWITCH_ENTRY_SIZE])
            .map_err(io_err)?;
        if got != SWITCH_ENTRY_SIZE {
            return Err(DecodeError::TruncatedDynamicCount {
                offset: start,
                opcode: info.id(),
                mnemonic: info.mnemonic(),
                available: got,
            });
        }

        let mut count_bytes = [0u8; SWITCH_ENTRY_SIZE];
        count_bytes.copy_from_slice(&self.scratch[..SWITCH_ENTRY_SIZE]);
        let count = u32::from_le_bytes(count_bytes);
        if count > self.max_switch_targets {
            return Err(DecodeError::OperandCountTooLarge {
                offset: start,
                opcode: info.id(),
                mnemonic: info.mnemonic(),
                count,
                limit: self.max_switch_targets,
            });
        }

        let Some(end) = (count as usize)
            .checked_mul(SWITCH_ENTRY_SIZE)
            .and_then(|table_len| table_len.checked_add(SWITCH_ENTRY_SIZE))
        else {
            return Err(DecodeError::OperandCountTooLarge {
                offset: start,
                opcode: info.id(),
                mnemonic: info.mnemonic(),
                count,
                limit: ((usize::MAX - SWITCH_ENTRY_SIZE) / SWITCH_ENTRY_SIZE) as u32,
            });
        };

        // Chunked: the buffer never outgrows the bytes delivered.
        let mut filled = SWITCH_ENTRY_SIZE;
        while filled < end {
            let next = end.min(filled + SWITCH_READ_CHUNK);
            if self.scratch.len() < next {
                self.scratch.resize(next, 0);
            }
            filled += read_full(&mut self.reader, &mut self.scratch[filled..next])
                .map_err(io_err)?;
            if filled < next {
                return Err(DecodeError::TruncatedOperand {
                    offset: start,
                    opcode: info.id(),
                    mnemonic: info.mnemonic(),
                    expected: end,
                    available: filled,
                });
            }
        }
        Ok(end)
    }
}

impl<R: Read> Iterator for Decoder<R> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_instruction().transpose()
    }
}

impl<R: Read> FusedIterator for Decoder<R> {}

/// Read until `buf` is full or the reader is exhausted, returning how many
/// bytes were read. Unlike `read_exact`, a short read is not an error here;
/// the caller decides what a short read means.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Decode a complete instruction stream held in memory.
///
/// Returns every instruction in order, or the first error. There is no
/// partial result: offsets after a bad instruction cannot be trusted.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    decode_with(code, DecoderOptions::default())
}

/// [`decode`] with explicit options.
pub fn decode_with(code: &[u8], options: DecoderOptions) -> Result<Vec<Instruction>, DecodeError> {
    Decoder::with_options(code, options).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hands out at most one byte per `read` call and injects interrupts.
    struct Trickle<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::ErrorKind::Interrupted.into());
            }
            match (self.data.split_first(), buf.first_mut()) {
                (Some((&b, rest)), Some(slot)) => {
                    *slot = b;
                    self.data = rest;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("device unplugged"))
        }
    }

    #[test]
    fn read_full_survives_short_reads_and_interrupts() {
        let mut reader = Trickle {
            data: &[1, 2, 3],
            interrupt: false,
        };
        let mut buf = [0u8; 4];
        assert_eq!(read_full(&mut reader, &mut buf).unwrap(), 3);
        assert_eq!(buf, [1, 2, 3, 0]);
    }

    #[test]
    fn trickling_reader_decodes_like_a_slice() {
        let code = [0x20, 0x78, 0x56, 0x34, 0x12, 0xFE, 0x01, 0x2A];
        let reader = Trickle {
            data: &code,
            interrupt: false,
        };
        let from_reader: Vec<_> = Decoder::new(reader).collect::<Result<_, _>>().unwrap();
        assert_eq!(from_reader, decode(&code).unwrap());
    }

    #[test]
    fn io_errors_are_reported_with_offset() {
        let err = Decoder::new(Broken).next().unwrap().unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::Io);
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn scratch_covers_fixed_operands_with_tiny_ceiling() {
        let options = DecoderOptions {
            max_switch_targets: 0,
        };
        let decoder = Decoder::with_options(&[] as &[u8], options);
        assert!(decoder.scratch.len() >= OperandKind::MAX_FIXED_SIZE);
    }

    #[test]
    fn huge_ceiling_does_not_allocate_up_front() {
        let options = DecoderOptions {
            max_switch_targets: u32::MAX,
        };
        let code = [0x45, 0x02, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0];
        let mut decoder = Decoder::with_options(&code[..], options);
        assert_eq!(decoder.scratch.len(), OperandKind::MAX_FIXED_SIZE);
        let insn = decoder.next().unwrap().unwrap();
        assert_eq!(insn.len(), 13);
        assert_eq!(decoder.scratch.len(), 12);
    }

    #[test]
    fn oversized_count_without_table_stays_small() {
        let options = DecoderOptions {
            max_switch_targets: u32::MAX,
        };
        let code = [0x45, 0xff, 0xff, 0xff, 0xff];
        let mut decoder = Decoder::with_options(&code[..], options);
        let err = decoder.next().unwrap().unwrap_err();
        assert!(
            matches!(
                err,
                DecodeError::TruncatedOperand {
                    offset: 0,
                    available: 4,
                    ..
                }
            ),
            "got {err}"
        );
        assert!(decoder.scratch.len() <= SWITCH_ENTRY_SIZE + SWITCH_READ_CHUNK);
    }

    #[test]
    fn long_table_is_read_across_chunks() {
        let count = (SWITCH_READ_CHUNK / SWITCH_ENTRY_SIZE) * 2 + 3;
        let mut code = vec![0x45];
        code.extend_from_slice(&(count as u32).to_le_bytes());
        code.extend((0..count * SWITCH_ENTRY_SIZE).map(|i| i as u8));
        let insns = decode(&code).unwrap();
        assert_eq!(insns.len(), 1);
        assert_eq!(insns[0].operand(), &code[1..]);

        code.pop();
        let err = decode(&code).unwrap_err();
        assert!(
            matches!(err, DecodeError::TruncatedOperand { expected, available, .. }
                if expected == count * 4 + 4 && available == expected - 1),
            "got {err}"
        );
    }
}
