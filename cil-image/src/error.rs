use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File too small: {0} bytes")]
    FileTooSmall(usize),

    #[error("Invalid MS-DOS signature: {0:#06x}")]
    InvalidDosSignature(u16),

    #[error("Invalid MS-DOS stub")]
    InvalidDosStub,

    #[error("Field {field} is {actual:#x}, expected {expected:#x}")]
    FieldMismatch {
        field: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("Invalid PE signature: {0:#010x}")]
    InvalidPeSignature(u32),

    #[error("Unsupported machine: {0:#06x}")]
    UnsupportedMachine(u16),

    #[error("Optional header too small: {0:#x} bytes")]
    OptionalHeaderTooSmall(u16),

    #[error("Invalid optional header magic: {0:#06x}")]
    InvalidOptionalMagic(u16),

    #[error("Offset {0:#x} out of bounds (file size: {1:#x})")]
    OffsetOutOfBounds(usize, usize),

    #[error("RVA {0:#x} is not mapped by any section")]
    UnmappedRva(u32),

    #[error("Image has no CLI header")]
    MissingCliHeader,

    #[error("Invalid method header at RVA {0:#x}: {1}")]
    InvalidMethodHeader(u32, &'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
