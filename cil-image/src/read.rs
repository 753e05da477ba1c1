//! Bounds-checked little-endian field access.

use crate::error::{Error, Result};

pub(crate) fn bytes(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or(Error::OffsetOutOfBounds(offset, data.len()))
}

pub(crate) fn array_at<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    let mut out = [0; N];
    out.copy_from_slice(bytes(data, offset, N)?);
    Ok(out)
}

pub(crate) fn u8_at(data: &[u8], offset: usize) -> Result<u8> {
    data.get(offset)
        .copied()
        .ok_or(Error::OffsetOutOfBounds(offset, data.len()))
}

pub(crate) fn u16_at(data: &[u8], offset: usize) -> Result<u16> {
    array_at(data, offset).map(u16::from_le_bytes)
}

pub(crate) fn u32_at(data: &[u8], offset: usize) -> Result<u32> {
    array_at(data, offset).map(u32::from_le_bytes)
}

pub(crate) fn u64_at(data: &[u8], offset: usize) -> Result<u64> {
    array_at(data, offset).map(u64::from_le_bytes)
}
