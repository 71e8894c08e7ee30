//! Chunk checksums
//!
//! CRC-32C (Castagnoli) with a masking transform applied on top. Storing
//! the raw CRC of data that embeds other CRCs makes accidental matches more
//! likely, so the stored value is rotated and offset by a constant.

const MASK_DELTA: u32 = 0xa282_ead8;

/// Masked checksum of `data`, the value stored in chunk headers.
pub fn value(data: &[u8]) -> u32 {
    mask(crc32c::crc32c(data))
}

/// Masked checksum of several slices, as if they were concatenated.
pub fn value_of(parts: &[&[u8]]) -> u32 {
    let crc = parts
        .iter()
        .fold(0, |crc, part| crc32c::crc32c_append(crc, part));
    mask(crc)
}

pub fn mask(crc: u32) -> u32 {
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

pub fn unmask(masked: u32) -> u32 {
    masked.wrapping_sub(MASK_DELTA).rotate_left(15)
}
