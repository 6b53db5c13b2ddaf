//! Unsigned base-128 varints and the ZigZag signed mapping.
//!
//! Seven payload bits per byte, least significant group first, high bit set on
//! every byte except the last. A chain whose continuation pushes the accumulated
//! shift to 64 bits or beyond is rejected.

use super::io::{Reader, Writer};
use crate::error::{constants, CodecError, Result};

/// Longest valid encoding of a `u64`.
pub const MAX_VARINT_LEN: usize = 10;

/// ZigZag: 0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...
#[inline]
pub fn zigzag_encode(value: i64) -> u64 {
    ((value as u64) << 1) ^ ((value >> 63) as u64)
}

#[inline]
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes `value` occupies as a varint.
pub fn encoded_len(mut value: u64) -> usize {
    let mut len = 1;
    while value > 0x7F {
        value >>= 7;
        len += 1;
    }
    len
}

pub fn write_uvarint(w: &mut Writer<'_>, mut value: u64) -> Result<()> {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let mut i = 0;
    while value > 0x7F {
        buf[i] = (value as u8 & 0x7F) | 0x80;
        value >>= 7;
        i += 1;
    }
    buf[i] = value as u8;
    w.write_bytes(&buf[..=i])
}

pub fn read_uvarint(r: &mut Reader<'_>) -> Result<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = r.read_byte()?;
        // the tenth byte carries only bit 63
        if shift == 63 && byte & 0x7E != 0 {
            return Err(CodecError::InvalidVarint(constants::ERR_VARINT_TOO_LONG));
        }
        result |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 64 {
            return Err(CodecError::InvalidVarint(constants::ERR_VARINT_TOO_LONG));
        }
    }
}

pub fn write_svarint(w: &mut Writer<'_>, value: i64) -> Result<()> {
    write_uvarint(w, zigzag_encode(value))
}

pub fn read_svarint(r: &mut Reader<'_>) -> Result<i64> {
    read_uvarint(r).map(zigzag_decode)
}

/// Reads a varint length or count prefix and checks it against `limit` before the
/// caller allocates anything sized by it.
pub fn read_length(r: &mut Reader<'_>, what: &'static str, limit: usize) -> Result<usize> {
    let len = read_uvarint(r)?;
    if len > limit as u64 {
        return Err(CodecError::length_overflow(what, len, limit));
    }
    // limit is a usize, so len fits
    Ok(len as usize)
}
