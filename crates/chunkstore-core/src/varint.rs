//! Variable-length Integer Encoding (Varint)
//!
//! Unsigned LEB128 varints, byte-compatible with Go's `binary.PutUvarint`:
//! - Small numbers (0-127) use just 1 byte
//! - A full u64 uses at most 10 bytes
//! - Each byte uses 7 bits for data and 1 bit as a "continuation" flag
//!
//! ## Where Varints Show Up
//! - Record framing inside a decompressed chunk: `[metaLen][dataLen][meta][data]`
//! - The offset table at the tail of a store: one varint per chunk boundary
//!
//! Decoding is fallible. Everything we decode comes from disk, so a truncated or
//! over-long varint is reported as [`Error::InvalidVarint`] rather than a panic.
//!
//! ## Usage
//! ```ignore
//! let mut buf = BytesMut::new();
//! encode_varint_u64(&mut buf, 300);
//! let (value, read) = decode_uvarint(&buf)?;   // (300, 2)
//! ```

use bytes::{Buf, BufMut};

use crate::{Error, Result};

/// Longest encoding of a u64.
pub const MAX_VARINT_LEN64: usize = 10;

/// Encode an unsigned integer as a varint
pub fn encode_varint_u64(buf: &mut impl BufMut, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80; // Set continuation bit
        }

        buf.put_u8(byte);

        if value == 0 {
            break;
        }
    }
}

/// Number of bytes `encode_varint_u64` writes for `value`
pub fn encoded_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint from the front of `data`.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_uvarint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in data.iter().enumerate() {
        if i == MAX_VARINT_LEN64 - 1 && byte > 1 {
            return Err(Error::InvalidVarint("varint overflows u64".to_string()));
        }

        value |= ((byte & 0x7F) as u64) << shift;

        if (byte & 0x80) == 0 {
            return Ok((value, i + 1));
        }

        shift += 7;

        if i + 1 == MAX_VARINT_LEN64 {
            break;
        }
    }

    if data.len() >= MAX_VARINT_LEN64 {
        Err(Error::InvalidVarint("varint longer than 10 bytes".to_string()))
    } else {
        Err(Error::InvalidVarint("unexpected end of input".to_string()))
    }
}

/// Decode a varint from a `Buf`, advancing it past the encoded bytes
pub fn decode_varint_u64(buf: &mut impl Buf) -> Result<u64> {
    let (value, read) = decode_uvarint(buf.chunk())?;
    buf.advance(read);
    Ok(value)
}
