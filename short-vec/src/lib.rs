//! Compact length encoding for wire formats.
//!
//! Lengths are serialized as up to three bytes of seven-bit little-endian
//! groups. The high bit of each byte marks a continuation. Since the
//! largest encodable value is `u16::MAX`, the third byte carries only the
//! top two bits and must never have its continuation bit set.

use std::fmt;

/// Maximum number of bytes a length can occupy on the wire.
pub const MAX_ENCODED_LENGTH: usize = 3;

/// Error decoding a compact length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortVecError {
    /// Input ended before the encoding terminated.
    TruncatedInput,
    /// The encoding violates the three-byte canonical form.
    InvalidEncoding,
}

impl fmt::Display for ShortVecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TruncatedInput => write!(f, "compact length prefix is truncated"),
            Self::InvalidEncoding => write!(f, "compact length prefix is malformed"),
        }
    }
}

impl std::error::Error for ShortVecError {}

/// Encodes `len` as a compact length prefix.
///
/// Values above `u16::MAX` are not representable on the wire; callers
/// bound their collections well below that.
pub fn encode_length(len: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_ENCODED_LENGTH);
    let mut rem = len;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            return out;
        }
        byte |= 0x80;
        out.push(byte);
    }
}

/// Decodes a compact length prefix from the front of `bytes`.
///
/// Returns the decoded length and the number of prefix bytes consumed.
/// Bytes beyond the terminating prefix byte are ignored.
pub fn decode_length(bytes: &[u8]) -> Result<(usize, usize), ShortVecError> {
    let mut value = 0usize;
    for (nth, byte) in bytes.iter().take(MAX_ENCODED_LENGTH).enumerate() {
        if nth == MAX_ENCODED_LENGTH - 1 && *byte > 0x03 {
            // The third byte may only carry the top two bits of a u16.
            return Err(ShortVecError::InvalidEncoding);
        }
        value |= ((byte & 0x7f) as usize) << (nth * 7);
        if byte & 0x80 == 0 {
            return Ok((value, nth + 1));
        }
    }
    if bytes.len() < MAX_ENCODED_LENGTH {
        Err(ShortVecError::TruncatedInput)
    } else {
        Err(ShortVecError::InvalidEncoding)
    }
}
