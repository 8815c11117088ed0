//! Error types for v0 message serialization.

use tachyon_short_vec::ShortVecError;

/// Errors that can occur when serializing or deserializing v0 messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Input buffer is too small during deserialization.
    BufferTooSmall,
    /// Instruction data is too large (> 65535 bytes).
    InstructionDataTooLarge,
    /// A compact length prefix is malformed.
    InvalidCompactLength,
    /// Instruction account index is out of bounds of the combined
    /// address list.
    InvalidInstructionAccountIndex,
    /// Program ID index is out of bounds of the static address list, or
    /// names the fee payer.
    InvalidProgramIdIndex,
    /// The first byte describes an unprefixed legacy message.
    LegacyNotSupported,
    /// Combined static and looked-up addresses exceed 256.
    TooManyAccountKeys,
    /// Unexpected trailing data after the message.
    TrailingData,
    /// The version prefix carries an unknown version number.
    UnsupportedVersion(u8),
}

impl std::fmt::Display for MessageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::InstructionDataTooLarge => {
                write!(f, "instruction data too large (max 65535 bytes)")
            }
            Self::InvalidCompactLength => write!(f, "malformed compact length prefix"),
            Self::InvalidInstructionAccountIndex => {
                write!(f, "instruction account index out of bounds")
            }
            Self::InvalidProgramIdIndex => {
                write!(f, "program ID index out of bounds or is fee payer")
            }
            Self::LegacyNotSupported => write!(f, "legacy messages are not supported"),
            Self::TooManyAccountKeys => write!(f, "too many account addresses (max 256)"),
            Self::TrailingData => write!(f, "unexpected trailing data"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported message version {version}")
            }
        }
    }
}

impl std::error::Error for MessageError {}

impl From<ShortVecError> for MessageError {
    fn from(err: ShortVecError) -> Self {
        match err {
            ShortVecError::TruncatedInput => Self::BufferTooSmall,
            ShortVecError::InvalidEncoding => Self::InvalidCompactLength,
        }
    }
}
