//! Message version dispatch.
//!
//! The first byte of a serialized message decides its format. Legacy
//! messages start with the raw header, whose leading byte (the required
//! signature count) never has its top bit set. Versioned messages set the
//! top bit and carry the version number in the low seven bits.

pub mod v0;

/// Bit flagged in the first byte of a versioned message, with the message
/// version number held in the remaining bits.
pub const MESSAGE_VERSION_PREFIX: u8 = 0x80;

/// Classification of a serialized message's leading byte.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MessageVersion {
    /// An unprefixed legacy message.
    Legacy,
    /// A version-prefixed message with the given version number.
    Number(u8),
}

impl MessageVersion {
    /// Classifies the first byte of a serialized message.
    pub fn classify(first_byte: u8) -> Self {
        if first_byte & MESSAGE_VERSION_PREFIX == 0 {
            Self::Legacy
        } else {
            Self::Number(first_byte & !MESSAGE_VERSION_PREFIX)
        }
    }
}
