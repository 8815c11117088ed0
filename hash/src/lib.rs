//! Wrapper for the 32-byte output of a hashing algorithm, used for
//! blockhashes and durable nonce values.

use {
    serde_derive::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Size of a hash in bytes.
pub const HASH_BYTES: usize = 32;
/// Maximum string length of a base58 encoded hash.
const MAX_BASE58_LEN: usize = 44;

#[repr(transparent)]
#[derive(Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Hash([u8; HASH_BYTES]);

/// Error parsing a hash from its base58 text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseHashError {
    WrongSize,
    Invalid,
}

impl fmt::Display for ParseHashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongSize => write!(f, "string decoded to wrong size for hash"),
            Self::Invalid => write!(f, "invalid base58 encoded hash"),
        }
    }
}

impl std::error::Error for ParseHashError {}

impl Hash {
    pub const fn new_from_array(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }

    #[inline(always)]
    pub const fn as_array(&self) -> &[u8; HASH_BYTES] {
        &self.0
    }

    pub const fn to_bytes(self) -> [u8; HASH_BYTES] {
        self.0
    }

    /// Unique hash for tests and benchmarks.
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let mut bytes = [0u8; HASH_BYTES];
        let i = COUNTER.fetch_add(1, Ordering::Relaxed);
        bytes[0..8].copy_from_slice(&i.to_le_bytes());
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<[u8; HASH_BYTES]> for Hash {
    #[inline]
    fn from(bytes: [u8; HASH_BYTES]) -> Self {
        Self(bytes)
    }
}

impl<'a> TryFrom<&'a [u8]> for Hash {
    type Error = <[u8; HASH_BYTES] as TryFrom<&'a [u8]>>::Error;

    fn try_from(bytes: &'a [u8]) -> Result<Self, Self::Error> {
        <[u8; HASH_BYTES]>::try_from(bytes).map(Self)
    }
}

impl FromStr for Hash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseHashError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseHashError::Invalid)?;
        Self::try_from(bytes.as_slice()).map_err(|_| ParseHashError::WrongSize)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", bs58::encode(&self.0).into_string())
    }
}
