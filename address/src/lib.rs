//! Address representation for Tachyon.
//!
//! An address is a sequence of 32 bytes, often shown as a base58 encoded
//! string (e.g. `14grJpemFaf88c8tiVb77W7TYg2W3ir6pfkKz3YjhhZ5`).

use {
    serde_derive::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

/// Number of bytes in an address.
pub const ADDRESS_BYTES: usize = 32;
/// Maximum string length of a base58 encoded address.
const MAX_BASE58_LEN: usize = 44;

#[repr(transparent)]
#[derive(Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_BYTES]);

/// Error parsing an address from its base58 text form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAddressError {
    /// The input is too long to be a base58 encoded address.
    WrongSize,
    /// The input is not valid base58 or does not decode to 32 bytes.
    Invalid,
}

impl fmt::Display for ParseAddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongSize => write!(f, "string decoded to wrong size for address"),
            Self::Invalid => write!(f, "invalid base58 encoded address"),
        }
    }
}

impl std::error::Error for ParseAddressError {}

impl Address {
    pub const fn new_from_array(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }

    /// Return a reference to the address's byte array.
    #[inline(always)]
    pub const fn as_array(&self) -> &[u8; ADDRESS_BYTES] {
        &self.0
    }

    pub const fn to_bytes(self) -> [u8; ADDRESS_BYTES] {
        self.0
    }

    /// Unique address for tests and benchmarks.
    pub fn new_unique() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        let mut bytes = [0u8; ADDRESS_BYTES];
        let i = COUNTER.fetch_add(1, Ordering::Relaxed);
        bytes[0..8].copy_from_slice(&i.to_le_bytes());
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

impl From<[u8; ADDRESS_BYTES]> for Address {
    #[inline]
    fn from(bytes: [u8; ADDRESS_BYTES]) -> Self {
        Self(bytes)
    }
}

impl From<Address> for [u8; ADDRESS_BYTES] {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl<'a> TryFrom<&'a [u8]> for Address {
    type Error = <[u8; ADDRESS_BYTES] as TryFrom<&'a [u8]>>::Error;

    fn try_from(bytes: &'a [u8]) -> Result<Self, Self::Error> {
        <[u8; ADDRESS_BYTES]>::try_from(bytes).map(Self)
    }
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_BASE58_LEN {
            return Err(ParseAddressError::WrongSize);
        }
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ParseAddressError::Invalid)?;
        Self::try_from(bytes.as_slice()).map_err(|_| ParseAddressError::WrongSize)
    }
}

fn write_as_base58(f: &mut fmt::Formatter, a: &Address) -> fmt::Result {
    f.write_str(&bs58::encode(&a.0).into_string())
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_as_base58(f, self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_as_base58(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_roundtrip() {
        let address = Address::new_unique();
        let encoded = address.to_string();
        assert_eq!(encoded.parse::<Address>(), Ok(address));
    }

    #[test]
    fn parse_rejects_oversized_input() {
        let too_long = "1".repeat(MAX_BASE58_LEN + 1);
        assert_eq!(
            too_long.parse::<Address>(),
            Err(ParseAddressError::WrongSize)
        );
    }

    #[test]
    fn parse_rejects_non_base58() {
        assert_eq!(
            "I0OlI0OlI0Ol".parse::<Address>(),
            Err(ParseAddressError::Invalid)
        );
    }

    #[test]
    fn parse_rejects_short_decode() {
        // Valid base58, decodes to fewer than 32 bytes
        assert_eq!("abc".parse::<Address>(), Err(ParseAddressError::WrongSize));
    }

    #[test]
    fn new_unique_is_unique() {
        assert_ne!(Address::new_unique(), Address::new_unique());
    }

    #[test]
    fn sysvar_address_parses() {
        let sysvar: Address = "SysvarRecentB1ockHashes11111111111111111111"
            .parse()
            .unwrap();
        assert_eq!(
            sysvar.to_string(),
            "SysvarRecentB1ockHashes11111111111111111111"
        );
    }
}
