//! On-chain address lookup table state.
//!
//! A lookup table account stores a fixed-size metadata header followed by
//! a dense array of 32-byte addresses. Messages reference entries in these
//! tables by index instead of carrying the full addresses inline.

use {
    serde_derive::{Deserialize, Serialize},
    std::fmt,
    tachyon_address::{Address, ADDRESS_BYTES},
};

/// Serialized size of the lookup table metadata header. Address entries
/// begin at this offset regardless of whether an authority is present.
pub const LOOKUP_TABLE_META_SIZE: usize = 56;

/// Error deserializing lookup table account data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupTableError {
    /// The account data is shorter than the metadata header.
    AccountDataTooSmall,
    /// The account data is malformed.
    InvalidAccountData,
}

impl fmt::Display for LookupTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccountDataTooSmall => write!(f, "lookup table account data too small"),
            Self::InvalidAccountData => write!(f, "invalid lookup table account data"),
        }
    }
}

impl std::error::Error for LookupTableError {}

/// Deserialized lookup table account state.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AddressLookupTable {
    /// Slot at which the table was deactivated, or `u64::MAX` while active.
    pub deactivation_slot: u64,
    /// Slot at which addresses were last appended to the table.
    pub last_extended_slot: u64,
    /// Index of the first address appended during `last_extended_slot`.
    pub last_extended_slot_start_index: u8,
    /// Authority allowed to extend or close the table, if any.
    pub authority: Option<Address>,
    /// The stored addresses, in append order.
    pub addresses: Vec<Address>,
}

impl AddressLookupTable {
    /// Whether the table has not been deactivated.
    pub fn is_active(&self) -> bool {
        self.deactivation_slot == u64::MAX
    }

    /// Deserializes lookup table state from raw account data.
    pub fn deserialize(data: &[u8]) -> Result<Self, LookupTableError> {
        if data.len() < LOOKUP_TABLE_META_SIZE {
            return Err(LookupTableError::AccountDataTooSmall);
        }

        // Account type tag occupies the first four bytes.
        let deactivation_slot = u64::from_le_bytes(data[4..12].try_into().unwrap());
        let last_extended_slot = u64::from_le_bytes(data[12..20].try_into().unwrap());
        let last_extended_slot_start_index = data[20];
        let authority = match data[21] {
            0 => None,
            1 => {
                let bytes: [u8; ADDRESS_BYTES] = data[22..22 + ADDRESS_BYTES]
                    .try_into()
                    .unwrap();
                Some(Address::new_from_array(bytes))
            }
            _ => return Err(LookupTableError::InvalidAccountData),
        };

        let raw_addresses = &data[LOOKUP_TABLE_META_SIZE..];
        if raw_addresses.len() % ADDRESS_BYTES != 0 {
            return Err(LookupTableError::InvalidAccountData);
        }
        let addresses = raw_addresses
            .chunks_exact(ADDRESS_BYTES)
            .map(|chunk| Address::new_from_array(chunk.try_into().unwrap()))
            .collect();

        Ok(Self {
            deactivation_slot,
            last_extended_slot,
            last_extended_slot_start_index,
            authority,
            addresses,
        })
    }
}

/// A lookup table account paired with the address it lives at, as handed
/// to the message compiler.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AddressLookupTableAccount {
    /// Address of the on-chain table account.
    pub key: Address,
    /// Deserialized table state.
    pub state: AddressLookupTable,
}
