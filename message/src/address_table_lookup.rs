//! Address table lookups as they appear inside a versioned message.

use {
    serde_derive::{Deserialize, Serialize},
    tachyon_address::Address,
};

/// Instructs the runtime to load additional account addresses out of a
/// single on-chain lookup table.
///
/// Index lists are ascending and disjoint: an address loaded writable is
/// never also loaded read-only from the same lookup.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct MessageAddressTableLookup {
    /// Address of the on-chain lookup table account.
    pub account_key: Address,
    /// Table indexes of addresses to load as writable.
    pub writable_indexes: Vec<u8>,
    /// Table indexes of addresses to load as read-only.
    pub readonly_indexes: Vec<u8>,
}
