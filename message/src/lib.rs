//! Transaction messages and the compiler that produces them.
//!
//! A message is the signed payload of a transaction: a three-byte header
//! describing account privileges, the account address list, a recent
//! blockhash, and the compiled instructions. Versioned messages may
//! additionally load addresses from on-chain lookup tables instead of
//! listing them inline.

mod address_table_lookup;
mod compiled_instruction;
pub mod versions;

pub use {
    address_table_lookup::MessageAddressTableLookup, compiled_instruction::CompiledInstruction,
    versions::MESSAGE_VERSION_PREFIX,
};
use serde_derive::{Deserialize, Serialize};

/// Describes the organization of a message's account addresses.
///
/// Addresses are ordered signers first, with read-only addresses at the
/// tail of each group. The three counts below are enough to recover each
/// address's privileges from its position.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub struct MessageHeader {
    /// The number of signatures required for this message to be
    /// considered valid. The signers must match the first
    /// `num_required_signatures` of the message's account addresses.
    pub num_required_signatures: u8,
    /// The last `num_readonly_signed_accounts` of the signed addresses
    /// are read-only accounts.
    pub num_readonly_signed_accounts: u8,
    /// The last `num_readonly_unsigned_accounts` of the unsigned
    /// addresses are read-only accounts.
    pub num_readonly_unsigned_accounts: u8,
}

/// Serialized size of [`MessageHeader`].
pub const MESSAGE_HEADER_LENGTH: usize = 3;
