//! The v0 message format, which supports loading account addresses from
//! on-chain lookup tables.

mod compile;
mod error;
mod serialization;

pub use {compile::CompileError, error::MessageError};
use {
    crate::{CompiledInstruction, MessageAddressTableLookup, MessageHeader},
    serde_derive::{Deserialize, Serialize},
    tachyon_address::Address,
    tachyon_hash::Hash,
};

/// Upper bound on the combined static and looked-up address count.
/// Instruction account indexes are a single byte.
pub const MAX_TOTAL_ACCOUNT_KEYS: usize = 256;

/// A message that loads part of its account addresses from lookup tables.
///
/// The combined address list a program sees is the static addresses,
/// followed by every writable looked-up address in lookup declaration
/// order, followed by every read-only looked-up address in the same
/// order. Instruction account indexes point into that combined list.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Privilege layout of the static addresses.
    pub header: MessageHeader,
    /// Addresses carried inline, fee payer first.
    pub account_keys: Vec<Address>,
    /// Recent blockhash (or durable nonce) bounding the message's
    /// validity window.
    pub recent_blockhash: Hash,
    /// The compiled instructions, executed in order.
    pub instructions: Vec<CompiledInstruction>,
    /// Lookup table loads, in the order addresses are appended to the
    /// combined address list.
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
}

impl Message {
    /// Number of addresses loaded as writable from lookup tables.
    pub fn num_writable_lookup_indexes(&self) -> usize {
        self.address_table_lookups
            .iter()
            .map(|lookup| lookup.writable_indexes.len())
            .fold(0usize, |acc, len| acc.saturating_add(len))
    }

    /// Number of addresses loaded as read-only from lookup tables.
    pub fn num_readonly_lookup_indexes(&self) -> usize {
        self.address_table_lookups
            .iter()
            .map(|lookup| lookup.readonly_indexes.len())
            .fold(0usize, |acc, len| acc.saturating_add(len))
    }

    /// Total number of addresses in the combined address list.
    pub fn num_total_account_keys(&self) -> usize {
        self.account_keys
            .len()
            .saturating_add(self.num_writable_lookup_indexes())
            .saturating_add(self.num_readonly_lookup_indexes())
    }

    /// Whether the address at `index` of the combined list must sign.
    /// Looked-up addresses never sign.
    pub fn is_signer_index(&self, index: usize) -> bool {
        index < self.header.num_required_signatures as usize
    }

    /// Whether the address at `index` of the combined list is writable.
    pub fn is_writable_index(&self, index: usize) -> bool {
        let header = &self.header;
        let num_signed = header.num_required_signatures as usize;
        let num_static = self.account_keys.len();
        if index < num_signed {
            index < num_signed.saturating_sub(header.num_readonly_signed_accounts as usize)
        } else if index < num_static {
            index < num_static.saturating_sub(header.num_readonly_unsigned_accounts as usize)
        } else {
            index.saturating_sub(num_static) < self.num_writable_lookup_indexes()
        }
    }

    /// Whether any instruction invokes the address at `index` as its
    /// program.
    pub fn is_key_called_as_program(&self, index: usize) -> bool {
        u8::try_from(index)
            .map(|index| {
                self.instructions
                    .iter()
                    .any(|ix| ix.program_id_index == index)
            })
            .unwrap_or(false)
    }
}
