//! Instructions as callers declare them, before compilation.
//!
//! An [`Instruction`] names a program to invoke, the accounts it touches
//! with their signer and writability requirements, and an opaque data
//! payload. The message compiler flattens these declarations into the
//! indexed wire form.

use {
    serde_derive::{Deserialize, Serialize},
    tachyon_address::Address,
};

/// Describes a single account an instruction reads or writes.
///
/// When multiple metas reference the same address, the compiled message
/// grants the union of their privileges.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AccountMeta {
    /// The address of the account.
    pub pubkey: Address,
    /// Whether a transaction signature for this account is required.
    pub is_signer: bool,
    /// Whether the program may mutate the account.
    pub is_writable: bool,
}

impl AccountMeta {
    /// Construct metadata for a writable account.
    pub fn new(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    /// Construct metadata for a read-only account.
    pub fn new_readonly(pubkey: Address, is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A directive for a single invocation of an on-chain program.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Instruction {
    /// Address of the program to invoke.
    pub program_id: Address,
    /// Metadata describing the accounts passed to the program.
    pub accounts: Vec<AccountMeta>,
    /// Opaque data passed to the program for its own interpretation.
    pub data: Vec<u8>,
}

impl Instruction {
    /// Construct an instruction from an already-serialized data payload.
    pub fn new_with_bytes(program_id: Address, data: &[u8], accounts: Vec<AccountMeta>) -> Self {
        Self {
            program_id,
            accounts,
            data: data.to_vec(),
        }
    }
}
