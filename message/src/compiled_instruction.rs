//! The wire form of an instruction, with accounts referenced by index.

use serde_derive::{Deserialize, Serialize};

/// An instruction whose program and accounts have been replaced with
/// indexes into the message's combined address list.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct CompiledInstruction {
    /// Index into the message's static address list identifying the
    /// program to invoke.
    pub program_id_index: u8,
    /// Indexes into the message's combined address list, in the order
    /// the accounts are passed to the program.
    pub accounts: Vec<u8>,
    /// Opaque program input data.
    pub data: Vec<u8>,
}
