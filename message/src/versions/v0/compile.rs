//! Compiles caller-declared instructions into a v0 message.
//!
//! Compilation decides, for every address an instruction touches, whether
//! it rides inline in the static address list or is loaded by index from
//! one of the supplied lookup tables. Signers, the fee payer, and program
//! ids must stay static; everything else found in a table is demoted to a
//! lookup index.

use {
    super::{Message, MAX_TOTAL_ACCOUNT_KEYS},
    crate::{CompiledInstruction, MessageAddressTableLookup, MessageHeader},
    std::collections::{BTreeSet, HashMap, HashSet},
    tachyon_address::Address,
    tachyon_address_lookup_table::AddressLookupTableAccount,
    tachyon_hash::Hash,
    tachyon_instruction::Instruction,
};

/// Errors that can occur when compiling a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// Combined static and looked-up addresses exceed 256.
    AccountIndexOverflow,
    /// A matched lookup table entry sits beyond index 255.
    AddressTableLookupIndexOverflow,
    /// A lookup references an index past the end of its table.
    InvalidAddressTableIndex,
    /// An instruction references an address absent from the combined
    /// address list.
    UnknownInstructionKey(Address),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccountIndexOverflow => {
                write!(f, "account index overflowed during message compilation")
            }
            Self::AddressTableLookupIndexOverflow => write!(
                f,
                "address lookup table index overflowed during message compilation"
            ),
            Self::InvalidAddressTableIndex => {
                write!(f, "address lookup table index is out of bounds")
            }
            Self::UnknownInstructionKey(key) => write!(
                f,
                "encountered unknown account key `{key}` during message compilation"
            ),
        }
    }
}

impl std::error::Error for CompileError {}

#[derive(Default, Clone, Copy)]
struct KeyFlags {
    is_signer: bool,
    is_writable: bool,
    is_program: bool,
}

/// Every address an instruction set touches, in first-reference order,
/// with the union of the privileges requested for it.
struct ReferencedKeys {
    ordered: Vec<Address>,
    flags: HashMap<Address, KeyFlags>,
}

impl ReferencedKeys {
    fn collect(fee_payer: &Address, instructions: &[Instruction]) -> Self {
        let mut keys = Self {
            ordered: vec![*fee_payer],
            flags: HashMap::from([(
                *fee_payer,
                KeyFlags {
                    is_signer: true,
                    is_writable: true,
                    is_program: false,
                },
            )]),
        };
        for ix in instructions {
            for meta in &ix.accounts {
                let flags = keys.entry(meta.pubkey);
                flags.is_signer |= meta.is_signer;
                flags.is_writable |= meta.is_writable;
            }
            keys.entry(ix.program_id).is_program = true;
        }
        keys
    }

    fn entry(&mut self, key: Address) -> &mut KeyFlags {
        if !self.flags.contains_key(&key) {
            self.ordered.push(key);
            self.flags.insert(key, KeyFlags::default());
        }
        self.flags.get_mut(&key).unwrap()
    }
}

impl Message {
    /// Compiles `instructions` into a v0 message for `fee_payer`,
    /// loading whatever addresses it can out of `lookup_tables`.
    ///
    /// The fee payer, all signers, and all program ids stay in the
    /// static address list. A non-signer address found in several tables
    /// is taken from the first table declaring it; tables that resolve
    /// nothing are omitted from the message.
    pub fn try_compile(
        fee_payer: &Address,
        instructions: &[Instruction],
        lookup_tables: &[AddressLookupTableAccount],
        recent_blockhash: Hash,
    ) -> Result<Self, CompileError> {
        let keys = ReferencedKeys::collect(fee_payer, instructions);

        // Demote eligible addresses to lookup indexes, first table wins.
        let mut resolved: HashSet<Address> = HashSet::new();
        let mut address_table_lookups = Vec::new();
        let mut loaded_writable: Vec<Address> = Vec::new();
        let mut loaded_readonly: Vec<Address> = Vec::new();
        for table in lookup_tables {
            let mut writable_indexes: BTreeSet<u8> = BTreeSet::new();
            let mut readonly_indexes: BTreeSet<u8> = BTreeSet::new();
            for key in &keys.ordered {
                let flags = keys.flags[key];
                if flags.is_signer || flags.is_program || resolved.contains(key) {
                    continue;
                }
                let Some(position) = table.state.addresses.iter().position(|addr| addr == key)
                else {
                    continue;
                };
                let index = u8::try_from(position)
                    .map_err(|_| CompileError::AddressTableLookupIndexOverflow)?;
                if flags.is_writable {
                    writable_indexes.insert(index);
                } else {
                    readonly_indexes.insert(index);
                }
                resolved.insert(*key);
            }
            if writable_indexes.is_empty() && readonly_indexes.is_empty() {
                continue;
            }
            for index in &writable_indexes {
                loaded_writable.push(table_address(table, *index)?);
            }
            for index in &readonly_indexes {
                loaded_readonly.push(table_address(table, *index)?);
            }
            address_table_lookups.push(MessageAddressTableLookup {
                account_key: table.key,
                writable_indexes: writable_indexes.into_iter().collect(),
                readonly_indexes: readonly_indexes.into_iter().collect(),
            });
        }

        // Static addresses, grouped so the header boundaries hold while
        // preserving first-reference order inside each group.
        let mut writable_signers = Vec::new();
        let mut readonly_signers = Vec::new();
        let mut writable_non_signers = Vec::new();
        let mut readonly_non_signers = Vec::new();
        for key in &keys.ordered {
            if resolved.contains(key) {
                continue;
            }
            let flags = keys.flags[key];
            match (flags.is_signer, flags.is_writable) {
                (true, true) => writable_signers.push(*key),
                (true, false) => readonly_signers.push(*key),
                (false, true) => writable_non_signers.push(*key),
                (false, false) => readonly_non_signers.push(*key),
            }
        }
        let header = MessageHeader {
            num_required_signatures: (writable_signers.len().saturating_add(readonly_signers.len()))
                as u8,
            num_readonly_signed_accounts: readonly_signers.len() as u8,
            num_readonly_unsigned_accounts: readonly_non_signers.len() as u8,
        };
        let mut account_keys = writable_signers;
        account_keys.append(&mut readonly_signers);
        account_keys.append(&mut writable_non_signers);
        account_keys.append(&mut readonly_non_signers);

        // Combined address list as the runtime will see it.
        let num_total_keys = account_keys
            .len()
            .saturating_add(loaded_writable.len())
            .saturating_add(loaded_readonly.len());
        if num_total_keys > MAX_TOTAL_ACCOUNT_KEYS {
            return Err(CompileError::AccountIndexOverflow);
        }
        let mut key_indexes: HashMap<Address, u8> = HashMap::new();
        for (index, key) in account_keys
            .iter()
            .chain(loaded_writable.iter())
            .chain(loaded_readonly.iter())
            .enumerate()
        {
            key_indexes.entry(*key).or_insert(index as u8);
        }

        let position_of = |key: &Address| -> Result<u8, CompileError> {
            key_indexes
                .get(key)
                .copied()
                .ok_or(CompileError::UnknownInstructionKey(*key))
        };
        let instructions = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: position_of(&ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|meta| position_of(&meta.pubkey))
                        .collect::<Result<Vec<_>, _>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        })
    }
}

fn table_address(table: &AddressLookupTableAccount, index: u8) -> Result<Address, CompileError> {
    table
        .state
        .addresses
        .get(index as usize)
        .copied()
        .ok_or(CompileError::InvalidAddressTableIndex)
}
