//! Serialization and deserialization for v0 messages.
//!
//! # Binary Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Version (u8 = 0x80)                                         │
//! │ MessageHeader (3 x u8)                                      │
//! │ NumAccountKeys (compact-u16)                                │
//! │ AccountKeys [[u8; 32] x NumAccountKeys]                     │
//! │ RecentBlockhash [u8; 32]                                    │
//! │ NumInstructions (compact-u16)                               │
//! │ Instructions:                                               │
//! │   ProgramIdIndex (u8)                                       │
//! │   NumAccounts (compact-u16) + account indexes               │
//! │   DataLen (compact-u16) + data                              │
//! │ NumAddressTableLookups (compact-u16)                        │
//! │ AddressTableLookups:                                        │
//! │   TableAccountKey [u8; 32]                                  │
//! │   NumWritable (compact-u16) + writable indexes              │
//! │   NumReadonly (compact-u16) + readonly indexes              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Note: Signatures are not part of the message. They are appended by
//! `VersionedTransaction` after the message bytes.

use {
    super::{Message, MessageError, MAX_TOTAL_ACCOUNT_KEYS},
    crate::{
        versions::{MessageVersion, MESSAGE_VERSION_PREFIX},
        CompiledInstruction, MessageAddressTableLookup, MessageHeader, MESSAGE_HEADER_LENGTH,
    },
    tachyon_address::{Address, ADDRESS_BYTES},
    tachyon_hash::{Hash, HASH_BYTES},
    tachyon_short_vec as short_vec,
};

/// Read a fixed-size array from a byte slice at the given offset.
fn read_at<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], MessageError> {
    let end = offset.checked_add(N).ok_or(MessageError::BufferTooSmall)?;
    bytes
        .get(offset..end)
        .and_then(|slice| slice.try_into().ok())
        .ok_or(MessageError::BufferTooSmall)
}

/// Decode a compact length prefix at `offset`, returning the length and
/// the offset just past the prefix.
fn read_length(bytes: &[u8], offset: usize) -> Result<(usize, usize), MessageError> {
    let slice = bytes.get(offset..).ok_or(MessageError::BufferTooSmall)?;
    let (len, consumed) = short_vec::decode_length(slice)?;
    Ok((len, offset.saturating_add(consumed)))
}

fn read_byte_list(bytes: &[u8], offset: usize) -> Result<(Vec<u8>, usize), MessageError> {
    let (len, offset) = read_length(bytes, offset)?;
    let end = offset.saturating_add(len);
    let list = bytes
        .get(offset..end)
        .ok_or(MessageError::BufferTooSmall)?
        .to_vec();
    Ok((list, end))
}

fn push_length(bytes: &mut Vec<u8>, len: usize) -> Result<(), MessageError> {
    let len = u16::try_from(len).map_err(|_| MessageError::InstructionDataTooLarge)?;
    bytes.extend_from_slice(&short_vec::encode_length(len));
    Ok(())
}

impl Message {
    /// Serialize this v0 message to bytes, version prefix included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        if self.num_total_account_keys() > MAX_TOTAL_ACCOUNT_KEYS {
            return Err(MessageError::TooManyAccountKeys);
        }

        let mut bytes = Vec::with_capacity(self.size_hint());
        bytes.push(MESSAGE_VERSION_PREFIX);
        bytes.push(self.header.num_required_signatures);
        bytes.push(self.header.num_readonly_signed_accounts);
        bytes.push(self.header.num_readonly_unsigned_accounts);

        push_length(&mut bytes, self.account_keys.len())?;
        for key in &self.account_keys {
            bytes.extend_from_slice(key.as_ref());
        }

        bytes.extend_from_slice(self.recent_blockhash.as_ref());

        push_length(&mut bytes, self.instructions.len())?;
        for ix in &self.instructions {
            bytes.push(ix.program_id_index);
            push_length(&mut bytes, ix.accounts.len())?;
            bytes.extend_from_slice(&ix.accounts);
            push_length(&mut bytes, ix.data.len())?;
            bytes.extend_from_slice(&ix.data);
        }

        push_length(&mut bytes, self.address_table_lookups.len())?;
        for lookup in &self.address_table_lookups {
            bytes.extend_from_slice(lookup.account_key.as_ref());
            push_length(&mut bytes, lookup.writable_indexes.len())?;
            bytes.extend_from_slice(&lookup.writable_indexes);
            push_length(&mut bytes, lookup.readonly_indexes.len())?;
            bytes.extend_from_slice(&lookup.readonly_indexes);
        }

        Ok(bytes)
    }

    fn size_hint(&self) -> usize {
        let instructions_size: usize = self
            .instructions
            .iter()
            .map(|ix| {
                ix.accounts
                    .len()
                    .saturating_add(ix.data.len())
                    .saturating_add(8)
            })
            .fold(0usize, |acc, x| acc.saturating_add(x));
        let lookups_size: usize = self
            .address_table_lookups
            .iter()
            .map(|lookup| {
                ADDRESS_BYTES
                    .saturating_add(lookup.writable_indexes.len())
                    .saturating_add(lookup.readonly_indexes.len())
                    .saturating_add(6)
            })
            .fold(0usize, |acc, x| acc.saturating_add(x));
        1usize
            .saturating_add(MESSAGE_HEADER_LENGTH)
            .saturating_add(3)
            .saturating_add(self.account_keys.len().saturating_mul(ADDRESS_BYTES))
            .saturating_add(HASH_BYTES)
            .saturating_add(instructions_size)
            .saturating_add(lookups_size)
    }

    /// Deserialize a v0 message from bytes.
    ///
    /// Use this when parsing a standalone message buffer. Returns an
    /// error if there are unexpected bytes after the message. The input
    /// must start with the version byte (0x80).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError> {
        let (message, bytes_consumed) = Self::from_bytes_partial(bytes)?;
        if bytes_consumed != bytes.len() {
            return Err(MessageError::TrailingData);
        }
        Ok(message)
    }

    /// Deserialize a v0 message from a byte slice, returning bytes
    /// consumed.
    ///
    /// Use this when the message is embedded in a larger buffer, such as
    /// when parsing a transaction where signatures follow the message.
    pub fn from_bytes_partial(bytes: &[u8]) -> Result<(Self, usize), MessageError> {
        // Track position as we parse each field sequentially. Offset
        // advances use saturating_add; overflow produces usize::MAX and
        // fails the next bounds check with BufferTooSmall.
        let mut offset = 0usize;

        let first_byte = *bytes.first().ok_or(MessageError::BufferTooSmall)?;
        match MessageVersion::classify(first_byte) {
            MessageVersion::Legacy => return Err(MessageError::LegacyNotSupported),
            MessageVersion::Number(0) => {}
            MessageVersion::Number(version) => {
                return Err(MessageError::UnsupportedVersion(version))
            }
        }
        offset = offset.saturating_add(1);

        let header_bytes: [u8; MESSAGE_HEADER_LENGTH] = read_at(bytes, offset)?;
        let header = MessageHeader {
            num_required_signatures: header_bytes[0],
            num_readonly_signed_accounts: header_bytes[1],
            num_readonly_unsigned_accounts: header_bytes[2],
        };
        offset = offset.saturating_add(MESSAGE_HEADER_LENGTH);

        let (num_account_keys, mut offset) = read_length(bytes, offset)?;
        if num_account_keys > MAX_TOTAL_ACCOUNT_KEYS {
            return Err(MessageError::TooManyAccountKeys);
        }
        let mut account_keys = Vec::with_capacity(num_account_keys);
        for _ in 0..num_account_keys {
            account_keys.push(Address::new_from_array(read_at(bytes, offset)?));
            offset = offset.saturating_add(ADDRESS_BYTES);
        }

        let recent_blockhash = Hash::new_from_array(read_at(bytes, offset)?);
        offset = offset.saturating_add(HASH_BYTES);

        let (num_instructions, mut offset) = read_length(bytes, offset)?;
        let mut instructions = Vec::with_capacity(num_instructions.min(256));
        for _ in 0..num_instructions {
            let program_id_index = *bytes.get(offset).ok_or(MessageError::BufferTooSmall)?;
            offset = offset.saturating_add(1);
            let (accounts, next) = read_byte_list(bytes, offset)?;
            let (data, next) = read_byte_list(bytes, next)?;
            offset = next;
            instructions.push(CompiledInstruction {
                program_id_index,
                accounts,
                data,
            });
        }

        let (num_lookups, mut offset) = read_length(bytes, offset)?;
        let mut address_table_lookups = Vec::with_capacity(num_lookups.min(256));
        for _ in 0..num_lookups {
            let account_key = Address::new_from_array(read_at(bytes, offset)?);
            offset = offset.saturating_add(ADDRESS_BYTES);
            let (writable_indexes, next) = read_byte_list(bytes, offset)?;
            let (readonly_indexes, next) = read_byte_list(bytes, next)?;
            offset = next;
            address_table_lookups.push(MessageAddressTableLookup {
                account_key,
                writable_indexes,
                readonly_indexes,
            });
        }

        let message = Self {
            header,
            account_keys,
            recent_blockhash,
            instructions,
            address_table_lookups,
        };
        message.validate_indexes()?;
        Ok((message, offset))
    }

    /// Index validation shared by both deserialization entry points.
    ///
    /// Program ids must come from the static list and may not be the fee
    /// payer. Instruction account indexes may point anywhere in the
    /// combined address list, whose total size is capped at 256.
    fn validate_indexes(&self) -> Result<(), MessageError> {
        let num_total_keys = self.num_total_account_keys();
        if num_total_keys > MAX_TOTAL_ACCOUNT_KEYS {
            return Err(MessageError::TooManyAccountKeys);
        }
        for ix in &self.instructions {
            if ix.program_id_index == 0
                || ix.program_id_index as usize >= self.account_keys.len()
            {
                return Err(MessageError::InvalidProgramIdIndex);
            }
            for &account_index in &ix.accounts {
                if account_index as usize >= num_total_keys {
                    return Err(MessageError::InvalidInstructionAccountIndex);
                }
            }
        }
        Ok(())
    }
}
