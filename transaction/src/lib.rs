//! The versioned transaction container.
//!
//! A [`VersionedTransaction`] carries caller-declared instructions plus
//! everything needed to turn them into signed wire bytes: the fee payer,
//! a blockhash or durable nonce, collected signatures, and the compiled
//! message once one exists.
//!
//! # Wire Format
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ NumSignatures (compact-u16)                 │
//! │ Signatures [[u8; 64] x NumSignatures]       │
//! │ Message (version-prefixed, variable)        │
//! └─────────────────────────────────────────────┘
//! ```

use {
    base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine},
    serde_derive::{Deserialize, Serialize},
    tachyon_address::Address,
    tachyon_address_lookup_table::AddressLookupTableAccount,
    tachyon_hash::Hash,
    tachyon_instruction::{AccountMeta, Instruction},
    tachyon_keypair::Signer,
    tachyon_message::{
        versions::v0, CompiledInstruction, MessageAddressTableLookup,
    },
    tachyon_short_vec as short_vec,
    tachyon_signature::{Signature, SIGNATURE_BYTES},
};

pub use tachyon_message::versions::v0::{CompileError, MessageError};

lazy_static::lazy_static! {
    /// Sysvar granting programs access to recent blockhashes. Durable
    /// nonce advance instructions reference it, which is how populated
    /// transactions are recognized as nonce-based.
    pub static ref RECENT_BLOCKHASHES_ID: Address =
        "SysvarRecentB1ockHashes11111111111111111111"
            .parse()
            .unwrap();
}

/// Errors that can occur when assembling or parsing transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Could not decode base64-encoded transaction data.
    Base64(String),
    /// Failed to compile instructions into a message.
    Compile(CompileError),
    /// Failed to serialize or deserialize the message.
    Message(MessageError),
    /// Serialization or verification was requested before any message
    /// was compiled.
    MissingCompiledMessage,
    /// The buffer ended inside the signature section.
    NotEnoughSignatureBytes,
    /// More signatures than the message can account for.
    TooManySignatures,
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base64(err) => {
                write!(f, "could not decode transaction data from base64: {err}")
            }
            Self::Compile(err) => write!(f, "could not compile message: {err}"),
            Self::Message(err) => write!(f, "message serialization failed: {err}"),
            Self::MissingCompiledMessage => {
                write!(f, "no compiled message and no lookup tables to compile one")
            }
            Self::NotEnoughSignatureBytes => {
                write!(f, "buffer ended inside the signature section")
            }
            Self::TooManySignatures => write!(f, "too many signatures for the message"),
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Compile(err) => Some(err),
            Self::Message(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CompileError> for TransactionError {
    fn from(err: CompileError) -> Self {
        Self::Compile(err)
    }
}

impl From<MessageError> for TransactionError {
    fn from(err: MessageError) -> Self {
        Self::Message(err)
    }
}

/// A collected signature together with the address it verifies against.
///
/// Pairing the two keeps verification independent of signature order on
/// the wire.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct SignatureAddressPair {
    /// The address whose key produced the signature.
    pub address: Address,
    /// The signature over the compiled message bytes.
    pub signature: Signature,
}

/// Durable nonce parameters for transactions that outlive the recent
/// blockhash window.
///
/// The advance instruction is prepended to the compiled message and the
/// nonce value replaces the recent blockhash.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NonceInformation {
    /// The current nonce value stored in the nonce account.
    pub nonce: Hash,
    /// The instruction that advances the nonce account.
    pub instruction: Instruction,
}

/// A transaction whose message may load addresses from lookup tables.
#[derive(Debug, Default, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct VersionedTransaction {
    /// The account that pays the transaction fee. Always the first
    /// static address and always a writable signer.
    pub fee_payer: Address,
    /// Blockhash bounding the transaction's validity window. Ignored
    /// when nonce information is present.
    pub recent_blockhash: Hash,
    /// Durable nonce parameters, if this transaction uses one.
    pub nonce_information: Option<NonceInformation>,
    /// The caller-declared instructions, in execution order.
    pub instructions: Vec<Instruction>,
    /// Lookups of the most recently compiled or deserialized message.
    pub address_table_lookups: Vec<MessageAddressTableLookup>,
    /// Collected signatures, each paired with its signing address.
    pub signatures: Vec<SignatureAddressPair>,
    message: Option<v0::Message>,
}

impl VersionedTransaction {
    pub fn new(fee_payer: Address, recent_blockhash: Hash, instructions: Vec<Instruction>) -> Self {
        Self {
            fee_payer,
            recent_blockhash,
            instructions,
            ..Self::default()
        }
    }

    /// The compiled message, if one has been produced by signing,
    /// deserializing, or populating this transaction.
    pub fn message(&self) -> Option<&v0::Message> {
        self.message.as_ref()
    }

    fn compile(
        &self,
        lookup_tables: Option<&[AddressLookupTableAccount]>,
    ) -> Result<v0::Message, TransactionError> {
        let Some(lookup_tables) = lookup_tables else {
            return self
                .message
                .clone()
                .ok_or(TransactionError::MissingCompiledMessage);
        };
        let (blockhash, instructions) = match &self.nonce_information {
            Some(nonce) => {
                let mut instructions = Vec::with_capacity(self.instructions.len().saturating_add(1));
                instructions.push(nonce.instruction.clone());
                instructions.extend(self.instructions.iter().cloned());
                (nonce.nonce, instructions)
            }
            None => (self.recent_blockhash, self.instructions.clone()),
        };
        v0::Message::try_compile(&self.fee_payer, &instructions, lookup_tables, blockhash)
            .map_err(TransactionError::from)
    }

    /// Compiles this transaction's instructions into message bytes.
    ///
    /// With lookup tables, a fresh message is compiled. Without them the
    /// previously compiled or deserialized message is re-serialized,
    /// which makes a deserialize-serialize round trip byte-identical.
    pub fn compile_message(
        &self,
        lookup_tables: Option<&[AddressLookupTableAccount]>,
    ) -> Result<Vec<u8>, TransactionError> {
        self.compile(lookup_tables)?
            .to_bytes()
            .map_err(TransactionError::from)
    }

    /// Signs the compiled message with every distinct signer and stores
    /// the message for later serialization.
    ///
    /// Signers are deduplicated by address; a keypair passed twice signs
    /// once. Returns whether all collected signatures verify against the
    /// signed message bytes.
    pub fn sign(
        &mut self,
        signers: &[&dyn Signer],
        lookup_tables: Option<&[AddressLookupTableAccount]>,
    ) -> Result<bool, TransactionError> {
        let message = self.compile(lookup_tables)?;
        let message_bytes = message.to_bytes()?;

        let mut seen = std::collections::HashSet::new();
        for signer in signers {
            let address = signer.address();
            if !seen.insert(address) {
                continue;
            }
            self.signatures.push(SignatureAddressPair {
                address,
                signature: signer.sign_message(&message_bytes),
            });
        }

        self.address_table_lookups = message.address_table_lookups.clone();
        self.message = Some(message);
        Ok(self.verify_against(&message_bytes))
    }

    /// Verifies every collected signature against the compiled message.
    ///
    /// A transaction with no signatures verifies vacuously.
    pub fn verify(
        &self,
        lookup_tables: Option<&[AddressLookupTableAccount]>,
    ) -> Result<bool, TransactionError> {
        let message_bytes = self.compile_message(lookup_tables)?;
        Ok(self.verify_against(&message_bytes))
    }

    /// Verifies every collected signature against the given message
    /// bytes.
    pub fn verify_against(&self, message_bytes: &[u8]) -> bool {
        self.signatures
            .iter()
            .all(|pair| pair.signature.verify(pair.address.as_ref(), message_bytes))
    }

    /// Serializes this transaction to wire bytes: the compact signature
    /// count, the signatures, then the message.
    pub fn serialize(
        &self,
        lookup_tables: Option<&[AddressLookupTableAccount]>,
    ) -> Result<Vec<u8>, TransactionError> {
        let message_bytes = self.compile_message(lookup_tables)?;
        let mut bytes = Vec::with_capacity(
            short_vec::MAX_ENCODED_LENGTH
                .saturating_add(self.signatures.len().saturating_mul(SIGNATURE_BYTES))
                .saturating_add(message_bytes.len()),
        );
        let num_signatures = u16::try_from(self.signatures.len())
            .map_err(|_| TransactionError::TooManySignatures)?;
        bytes.extend_from_slice(&short_vec::encode_length(num_signatures));
        for pair in &self.signatures {
            bytes.extend_from_slice(pair.signature.as_ref());
        }
        bytes.extend_from_slice(&message_bytes);
        Ok(bytes)
    }

    /// Signs the transaction and returns the serialized wire bytes in
    /// one step.
    pub fn build(
        &mut self,
        signers: &[&dyn Signer],
        lookup_tables: Option<&[AddressLookupTableAccount]>,
    ) -> Result<Vec<u8>, TransactionError> {
        self.sign(signers, lookup_tables)?;
        self.serialize(None)
    }

    /// Parses a transaction from wire bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, TransactionError> {
        let (num_signatures, mut offset) = short_vec::decode_length(bytes)
            .map_err(|err| TransactionError::Message(MessageError::from(err)))?;
        let mut signatures = Vec::with_capacity(num_signatures.min(256));
        for _ in 0..num_signatures {
            let end = offset.saturating_add(SIGNATURE_BYTES);
            let signature = bytes
                .get(offset..end)
                .and_then(|slice| Signature::try_from(slice).ok())
                .ok_or(TransactionError::NotEnoughSignatureBytes)?;
            signatures.push(signature);
            offset = end;
        }
        let message = v0::Message::from_bytes(bytes.get(offset..).unwrap_or_default())?;
        Self::populate(message, signatures)
    }

    /// Parses a transaction from base64-encoded wire bytes, as returned
    /// by RPC nodes.
    pub fn from_base64(encoded: &str) -> Result<Self, TransactionError> {
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(|err| TransactionError::Base64(err.to_string()))?;
        Self::deserialize(&bytes)
    }

    /// Reconstructs a transaction from a compiled message and its
    /// signatures.
    ///
    /// Signatures are paired positionally with the static addresses;
    /// supplying more signatures than static addresses is an error.
    /// Account references that point into looked-up addresses cannot be
    /// recovered without the tables and are omitted from the rebuilt
    /// instructions; the lookups themselves are preserved verbatim.
    pub fn populate(
        message: v0::Message,
        signatures: Vec<Signature>,
    ) -> Result<Self, TransactionError> {
        // Signatures pair positionally with static addresses; a surplus
        // has nothing to pair with and must not be dropped silently.
        if signatures.len() > message.account_keys.len() {
            return Err(TransactionError::TooManySignatures);
        }
        let pairs = signatures
            .into_iter()
            .zip(message.account_keys.iter())
            .map(|(signature, address)| SignatureAddressPair {
                address: *address,
                signature,
            })
            .collect::<Vec<_>>();
        let num_signed = pairs.len();

        let mut nonce_information = None;
        let mut instructions = Vec::with_capacity(message.instructions.len());
        for (ix_index, compiled) in message.instructions.iter().enumerate() {
            let instruction = decompile_instruction(&message, compiled, num_signed)?;
            let advances_nonce = instruction
                .accounts
                .iter()
                .any(|meta| meta.pubkey == *RECENT_BLOCKHASHES_ID);
            if ix_index == 0 && advances_nonce {
                nonce_information = Some(NonceInformation {
                    nonce: message.recent_blockhash,
                    instruction,
                });
            } else {
                instructions.push(instruction);
            }
        }

        Ok(Self {
            fee_payer: message.account_keys.first().copied().unwrap_or_default(),
            recent_blockhash: message.recent_blockhash,
            nonce_information,
            instructions,
            address_table_lookups: message.address_table_lookups.clone(),
            signatures: pairs,
            message: Some(message),
        })
    }
}

fn decompile_instruction(
    message: &v0::Message,
    compiled: &CompiledInstruction,
    num_signed: usize,
) -> Result<Instruction, TransactionError> {
    let program_id = message
        .account_keys
        .get(compiled.program_id_index as usize)
        .copied()
        .ok_or(TransactionError::Message(
            MessageError::InvalidProgramIdIndex,
        ))?;
    let mut accounts = Vec::with_capacity(compiled.accounts.len());
    for &index in &compiled.accounts {
        // Looked-up addresses are not recoverable from the message alone.
        let Some(pubkey) = message.account_keys.get(index as usize).copied() else {
            continue;
        };
        accounts.push(AccountMeta {
            pubkey,
            is_signer: message.is_signer_index(index as usize)
                || (index as usize) < num_signed,
            is_writable: message.is_writable_index(index as usize),
        });
    }
    Ok(Instruction {
        program_id,
        accounts,
        data: compiled.data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        tachyon_address_lookup_table::AddressLookupTable,
        tachyon_keypair::Keypair,
    };

    fn lookup_table(addresses: Vec<Address>) -> AddressLookupTableAccount {
        AddressLookupTableAccount {
            key: Address::new_unique(),
            state: AddressLookupTable {
                deactivation_slot: u64::MAX,
                addresses,
                ..AddressLookupTable::default()
            },
        }
    }

    fn test_transaction(fee_payer: &Keypair) -> (VersionedTransaction, Vec<AddressLookupTableAccount>) {
        let program = Address::new_unique();
        let loaded = Address::new_unique();
        let table = lookup_table(vec![Address::new_unique(), loaded]);
        let ix = Instruction::new_with_bytes(
            program,
            &[1, 2, 3],
            vec![
                AccountMeta::new(fee_payer.address(), true),
                AccountMeta::new_readonly(loaded, false),
            ],
        );
        let tx = VersionedTransaction::new(fee_payer.address(), Hash::new_unique(), vec![ix]);
        (tx, vec![table])
    }

    #[test]
    fn sign_then_verify() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);

        assert_eq!(tx.sign(&[&fee_payer], Some(&tables)), Ok(true));
        assert_eq!(tx.signatures.len(), 1);
        assert_eq!(tx.signatures[0].address, fee_payer.address());
        // The stored message serves verification without the tables.
        assert_eq!(tx.verify(None), Ok(true));
        assert_eq!(tx.address_table_lookups.len(), 1);
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);
        tx.sign(&[&fee_payer], Some(&tables)).unwrap();

        let mut bytes = tx.signatures[0].signature.as_ref().to_vec();
        bytes[0] ^= 0x01;
        tx.signatures[0].signature = Signature::try_from(bytes.as_slice()).unwrap();
        assert_eq!(tx.verify(None), Ok(false));
    }

    #[test]
    fn duplicate_signers_sign_once() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);

        assert_eq!(tx.sign(&[&fee_payer, &fee_payer], Some(&tables)), Ok(true));
        assert_eq!(tx.signatures.len(), 1);
    }

    #[test]
    fn unsigned_transaction_verifies_vacuously() {
        let fee_payer = Keypair::new();
        let (tx, tables) = test_transaction(&fee_payer);
        assert_eq!(tx.verify(Some(&tables)), Ok(true));
    }

    #[test]
    fn serialize_requires_a_compiled_message() {
        let fee_payer = Keypair::new();
        let (tx, _) = test_transaction(&fee_payer);
        assert_eq!(
            tx.serialize(None),
            Err(TransactionError::MissingCompiledMessage)
        );
    }

    #[test]
    fn deserialize_then_serialize_is_byte_identical() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);
        let wire = tx.build(&[&fee_payer], Some(&tables)).unwrap();

        let parsed = VersionedTransaction::deserialize(&wire).unwrap();
        assert_eq!(parsed.fee_payer, fee_payer.address());
        assert_eq!(parsed.signatures, tx.signatures);
        assert_eq!(parsed.serialize(None).unwrap(), wire);
        // Signatures still verify against the re-serialized message.
        assert_eq!(parsed.verify(None), Ok(true));
    }

    #[test]
    fn base64_roundtrip() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);
        let wire = tx.build(&[&fee_payer], Some(&tables)).unwrap();

        let encoded = BASE64_STANDARD.encode(&wire);
        let parsed = VersionedTransaction::from_base64(&encoded).unwrap();
        assert_eq!(parsed.serialize(None).unwrap(), wire);
    }

    #[test]
    fn from_base64_rejects_garbage() {
        assert!(matches!(
            VersionedTransaction::from_base64("not!base64!"),
            Err(TransactionError::Base64(_))
        ));
    }

    #[test]
    fn deserialize_rejects_short_signature_section() {
        let mut bytes = vec![2u8];
        bytes.extend_from_slice(&[0u8; SIGNATURE_BYTES]);
        // Second signature is missing.
        assert_eq!(
            VersionedTransaction::deserialize(&bytes),
            Err(TransactionError::NotEnoughSignatureBytes)
        );
    }

    #[test]
    fn deserialize_rejects_more_signatures_than_addresses() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);
        let wire = tx.build(&[&fee_payer], Some(&tables)).unwrap();

        // Forge a signature count of 3 over a message with only two
        // static addresses.
        let mut forged = vec![3u8];
        forged.extend_from_slice(&wire[1..=SIGNATURE_BYTES]);
        forged.extend_from_slice(&[0u8; SIGNATURE_BYTES]);
        forged.extend_from_slice(&[0u8; SIGNATURE_BYTES]);
        forged.extend_from_slice(&wire[SIGNATURE_BYTES + 1..]);

        assert_eq!(
            VersionedTransaction::deserialize(&forged),
            Err(TransactionError::TooManySignatures)
        );
    }

    #[test]
    fn populate_reconstructs_nonce_information() {
        let fee_payer = Keypair::new();
        let nonce_account = Address::new_unique();
        let nonce_authority = fee_payer.address();
        let system_program = Address::new_unique();
        let nonce = Hash::new_unique();

        let advance_ix = Instruction::new_with_bytes(
            system_program,
            &[4, 0, 0, 0],
            vec![
                AccountMeta::new(nonce_account, false),
                AccountMeta::new_readonly(*RECENT_BLOCKHASHES_ID, false),
                AccountMeta::new_readonly(nonce_authority, true),
            ],
        );
        let transfer_ix = Instruction::new_with_bytes(
            system_program,
            &[2, 0, 0, 0],
            vec![AccountMeta::new(fee_payer.address(), true)],
        );

        let mut tx = VersionedTransaction::new(
            fee_payer.address(),
            Hash::new_unique(),
            vec![transfer_ix.clone()],
        );
        tx.nonce_information = Some(NonceInformation {
            nonce,
            instruction: advance_ix,
        });
        let wire = tx.build(&[&fee_payer], Some(&[])).unwrap();

        let parsed = VersionedTransaction::deserialize(&wire).unwrap();
        let nonce_info = parsed.nonce_information.expect("nonce information");
        assert_eq!(nonce_info.nonce, nonce);
        // The advance instruction is carried in the nonce information,
        // not in the instruction list.
        assert_eq!(parsed.instructions.len(), 1);
        assert_eq!(parsed.instructions[0].data, transfer_ix.data);
        assert_eq!(parsed.recent_blockhash, nonce);
    }

    #[test]
    fn populate_omits_looked_up_account_references() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);
        let wire = tx.build(&[&fee_payer], Some(&tables)).unwrap();

        let parsed = VersionedTransaction::deserialize(&wire).unwrap();
        // The looked-up read-only account cannot be reconstructed, so
        // only the fee payer reference survives.
        assert_eq!(parsed.instructions.len(), 1);
        assert_eq!(parsed.instructions[0].accounts.len(), 1);
        assert_eq!(
            parsed.instructions[0].accounts[0].pubkey,
            fee_payer.address()
        );
        assert!(parsed.instructions[0].accounts[0].is_signer);
        assert_eq!(parsed.address_table_lookups, tx.address_table_lookups);
    }

    #[test]
    fn sign_with_stale_message_reuses_it() {
        let fee_payer = Keypair::new();
        let (mut tx, tables) = test_transaction(&fee_payer);
        tx.sign(&[&fee_payer], Some(&tables)).unwrap();
        let first_bytes = tx.compile_message(None).unwrap();

        // A second signer can join without recompiling.
        let co_signer = Keypair::new();
        tx.sign(&[&co_signer], None).unwrap();
        assert_eq!(tx.compile_message(None).unwrap(), first_bytes);
        assert_eq!(tx.signatures.len(), 2);
        assert!(tx.verify_against(&first_bytes));
    }

    #[test]
    fn sysvar_address_parses() {
        assert_eq!(
            RECENT_BLOCKHASHES_ID.to_string(),
            "SysvarRecentB1ockHashes11111111111111111111"
        );
    }
}
