//! Ed25519 keypair and the [`Signer`] capability trait.
//!
//! The transaction layer treats signing as an opaque capability: anything
//! that can report an address and produce a signature over message bytes
//! can sign a transaction.

use {
    ed25519_dalek::Signer as DalekSigner,
    rand::rngs::OsRng,
    tachyon_address::Address,
    tachyon_signature::Signature,
};

/// Number of bytes in a keypair secret seed.
pub const SECRET_KEY_BYTES: usize = 32;

/// The opaque signing capability: `sign(message_bytes) -> signature`.
pub trait Signer {
    /// The address this signer's signatures verify against.
    fn address(&self) -> Address;
    /// Sign the given message bytes.
    fn sign_message(&self, message: &[u8]) -> Signature;
}

/// A vanilla Ed25519 keypair.
pub struct Keypair(ed25519_dalek::SigningKey);

impl Keypair {
    /// Constructs a new, random `Keypair` using `OsRng`.
    pub fn new() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut OsRng))
    }

    /// Recovers a `Keypair` from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; SECRET_KEY_BYTES]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&seed))
    }

    /// Returns this `Keypair`'s secret seed as a byte array.
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_BYTES] {
        self.0.to_bytes()
    }

    /// Returns this `Keypair`'s secret seed as a base58-encoded string.
    pub fn to_base58_string(&self) -> String {
        bs58::encode(self.0.to_bytes()).into_string()
    }

    /// Allows Keypair cloning.
    ///
    /// `Clone` is intentionally unimplemented because making a second copy
    /// of secret key material in memory is usually a bad idea. Only use
    /// this in tests or when strictly required.
    pub fn insecure_clone(&self) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&self.0.to_bytes()))
    }
}

impl Default for Keypair {
    fn default() -> Self {
        Self::new()
    }
}

impl Signer for Keypair {
    fn address(&self) -> Address {
        Address::new_from_array(self.0.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::from(self.0.sign(message).to_bytes())
    }
}

impl<T: Signer + ?Sized> Signer for &T {
    fn address(&self) -> Address {
        (**self).address()
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        (**self).sign_message(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let keypair = Keypair::new();
        let message = b"compile me";
        let signature = keypair.sign_message(message);
        assert!(signature.verify(keypair.address().as_ref(), message));
        assert!(!signature.verify(keypair.address().as_ref(), b"other message"));
    }

    #[test]
    fn signature_does_not_verify_against_other_key() {
        let keypair = Keypair::new();
        let other = Keypair::new();
        let signature = keypair.sign_message(b"payload");
        assert!(!signature.verify(other.address().as_ref(), b"payload"));
    }

    #[test]
    fn from_seed_is_deterministic() {
        let seed = [42u8; SECRET_KEY_BYTES];
        let a = Keypair::from_seed(seed);
        let b = Keypair::from_seed(seed);
        assert_eq!(a.address(), b.address());
        assert_eq!(a.sign_message(b"x"), b.sign_message(b"x"));
        assert_eq!(a.to_bytes(), seed);
    }

    #[test]
    fn insecure_clone_preserves_identity() {
        let keypair = Keypair::new();
        let clone = keypair.insecure_clone();
        assert_eq!(keypair.address(), clone.address());
    }
}
