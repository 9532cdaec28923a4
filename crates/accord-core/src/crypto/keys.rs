//! Ed25519 identity keys
//!
//! `PartyKey` is the public half that appears in command signer lists and on
//! signatures; `KeyPair` never leaves the party that owns it.

use crate::{AccordError, Result};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte Ed25519 verifying key identifying a party
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyKey(pub [u8; 32]);

impl PartyKey {
    /// Raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Verify an Ed25519 signature made by this key over `message`
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let key = VerifyingKey::from_bytes(&self.0)
            .map_err(|e| AccordError::signature(format!("malformed key {self}: {e}")))?;
        let signature = ed25519_dalek::Signature::from_slice(signature)
            .map_err(|e| AccordError::signature(format!("malformed signature: {e}")))?;
        key.verify(message, &signature)
            .map_err(|_| AccordError::signature(format!("signature by {self} does not verify")))
    }
}

impl fmt::Display for PartyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &hex::encode(self.0)[..16])
    }
}

impl fmt::Debug for PartyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyKey({self})")
    }
}

/// Signing key pair held by a single party
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh key pair from the OS RNG
    pub fn generate() -> Self {
        let mut rng = rand::rngs::OsRng;
        Self {
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Deterministic key pair from a 32-byte seed
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Public half of this key pair
    pub fn public(&self) -> PartyKey {
        PartyKey(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign `message`, returning the 64 signature bytes
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public())
            .finish_non_exhaustive()
    }
}
