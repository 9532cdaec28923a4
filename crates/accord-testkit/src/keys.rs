//! Deterministic identities for tests

use accord_core::{KeyPair, Party};

/// Seed byte of Alice's key
pub const ALICE_SEED: u8 = 1;
/// Seed byte of Bob's key
pub const BOB_SEED: u8 = 2;
/// Seed byte of the oracle's key
pub const ORACLE_SEED: u8 = 3;
/// Seed byte of the notary's key
pub const NOTARY_SEED: u8 = 9;

/// Key pair derived from a repeated seed byte
pub fn test_keys(seed: u8) -> KeyPair {
    KeyPair::from_seed([seed; 32])
}

/// Party named `name` owning `test_keys(seed)`
pub fn test_party(name: &str, seed: u8) -> Party {
    Party::new(name, test_keys(seed).public())
}
