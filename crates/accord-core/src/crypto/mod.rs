//! Cryptographic building blocks: hashing, Merkle commitments, Ed25519 keys

pub mod hash;
pub mod keys;
pub mod merkle;

pub use hash::{hash, hash_parts, Hash32};
pub use keys::{KeyPair, PartyKey};
pub use merkle::{merkle_proof, merkle_root, path_sides, verify_merkle_proof, MerkleProof, Side};
