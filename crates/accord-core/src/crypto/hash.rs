//! Content hashing for proposal commitments
//!
//! Every commitment in Accord (component leaves, Merkle nodes, nonces,
//! proposal ids) goes through this module so the algorithm is declared once.
//!
//! Current algorithm: **SHA-256** (32-byte output)

use sha2::{Digest, Sha256};
use std::fmt;

/// 32-byte digest
pub type Hash32 = [u8; 32];

/// Domain-separated hashing algorithm
pub trait HashAlgorithm: Send + Sync + fmt::Debug {
    /// Hash arbitrary bytes to a 32-byte digest
    fn hash(&self, data: &[u8]) -> Hash32;

    /// Hash the concatenation of several parts without allocating the joined buffer
    fn hash_parts(&self, parts: &[&[u8]]) -> Hash32;
}

/// SHA-256 implementation
#[derive(Debug, Clone, Copy)]
pub struct Sha256Algorithm;

impl HashAlgorithm for Sha256Algorithm {
    fn hash(&self, data: &[u8]) -> Hash32 {
        self.hash_parts(&[data])
    }

    fn hash_parts(&self, parts: &[&[u8]]) -> Hash32 {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        let result = hasher.finalize();
        let mut output = [0u8; 32];
        output.copy_from_slice(&result);
        output
    }
}

/// The hash algorithm used throughout the system.
pub const ALGORITHM: Sha256Algorithm = Sha256Algorithm;

/// Hash bytes with the global algorithm
#[inline]
pub fn hash(data: &[u8]) -> Hash32 {
    ALGORITHM.hash(data)
}

/// Hash the concatenation of `parts` with the global algorithm
#[inline]
pub fn hash_parts(parts: &[&[u8]]) -> Hash32 {
    ALGORITHM.hash_parts(parts)
}
