//! Merkle tree utilities for component commitments
//!
//! Leaves are already-hashed 32-byte values. An unpaired node at the end of a
//! level is promoted unchanged; proofs record which side each sibling sits on
//! so promoted levels are simply skipped.

use super::hash::{hash_parts, Hash32};
use serde::{Deserialize, Serialize};

/// Maximum depth of a merkle tree (supports up to 2^32 leaves)
pub const MAX_MERKLE_DEPTH: usize = 32;

/// Root used for an empty component group
pub const EMPTY_ROOT: Hash32 = [0u8; 32];

/// Which side of the running hash a sibling sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Sibling is the left child
    Left,
    /// Sibling is the right child
    Right,
}

/// One step of a Merkle path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// Sibling hash at this level
    pub sibling: Hash32,
    /// Position of the sibling
    pub side: Side,
}

/// Inclusion proof for a single leaf
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Sibling path from leaf to root
    pub path: Vec<ProofStep>,
}

fn node(left: &Hash32, right: &Hash32) -> Hash32 {
    hash_parts(&[left, right])
}

/// Build a Merkle root over pre-hashed leaves
pub fn merkle_root(leaves: &[Hash32]) -> Hash32 {
    if leaves.is_empty() {
        return EMPTY_ROOT;
    }

    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => node(left, right),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
    }
    level[0]
}

/// Generate an inclusion proof for `leaves[index]`
///
/// Returns `None` if `index` is out of bounds.
pub fn merkle_proof(leaves: &[Hash32], index: usize) -> Option<MerkleProof> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut position = index;

    while level.len() > 1 {
        let sibling = position ^ 1;
        if sibling < level.len() {
            let side = if position % 2 == 0 {
                Side::Right
            } else {
                Side::Left
            };
            path.push(ProofStep {
                sibling: level[sibling],
                side,
            });
        }

        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => node(left, right),
                [single] => *single,
                _ => unreachable!("chunks(2) yields one or two items"),
            })
            .collect();
        position /= 2;
    }

    Some(MerkleProof { path })
}

/// Sibling sides a proof for `leaves[index]` carries in a tree of `leaf_count` leaves
///
/// Whether a level is skipped depends only on the parent position and the
/// level width, so distinct indices always yield distinct side sequences.
/// Returns `None` if `index` is out of bounds.
pub fn path_sides(leaf_count: usize, index: usize) -> Option<Vec<Side>> {
    if index >= leaf_count {
        return None;
    }

    let mut sides = Vec::new();
    let mut width = leaf_count;
    let mut position = index;
    while width > 1 {
        if position ^ 1 < width {
            sides.push(if position % 2 == 0 {
                Side::Right
            } else {
                Side::Left
            });
        }
        width = width.div_ceil(2);
        position /= 2;
    }
    Some(sides)
}

/// Verify that `leaf` is included under `root`
pub fn verify_merkle_proof(proof: &MerkleProof, root: &Hash32, leaf: &Hash32) -> bool {
    if proof.path.len() > MAX_MERKLE_DEPTH {
        return false;
    }

    let computed = proof
        .path
        .iter()
        .fold(*leaf, |current, step| match step.side {
            Side::Left => node(&step.sibling, &current),
            Side::Right => node(&current, &step.sibling),
        });
    &computed == root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::hash;
    use proptest::prelude::*;

    fn leaves(n: usize) -> Vec<Hash32> {
        (0..n).map(|i| hash(&(i as u64).to_le_bytes())).collect()
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(merkle_root(&[]), EMPTY_ROOT);
        let one = leaves(1);
        assert_eq!(merkle_root(&one), one[0]);
        let proof = merkle_proof(&one, 0).unwrap();
        assert!(proof.path.is_empty());
        assert!(verify_merkle_proof(&proof, &one[0], &one[0]));
    }

    #[test]
    fn test_promoted_leaf_verifies() {
        // Leaf 2 of 3 is promoted past the first level.
        let l = leaves(3);
        let root = merkle_root(&l);
        let proof = merkle_proof(&l, 2).unwrap();
        assert_eq!(proof.path.len(), 1);
        assert_eq!(proof.path[0].side, Side::Left);
        assert!(verify_merkle_proof(&proof, &root, &l[2]));
    }

    #[test]
    fn test_out_of_bounds() {
        assert!(merkle_proof(&leaves(4), 4).is_none());
    }

    #[test]
    fn test_path_sides_identify_position() {
        for n in 1..=40 {
            let all: Vec<Vec<Side>> = (0..n).map(|i| path_sides(n, i).unwrap()).collect();
            for i in 0..n {
                for j in (i + 1)..n {
                    assert_ne!(all[i], all[j], "leaves {i} and {j} of {n} share a path shape");
                }
            }
        }
        assert!(path_sides(3, 3).is_none());
    }

    proptest! {
        #[test]
        fn prop_path_sides_match_proofs(n in 1usize..40, pick in 0usize..40) {
            let l = leaves(n);
            let index = pick % n;
            let proof = merkle_proof(&l, index).unwrap();
            let sides: Vec<Side> = proof.path.iter().map(|step| step.side).collect();
            prop_assert_eq!(path_sides(n, index), Some(sides));
        }

        #[test]
        fn prop_every_leaf_verifies(n in 1usize..40, pick in 0usize..40) {
            let l = leaves(n);
            let index = pick % n;
            let root = merkle_root(&l);
            let proof = merkle_proof(&l, index).unwrap();
            prop_assert!(verify_merkle_proof(&proof, &root, &l[index]));
        }

        #[test]
        fn prop_wrong_leaf_fails(n in 2usize..40, pick in 0usize..40) {
            let l = leaves(n);
            let index = pick % n;
            let other = (index + 1) % n;
            let root = merkle_root(&l);
            let proof = merkle_proof(&l, index).unwrap();
            prop_assert!(!verify_merkle_proof(&proof, &root, &l[other]));
        }
    }
}
