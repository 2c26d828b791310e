//! Vault Proofs
//!
//! Verifies that a vault (owner key, asset id, quantized balance) is a leaf of the
//! legacy balance tree. Unlike a plain Merkle path, the proof carries every node on
//! the branch *and* its sibling, so each row can be checked against the next one.
//!
//! ```text
//! +---------------------------+---------------------------+-----------+
//! | owner_key (252)           | asset_id (252)            | zeros (8) |
//! +---------------------------+---------------------------+-----------+
//! | H(owner_key, asset) (252) | quantized_balance (252)   | zeros (8) |
//! +---------------------------+---------------------------+-----------+
//! | left_node_0 (252)         | right_node_0 (252)        | zeros (8) |
//! +---------------------------+---------------------------+-----------+
//! | ...                                                               |
//! +---------------------------+---------------------------+-----------+
//! | left_node_h-1 (252)       | right_node_h-1 (252)      | zeros (8) |
//! +---------------------------+-----------+---------------+-----------+
//! | root (252)                | zeros (4) | vault_id (248)| zeros (8) |
//! +---------------------------+-----------+---------------+-----------+
//! ```
//!
//! Each row spans two 256-bit words. The verifier never looks at a stored root:
//! the caller compares the root it extracts with the one it trusts.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::errors::{ProofError, Result};
use crate::felt::{MASK_252, from_felt, is_field_element, to_felt};
use crate::hasher::{FieldHasher, PedersenHasher};

/// Shortest accepted proof: two leaf rows, 31 path rows and the trailer.
pub const MIN_PROOF_LEN: usize = 68;

/// Proofs must be strictly shorter than this (tree height up to 96).
pub const MAX_PROOF_LEN: usize = 200;

/// A leaf of the legacy balance tree as claimed by a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    pub owner_key: U256,
    pub asset_id: U256,
    pub quantized_balance: U256,
    /// Leaf position in the tree
    pub vault_id: U256,
}

/// Pack a row as `left (252) | right (252) | zeros (8)`.
pub fn encode_row(left: U256, right: U256) -> [U256; 2] {
    [(left << 4) | (right >> 248), right << 8]
}

/// Split a row back into its two 252-bit halves.
pub fn decode_row(word0: U256, word1: U256) -> (U256, U256) {
    let left: U256 = word0 >> 4;
    let right: U256 = (((word0 & U256::from(0xfu64)) << 248) | (word1 >> 8)) & MASK_252;
    (left, right)
}

/// Pack the final row holding the root and the leaf index.
pub fn encode_trailer(root: U256, vault_id: U256) -> [U256; 2] {
    [root << 4, vault_id << 8]
}

/// Number of hashes a proof of `len` words replays.
#[inline]
fn hash_count(len: usize) -> usize {
    (len - 2) / 2
}

fn check_length(len: usize) -> Result<()> {
    if len < MIN_PROOF_LEN {
        return Err(ProofError::ProofTooShort { len });
    }
    if len >= MAX_PROOF_LEN {
        return Err(ProofError::ProofTooLong { len });
    }
    if len % 2 != 0 {
        return Err(ProofError::ProofLengthOdd { len });
    }
    Ok(())
}

/// Verifier for vault inclusion proofs
#[derive(Debug, Clone, Default)]
pub struct VaultProofVerifier<H: FieldHasher = PedersenHasher> {
    hasher: H,
}

impl<H: FieldHasher> VaultProofVerifier<H> {
    pub fn new(hasher: H) -> Self {
        Self { hasher }
    }

    /// Decode the leaf without checking the path.
    pub fn extract_leaf(&self, proof: &[U256]) -> Result<VaultRecord> {
        self.extract_leaf_and_root(proof).map(|(leaf, _)| leaf)
    }

    /// Decode the claimed root without checking the path.
    pub fn extract_root(&self, proof: &[U256]) -> Result<U256> {
        self.extract_leaf_and_root(proof).map(|(_, root)| root)
    }

    /// Decode leaf and root. Shape, leaf index and key/asset validity are checked;
    /// the Merkle path is not.
    pub fn extract_leaf_and_root(&self, proof: &[U256]) -> Result<(VaultRecord, U256)> {
        let len = proof.len();
        check_length(len)?;

        let height = hash_count(len) - 2;
        let vault_id: U256 = proof[len - 1] >> 8;
        if vault_id >= (U256::from(1u64) << height) {
            return Err(ProofError::VaultIdOutOfRange { vault_id, height });
        }

        let (owner_key, asset_id) = decode_row(proof[0], proof[1]);
        if !is_field_element(&owner_key) || !is_field_element(&asset_id) {
            return Err(ProofError::BadKeyOrAsset { owner_key, asset_id });
        }

        let (_, quantized_balance) = decode_row(proof[2], proof[3]);
        let (root, _) = decode_row(proof[len - 2], proof[len - 1]);

        let leaf = VaultRecord {
            owner_key,
            asset_id,
            quantized_balance,
            vault_id,
        };
        Ok((leaf, root))
    }

    /// Replay every row of the proof. Returns the decoded leaf on success.
    pub fn verify(&self, proof: &[U256]) -> Result<VaultRecord> {
        let (leaf, _) = self.extract_leaf_and_root(proof)?;
        let n_hashes = hash_count(proof.len());

        // Row 0 always feeds the left slot of row 1; after that the leaf index picks the side.
        let selectors: U256 = leaf.vault_id << 1usize;

        for row in 0..n_hashes {
            let (left, right) = decode_row(proof[2 * row], proof[2 * row + 1]);
            let left = to_felt(&left).ok_or(ProofError::BadMerklePath { row })?;
            let right = to_felt(&right).ok_or(ProofError::BadMerklePath { row })?;
            let node = from_felt(&self.hasher.hash(&left, &right));

            let (next_left, next_right) = decode_row(proof[2 * row + 2], proof[2 * row + 3]);
            let expected = if selectors.bit(row) { next_right } else { next_left };

            if node != expected {
                log::debug!("vault proof diverges at row {row} of {n_hashes}");
                return Err(ProofError::BadMerklePath { row });
            }
        }

        Ok(leaf)
    }

    /// `true` iff `verify` succeeds.
    pub fn is_valid(&self, proof: &[U256]) -> bool {
        self.verify(proof).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_layout_conformance() {
        // left = 1, right = 2 → 0x10 | 0 and 2 << 8
        let [w0, w1] = encode_row(U256::from(1u64), U256::from(2u64));
        assert_eq!(w0, U256::from(0x10u64));
        assert_eq!(w1, U256::from(0x200u64));

        // A right half with its top nibble set spills into the low nibble of word 0.
        let right: U256 = U256::from(0xau64) << 248 | U256::from(0xbcu64);
        let [w0, w1] = encode_row(U256::from(3u64), right);
        assert_eq!(w0, U256::from(0x3au64));
        assert_eq!(w1, U256::from(0xbc00u64));
        assert_eq!(decode_row(w0, w1), (U256::from(3u64), right));
    }

    #[test]
    fn test_trailer_layout_conformance() {
        let [w0, w1] = encode_trailer(U256::from(0xabcu64), U256::from(5u64));
        assert_eq!(w0, U256::from(0xabc0u64));
        assert_eq!(w1, U256::from(0x500u64));
        assert_eq!(decode_row(w0, w1).0, U256::from(0xabcu64));
    }

    #[test]
    fn test_decode_ignores_padding_bits() {
        let [w0, w1] = encode_row(U256::from(9u64), U256::from(4u64));
        assert_eq!(decode_row(w0, w1 | U256::from(0xffu64)), (U256::from(9u64), U256::from(4u64)));
    }

    #[test]
    fn test_length_classification() {
        let verifier = VaultProofVerifier::<PedersenHasher>::default();

        assert_eq!(
            verifier.verify(&vec![U256::ZERO; 67]),
            Err(ProofError::ProofTooShort { len: 67 })
        );
        assert_eq!(
            verifier.verify(&vec![U256::ZERO; 69]),
            Err(ProofError::ProofLengthOdd { len: 69 })
        );
        assert_eq!(
            verifier.verify(&vec![U256::ZERO; 200]),
            Err(ProofError::ProofTooLong { len: 200 })
        );
        assert_eq!(
            verifier.extract_root(&[]),
            Err(ProofError::ProofTooShort { len: 0 })
        );
    }

    #[test]
    fn test_vault_id_must_fit_height() {
        let verifier = VaultProofVerifier::<PedersenHasher>::default();
        let mut proof = vec![U256::ZERO; MIN_PROOF_LEN];
        let [_, w1] = encode_trailer(U256::ZERO, U256::from(1u64) << 31);
        proof[MIN_PROOF_LEN - 1] = w1;

        assert_eq!(
            verifier.extract_leaf(&proof),
            Err(ProofError::VaultIdOutOfRange {
                vault_id: U256::from(1u64) << 31,
                height: 31
            })
        );
    }

    #[test]
    fn test_key_above_prime_rejected() {
        let verifier = VaultProofVerifier::<PedersenHasher>::default();
        let mut proof = vec![U256::ZERO; MIN_PROOF_LEN];
        let [w0, w1] = encode_row(MASK_252, U256::from(1u64));
        proof[0] = w0;
        proof[1] = w1;

        assert!(matches!(
            verifier.extract_leaf_and_root(&proof),
            Err(ProofError::BadKeyOrAsset { .. })
        ));
    }
}
