//! Sparse vault tree
//!
//! Off-chain side of the vault proof: commits vault records under the Pedersen
//! hash and emits proofs in the row layout `VaultProofVerifier` reads.
//!
//! ```text
//!   leaf = H(H(owner_key, asset_id), quantized_balance)
//!   empty leaf = H(H(0, 0), 0)
//! ```

use alloy_primitives::U256;
use starknet_ff::FieldElement;
use std::collections::HashMap;

use crate::errors::{ProofError, Result};
use crate::felt::{from_felt, to_felt};
use crate::hasher::{FieldHasher, PedersenHasher};
use crate::vault::{MAX_PROOF_LEN, MIN_PROOF_LEN, VaultRecord, encode_row, encode_trailer};

/// Lowest height whose proofs reach `MIN_PROOF_LEN` words.
pub const MIN_HEIGHT: usize = (MIN_PROOF_LEN - 6) / 2;

/// Highest height whose proofs stay below `MAX_PROOF_LEN` words.
pub const MAX_HEIGHT: usize = (MAX_PROOF_LEN - 8) / 2;

/// Sparse Merkle tree of vaults. Only non-empty nodes are stored.
pub struct VaultTree<H: FieldHasher = PedersenHasher> {
    height: usize,
    hasher: H,
    /// Non-empty nodes: (level, index) -> hash
    nodes: HashMap<(usize, U256), FieldElement>,
    leaves: HashMap<U256, VaultRecord>,
    /// Root of an empty subtree at each level
    empty_roots: Vec<FieldElement>,
}

impl VaultTree<PedersenHasher> {
    pub fn new(height: usize) -> Result<Self> {
        Self::with_hasher(height, PedersenHasher)
    }
}

impl<H: FieldHasher> VaultTree<H> {
    pub fn with_hasher(height: usize, hasher: H) -> Result<Self> {
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
            return Err(ProofError::InvalidTreeHeight(height));
        }

        let zero = FieldElement::ZERO;
        let mut empty_roots = Vec::with_capacity(height + 1);
        empty_roots.push(hasher.hash(&hasher.hash(&zero, &zero), &zero));
        for level in 0..height {
            let below = empty_roots[level];
            empty_roots.push(hasher.hash(&below, &below));
        }

        Ok(Self {
            height,
            hasher,
            nodes: HashMap::new(),
            leaves: HashMap::new(),
            empty_roots,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn root(&self) -> U256 {
        from_felt(&self.node(self.height, &U256::ZERO))
    }

    pub fn get(&self, vault_id: &U256) -> Option<&VaultRecord> {
        self.leaves.get(vault_id)
    }

    /// Insert or replace the vault at `record.vault_id`.
    pub fn insert(&mut self, record: VaultRecord) -> Result<()> {
        if record.vault_id >= (U256::from(1u64) << self.height) {
            return Err(ProofError::VaultIdOutOfRange {
                vault_id: record.vault_id,
                height: self.height,
            });
        }

        let (key_asset, balance) = self.leaf_inputs(&record)?;
        let mut current = self.hasher.hash(&key_asset, &balance);
        let mut index = record.vault_id;
        self.nodes.insert((0, index), current);

        for level in 0..self.height {
            let sibling = self.node(level, &(index ^ U256::from(1u64)));
            current = if index.bit(0) {
                self.hasher.hash(&sibling, &current)
            } else {
                self.hasher.hash(&current, &sibling)
            };
            index >>= 1;
            self.nodes.insert((level + 1, index), current);
        }

        self.leaves.insert(record.vault_id, record);
        Ok(())
    }

    /// Build the row-encoded proof for a stored vault.
    pub fn proof(&self, vault_id: &U256) -> Option<Vec<U256>> {
        let record = self.leaves.get(vault_id)?;
        let (key_asset, _) = self.leaf_inputs(record).ok()?;

        let mut proof = Vec::with_capacity(2 * self.height + 6);
        proof.extend(encode_row(record.owner_key, record.asset_id));
        proof.extend(encode_row(from_felt(&key_asset), record.quantized_balance));

        let mut index = *vault_id;
        for level in 0..self.height {
            let node = from_felt(&self.node(level, &index));
            let sibling = from_felt(&self.node(level, &(index ^ U256::from(1u64))));
            let row = if index.bit(0) {
                encode_row(sibling, node)
            } else {
                encode_row(node, sibling)
            };
            proof.extend(row);
            index >>= 1;
        }

        proof.extend(encode_trailer(self.root(), *vault_id));
        Some(proof)
    }

    fn node(&self, level: usize, index: &U256) -> FieldElement {
        self.nodes
            .get(&(level, *index))
            .copied()
            .unwrap_or(self.empty_roots[level])
    }

    fn leaf_inputs(&self, record: &VaultRecord) -> Result<(FieldElement, FieldElement)> {
        let owner_key = to_felt(&record.owner_key);
        let asset_id = to_felt(&record.asset_id);
        let (Some(owner_key), Some(asset_id)) = (owner_key, asset_id) else {
            return Err(ProofError::BadKeyOrAsset {
                owner_key: record.owner_key,
                asset_id: record.asset_id,
            });
        };
        let balance = to_felt(&record.quantized_balance)
            .ok_or(ProofError::InvalidFieldElement(record.quantized_balance))?;

        Ok((self.hasher.hash(&owner_key, &asset_id), balance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::VaultProofVerifier;

    fn record(vault_id: u64, balance: u64) -> VaultRecord {
        VaultRecord {
            owner_key: U256::from(0x1000u64 + vault_id),
            asset_id: U256::from(0xa55e7u64),
            quantized_balance: U256::from(balance),
            vault_id: U256::from(vault_id),
        }
    }

    #[test]
    fn test_height_bounds() {
        assert_eq!(MIN_HEIGHT, 31);
        assert_eq!(MAX_HEIGHT, 96);
        assert!(VaultTree::new(30).is_err());
        assert!(VaultTree::new(97).is_err());
    }

    #[test]
    fn test_proof_lengths_track_height() {
        let mut shallow = VaultTree::new(MIN_HEIGHT).unwrap();
        shallow.insert(record(0, 1)).unwrap();
        assert_eq!(shallow.proof(&U256::ZERO).unwrap().len(), MIN_PROOF_LEN);

        let mut deep = VaultTree::new(MAX_HEIGHT).unwrap();
        deep.insert(record(0, 1)).unwrap();
        assert_eq!(deep.proof(&U256::ZERO).unwrap().len(), MAX_PROOF_LEN - 2);
    }

    #[test]
    fn test_insert_and_verify() {
        let mut tree = VaultTree::new(MIN_HEIGHT).unwrap();
        tree.insert(record(0, 10)).unwrap();
        tree.insert(record(1, 20)).unwrap();
        tree.insert(record(77, 30)).unwrap();

        let verifier = VaultProofVerifier::<PedersenHasher>::default();
        for id in [0u64, 1, 77] {
            let proof = tree.proof(&U256::from(id)).unwrap();
            let leaf = verifier.verify(&proof).unwrap();
            assert_eq!(&leaf, tree.get(&U256::from(id)).unwrap());
            assert_eq!(verifier.extract_root(&proof).unwrap(), tree.root());
        }
    }

    #[test]
    fn test_root_changes_on_insert() {
        let mut tree = VaultTree::new(MIN_HEIGHT).unwrap();
        let empty = tree.root();

        tree.insert(record(3, 5)).unwrap();
        let first = tree.root();
        assert_ne!(empty, first, "root should change after insert");

        tree.insert(record(3, 6)).unwrap();
        assert_ne!(first, tree.root(), "replacing a vault should change the root");
    }

    #[test]
    fn test_missing_vault_has_no_proof() {
        let tree = VaultTree::new(MIN_HEIGHT).unwrap();
        assert!(tree.proof(&U256::from(4u64)).is_none());
    }

    #[test]
    fn test_out_of_range_vault_rejected() {
        let mut tree = VaultTree::new(MIN_HEIGHT).unwrap();
        let mut rec = record(0, 1);
        rec.vault_id = U256::from(1u64) << MIN_HEIGHT;
        assert!(matches!(
            tree.insert(rec),
            Err(ProofError::VaultIdOutOfRange { .. })
        ));
    }
}
