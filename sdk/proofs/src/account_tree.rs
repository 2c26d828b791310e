//! Association tree builder
//!
//! Levels are built bottom-up with the commutative hash. A node without a
//! sibling is carried to the next level unchanged and adds nothing to proofs.

use alloy_primitives::{Address, B256, U256};

use crate::account::{AccountAssociation, commutative_keccak256};
use crate::errors::{ProofError, Result};

#[derive(Debug, Clone)]
pub struct AccountTree {
    associations: Vec<AccountAssociation>,
    /// levels[0] = leaves, last = [root]
    levels: Vec<Vec<B256>>,
}

impl AccountTree {
    pub fn new(associations: &[AccountAssociation]) -> Result<Self> {
        if associations.is_empty() {
            return Err(ProofError::EmptyTree);
        }

        let mut levels = vec![associations.iter().map(|a| a.leaf()).collect::<Vec<_>>()];
        while levels.last().map_or(0, Vec::len) > 1 {
            let below = &levels[levels.len() - 1];
            let next = below
                .chunks(2)
                .map(|pair| match pair.get(1) {
                    Some(right) => commutative_keccak256(&pair[0], right),
                    None => pair[0],
                })
                .collect();
            levels.push(next);
        }

        Ok(Self {
            associations: associations.to_vec(),
            levels,
        })
    }

    pub fn root(&self) -> B256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.associations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.associations.is_empty()
    }

    /// Sibling path for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.len() {
            return None;
        }

        let mut proof = Vec::with_capacity(self.levels.len());
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            if let Some(sibling) = level.get(idx ^ 1) {
                proof.push(*sibling);
            }
            idx /= 2;
        }
        Some(proof)
    }

    /// Proof for the first leaf matching `(owner_key, address)`.
    pub fn proof_for(&self, owner_key: U256, address: Address) -> Option<Vec<B256>> {
        let index = self
            .associations
            .iter()
            .position(|a| a.owner_key == owner_key && a.external_address == address)?;
        self.proof(index)
    }
}
