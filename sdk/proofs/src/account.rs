//! Account association proofs
//!
//! Binds a legacy owner key to the external address that may receive its funds.
//! Nodes are hashed as `keccak256(min(a, b) || max(a, b))`, so proofs carry
//! siblings only and no direction bits.

use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};

use crate::errors::{ProofError, Result};

/// An `(owner_key, external_address)` leaf of the association tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountAssociation {
    pub owner_key: U256,
    pub external_address: Address,
}

impl AccountAssociation {
    pub fn new(owner_key: U256, external_address: Address) -> Self {
        Self {
            owner_key,
            external_address,
        }
    }

    pub fn leaf(&self) -> B256 {
        association_leaf(self.owner_key, self.external_address)
    }
}

/// Hash two words after sorting them, so `f(a, b) == f(b, a)`.
pub fn commutative_keccak256(a: &B256, b: &B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Leaf for an association: the owner key word paired with the left-padded address.
pub fn association_leaf(owner_key: U256, address: Address) -> B256 {
    commutative_keccak256(&B256::from(owner_key), &address.into_word())
}

/// Stateless verifier for association proofs
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountProofVerifier;

impl AccountProofVerifier {
    /// Fold `proof` onto `leaf` and return the resulting root.
    pub fn process_proof(leaf: B256, proof: &[B256]) -> B256 {
        proof
            .iter()
            .fold(leaf, |node, sibling| commutative_keccak256(&node, sibling))
    }

    pub fn verify(
        &self,
        owner_key: U256,
        external_address: Address,
        root: B256,
        proof: &[B256],
    ) -> Result<()> {
        let computed = Self::process_proof(association_leaf(owner_key, external_address), proof);
        if computed != root {
            log::debug!("account proof folds to {computed}, expected {root}");
            return Err(ProofError::InvalidAccountProof {
                owner_key,
                address: external_address,
            });
        }
        Ok(())
    }
}
