//! Error definitions for proof decoding and verification.
use alloy_primitives::{Address, U256};
use thiserror::Error;

use crate::vault::{MAX_PROOF_LEN, MIN_PROOF_LEN};

/// Errors raised while decoding or verifying an inclusion proof
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    /// Vault proof has fewer words than the shallowest supported tree needs
    #[error("Proof too short: {len} words (minimum {})", MIN_PROOF_LEN)]
    ProofTooShort { len: usize },

    /// Vault proof is at or above the maximum supported length
    #[error("Proof too long: {len} words (must be below {})", MAX_PROOF_LEN)]
    ProofTooLong { len: usize },

    /// Vault proofs are a series of word pairs
    #[error("Proof length must be even, got {len}")]
    ProofLengthOdd { len: usize },

    /// Leaf index does not fit the tree height implied by the proof length
    #[error("Vault id {vault_id} not in tree of height {height}")]
    VaultIdOutOfRange { vault_id: U256, height: usize },

    /// Owner key or asset id is not a valid field element
    #[error("Bad owner key or asset id: owner_key={owner_key:#x}, asset_id={asset_id:#x}")]
    BadKeyOrAsset { owner_key: U256, asset_id: U256 },

    /// The hash of a row does not match the node recorded in the next row
    #[error("Bad Merkle path at row {row}")]
    BadMerklePath { row: usize },

    /// The association proof does not fold to the expected root
    #[error("Invalid account proof for owner_key={owner_key:#x}, address={address}")]
    InvalidAccountProof { owner_key: U256, address: Address },

    /// Value is not below the field prime
    #[error("Not a field element: {0:#x}")]
    InvalidFieldElement(U256),

    /// Tree height outside the range the proof format supports
    #[error("Unsupported tree height: {0}")]
    InvalidTreeHeight(usize),

    /// Trees need at least one leaf
    #[error("Cannot build a tree without leaves")]
    EmptyTree,
}

/// Result type for proof operations
pub type Result<T> = std::result::Result<T, ProofError>;
