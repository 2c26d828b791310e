//! Exodus Proofs
//!
//! Inclusion proofs for exiting a retired legacy ledger.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Exit Withdrawal                          │
//! │  ┌──────────────────────────┐   ┌────────────────────────────┐  │
//! │  │       Vault proof        │   │       Account proof        │  │
//! │  │ (owner, asset, balance)  │   │  (owner key ↔ address)     │  │
//! │  │ Pedersen, ordered pairs  │   │ Keccak, commutative pairs  │  │
//! │  └────────────┬─────────────┘   └──────────────┬─────────────┘  │
//! │               ▼                                ▼                │
//! │        VaultProofVerifier             AccountProofVerifier      │
//! │               │                                │                │
//! │               └──────────── owner key ─────────┘                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod account;
pub mod account_tree;
pub mod errors;
pub mod felt;
pub mod hasher;
pub mod vault;
pub mod vault_tree;

pub use account::{AccountAssociation, AccountProofVerifier, association_leaf, commutative_keccak256};
pub use account_tree::AccountTree;
pub use errors::{ProofError, Result};
pub use felt::{FIELD_PRIME, MASK_252, from_felt, is_field_element, to_felt};
pub use hasher::{FieldHasher, PedersenHasher};
pub use vault::{
    MAX_PROOF_LEN, MIN_PROOF_LEN, VaultProofVerifier, VaultRecord, decode_row, encode_row,
    encode_trailer,
};
pub use vault_tree::VaultTree;
