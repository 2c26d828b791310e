//! Processed claim registry entries.

use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Serialize};

/// `keccak256(abi.encode(owner_key, asset_id))`
pub fn claim_key(owner_key: U256, asset_id: U256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&owner_key.to_be_bytes::<32>());
    buf[32..].copy_from_slice(&asset_id.to_be_bytes::<32>());
    keccak256(buf)
}

/// Audit record written once per `(owner_key, asset_id)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub owner_key: U256,
    pub asset_id: U256,
    pub recipient: Address,
    pub asset: Address,
    pub amount: U256,
}

impl ClaimRecord {
    pub fn key(&self) -> B256 {
        claim_key(self.owner_key, self.asset_id)
    }
}
