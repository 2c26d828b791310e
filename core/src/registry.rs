//! Token mapping registry
//!
//! Maps a legacy asset id to the successor asset and the quantum that scales its
//! balances. Entries are write-once and never removed. Several legacy ids may
//! point at the same asset address.

use alloy_primitives::{Address, U256, address};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::{Result, WithdrawalError};
use crate::quantum::check_quantum;

/// Sentinel address for the network's native asset.
pub const NATIVE_ASSET: Address = address!("eeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee");

/// Stored mapping for one legacy asset id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMapping {
    pub asset: Address,
    pub quantum: U256,
}

/// Registration request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMappingEntry {
    pub legacy_asset_id: U256,
    pub asset: Address,
    pub quantum: U256,
}

impl TokenMappingEntry {
    pub fn mapping(&self) -> TokenMapping {
        TokenMapping {
            asset: self.asset,
            quantum: self.quantum,
        }
    }
}

/// Validate a registration batch against itself and against `is_mapped`.
///
/// Any failure rejects the whole batch.
pub fn validate_entries<F>(entries: &[TokenMappingEntry], mut is_mapped: F) -> Result<()>
where
    F: FnMut(&U256) -> Result<bool>,
{
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        check_quantum(&entry.quantum)?;
        if entry.asset == Address::ZERO {
            return Err(WithdrawalError::ZeroAssetAddress {
                asset_id: entry.legacy_asset_id,
            });
        }
        if !seen.insert(entry.legacy_asset_id) {
            return Err(WithdrawalError::DuplicateMapping(entry.legacy_asset_id));
        }
        if is_mapped(&entry.legacy_asset_id)? {
            return Err(WithdrawalError::AssetAlreadyMapped(entry.legacy_asset_id));
        }
    }
    Ok(())
}
