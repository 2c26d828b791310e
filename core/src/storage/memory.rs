use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use std::collections::{HashMap, HashSet};

use crate::claims::ClaimRecord;
use crate::registry::TokenMapping;
use crate::roles::RoleSet;
use crate::storage::{ProcessorMeta, StateBatch, StateStore};

/// In-memory state store. Used by tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    meta: Option<ProcessorMeta>,
    token_mappings: HashMap<U256, TokenMapping>,
    claims: HashMap<B256, ClaimRecord>,
    balances: HashMap<(Address, Address), U256>,
    roles: HashMap<Address, RoleSet>,
    native_rejections: HashSet<Address>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }
}

impl StateStore for MemoryStore {
    fn meta(&self) -> Result<Option<ProcessorMeta>> {
        Ok(self.meta.clone())
    }

    fn token_mapping(&self, asset_id: &U256) -> Result<Option<TokenMapping>> {
        Ok(self.token_mappings.get(asset_id).copied())
    }

    fn claim(&self, key: &B256) -> Result<Option<ClaimRecord>> {
        Ok(self.claims.get(key).cloned())
    }

    fn balance(&self, asset: &Address, holder: &Address) -> Result<U256> {
        Ok(self
            .balances
            .get(&(*asset, *holder))
            .copied()
            .unwrap_or_default())
    }

    fn roles(&self, account: &Address) -> Result<RoleSet> {
        Ok(self.roles.get(account).copied().unwrap_or_default())
    }

    fn rejects_native(&self, account: &Address) -> Result<bool> {
        Ok(self.native_rejections.contains(account))
    }

    fn apply_batch(&mut self, batch: StateBatch) -> Result<()> {
        if let Some(meta) = batch.meta {
            self.meta = Some(meta);
        }
        self.token_mappings.extend(batch.token_mappings);
        self.claims.extend(batch.claims);
        for (asset, holder, balance) in batch.balances {
            self.balances.insert((asset, holder), balance);
        }
        for (account, roles) in batch.roles {
            if roles.is_empty() {
                self.roles.remove(&account);
            } else {
                self.roles.insert(account, roles);
            }
        }
        for (account, rejects) in batch.native_rejections {
            if rejects {
                self.native_rejections.insert(account);
            } else {
                self.native_rejections.remove(&account);
            }
        }
        Ok(())
    }
}
