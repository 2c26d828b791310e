use alloy_primitives::{Address, B256, U256};
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::claims::ClaimRecord;
use crate::registry::TokenMapping;
use crate::roles::RoleSet;

/// Singleton processor record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorMeta {
    /// Address holding the processor's funds
    pub address: Address,
    /// Zero until set
    pub vault_root: U256,
    /// Zero until set
    pub account_root: B256,
    pub root_override_allowed: bool,
    pub paused: bool,
}

/// Writes staged by one operation, committed together or not at all
#[derive(Debug, Default, Clone)]
pub struct StateBatch {
    pub meta: Option<ProcessorMeta>,
    pub token_mappings: Vec<(U256, TokenMapping)>,
    pub claims: Vec<(B256, ClaimRecord)>,
    /// (asset, holder, new balance)
    pub balances: Vec<(Address, Address, U256)>,
    pub roles: Vec<(Address, RoleSet)>,
    pub native_rejections: Vec<(Address, bool)>,
}

impl StateBatch {
    pub fn is_empty(&self) -> bool {
        self.meta.is_none()
            && self.token_mappings.is_empty()
            && self.claims.is_empty()
            && self.balances.is_empty()
            && self.roles.is_empty()
            && self.native_rejections.is_empty()
    }
}

/// decoupling processor logic from the db
pub trait StateStore {
    /// `None` until a processor has been created in this store.
    fn meta(&self) -> Result<Option<ProcessorMeta>>;

    fn token_mapping(&self, asset_id: &U256) -> Result<Option<TokenMapping>>;

    fn claim(&self, key: &B256) -> Result<Option<ClaimRecord>>;

    /// Missing balances read as zero.
    fn balance(&self, asset: &Address, holder: &Address) -> Result<U256>;

    fn roles(&self, account: &Address) -> Result<RoleSet>;

    /// Whether `account` refuses inbound native value.
    fn rejects_native(&self, account: &Address) -> Result<bool>;

    /// Atomically apply every write in `batch`.
    fn apply_batch(&mut self, batch: StateBatch) -> Result<()>;
}

/// Credit `holder` outside of any processor operation.
///
/// Stands in for the successor network issuing or bridging funds to an address.
pub fn mint<S: StateStore + ?Sized>(
    store: &mut S,
    asset: Address,
    holder: Address,
    amount: U256,
) -> Result<U256> {
    let current = store.balance(&asset, &holder)?;
    let updated = current
        .checked_add(amount)
        .ok_or_else(|| anyhow::anyhow!("balance overflow minting to {holder}"))?;
    store.apply_batch(StateBatch {
        balances: vec![(asset, holder, updated)],
        ..StateBatch::default()
    })?;
    Ok(updated)
}

/// Mark whether `account` refuses inbound native transfers.
pub fn set_rejects_native<S: StateStore + ?Sized>(
    store: &mut S,
    account: Address,
    rejects: bool,
) -> Result<()> {
    store.apply_batch(StateBatch {
        native_rejections: vec![(account, rejects)],
        ..StateBatch::default()
    })
}
