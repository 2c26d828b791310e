//! Withdrawal Processor
//!
//! Pays out legacy balances against two proofs: a vault proof for the balance
//! and an account proof binding the owner key to the recipient.
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Uninitialized│──>│ Configuring │──>│ Operational │<─>│  Paused  │
//! │  (no record) │   │ (root unset)│   │             │   │          │
//! └──────────────┘   └─────────────┘   └─────────────┘   └──────────┘
//! ```
//!
//! Every operation reads committed state, stages its writes in a `StateBatch`
//! and commits once. A failure anywhere before the commit leaves the store as
//! it was.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};

use exodus_proofs::{
    AccountProofVerifier, FieldHasher, PedersenHasher, VaultProofVerifier, is_field_element,
};

use crate::claims::{ClaimRecord, claim_key};
use crate::errors::{Result, WithdrawalError};
use crate::ledger::Ledger;
use crate::quantum::dequantize;
use crate::registry::{TokenMapping, TokenMappingEntry, validate_entries};
use crate::roles::{Role, RoleSet};
use crate::storage::{ProcessorMeta, StateBatch, StateStore};

/// Where the processor is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// No processor record in the store
    Uninitialized,
    /// Created, at least one root still unset
    Configuring,
    Operational,
    Paused,
}

/// Parameters fixed at creation
#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    pub address: Address,
    pub admin: Address,
    pub root_override_allowed: bool,
    /// Additional grants applied with the admin's
    pub grants: Vec<(Address, RoleSet)>,
}

/// Outcome of a successful withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    pub owner_key: U256,
    pub asset_id: U256,
    pub vault_id: U256,
    pub asset: Address,
    pub recipient: Address,
    pub quantized_balance: U256,
    pub amount: U256,
    pub claim_key: B256,
}

pub struct WithdrawalProcessor<S: StateStore, H: FieldHasher = PedersenHasher> {
    store: S,
    vault_verifier: VaultProofVerifier<H>,
    account_verifier: AccountProofVerifier,
}

/// Report the lifecycle of whatever is in `store`, processor or not.
pub fn lifecycle_of<S: StateStore + ?Sized>(store: &S) -> Result<Lifecycle> {
    Ok(match store.meta()? {
        None => Lifecycle::Uninitialized,
        Some(meta) if meta.paused => Lifecycle::Paused,
        Some(meta) if meta.vault_root.is_zero() || meta.account_root.is_zero() => {
            Lifecycle::Configuring
        }
        Some(_) => Lifecycle::Operational,
    })
}

impl<S: StateStore> WithdrawalProcessor<S, PedersenHasher> {
    /// Create a new processor record in an empty store.
    pub fn create(store: S, settings: ProcessorSettings) -> Result<Self> {
        Self::create_with_hasher(store, settings, PedersenHasher)
    }

    /// Open the processor already recorded in `store`.
    pub fn open(store: S) -> Result<Self> {
        Self::open_with_hasher(store, PedersenHasher)
    }
}

impl<S: StateStore, H: FieldHasher> WithdrawalProcessor<S, H> {
    pub fn create_with_hasher(mut store: S, settings: ProcessorSettings, hasher: H) -> Result<Self> {
        if store.meta()?.is_some() {
            return Err(WithdrawalError::AlreadyInitialized);
        }
        if settings.address == Address::ZERO || settings.admin == Address::ZERO {
            return Err(WithdrawalError::ZeroAddress);
        }

        let mut grants: Vec<(Address, RoleSet)> = Vec::new();
        let mut grant = |account: Address, roles: RoleSet| {
            match grants.iter_mut().find(|(a, _)| *a == account) {
                Some((_, existing)) => roles.iter().for_each(|r| existing.insert(r)),
                None => grants.push((account, roles)),
            }
        };
        grant(settings.admin, [Role::Admin].into_iter().collect());
        for (account, roles) in &settings.grants {
            if *account == Address::ZERO {
                return Err(WithdrawalError::ZeroAddress);
            }
            grant(*account, *roles);
        }

        let meta = ProcessorMeta {
            address: settings.address,
            vault_root: U256::ZERO,
            account_root: B256::ZERO,
            root_override_allowed: settings.root_override_allowed,
            paused: false,
        };
        store.apply_batch(StateBatch {
            meta: Some(meta),
            roles: grants,
            ..StateBatch::default()
        })?;

        log::info!(
            "Processor created at {} (admin {}, root override {})",
            settings.address,
            settings.admin,
            settings.root_override_allowed
        );
        Ok(Self::from_parts(store, hasher))
    }

    pub fn open_with_hasher(store: S, hasher: H) -> Result<Self> {
        if store.meta()?.is_none() {
            return Err(WithdrawalError::NotInitialized);
        }
        Ok(Self::from_parts(store, hasher))
    }

    fn from_parts(store: S, hasher: H) -> Self {
        Self {
            store,
            vault_verifier: VaultProofVerifier::new(hasher),
            account_verifier: AccountProofVerifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // Withdrawal
    // =========================================================================

    /// Verify both proofs and pay the vault's balance to `recipient`.
    pub fn verify_and_process_withdrawal(
        &mut self,
        caller: Address,
        recipient: Address,
        account_proof: &[B256],
        vault_proof: &[U256],
    ) -> Result<WithdrawalReceipt> {
        let result = self.process_withdrawal(caller, recipient, account_proof, vault_proof);
        match &result {
            Ok(receipt) => log::info!(
                "Withdrawal processed: owner_key={:#x} asset_id={:#x} amount={} to {}",
                receipt.owner_key,
                receipt.asset_id,
                receipt.amount,
                receipt.recipient
            ),
            Err(e) => log::warn!("Withdrawal rejected [{:?}]: {}", e.category(), e),
        }
        result
    }

    fn process_withdrawal(
        &mut self,
        caller: Address,
        recipient: Address,
        account_proof: &[B256],
        vault_proof: &[U256],
    ) -> Result<WithdrawalReceipt> {
        // Gates first, before any proof work
        self.require_role(&caller, Role::Disburse)?;
        let meta = self.meta()?;
        if meta.paused {
            return Err(WithdrawalError::Paused);
        }
        if recipient == Address::ZERO {
            return Err(WithdrawalError::ZeroRecipient);
        }
        if meta.vault_root.is_zero() {
            return Err(WithdrawalError::VaultRootNotSet);
        }
        if meta.account_root.is_zero() {
            return Err(WithdrawalError::AccountRootNotSet);
        }

        let (vault, claimed_root) = self.vault_verifier.extract_leaf_and_root(vault_proof)?;
        if claimed_root != meta.vault_root {
            return Err(WithdrawalError::VaultRootMismatch {
                stored: meta.vault_root,
                claimed: claimed_root,
            });
        }
        if vault.quantized_balance.is_zero() {
            return Err(WithdrawalError::ZeroBalance);
        }

        let mapping = self
            .store
            .token_mapping(&vault.asset_id)?
            .ok_or(WithdrawalError::AssetNotMapped(vault.asset_id))?;

        let key = claim_key(vault.owner_key, vault.asset_id);
        if self.store.claim(&key)?.is_some() {
            return Err(WithdrawalError::AlreadyProcessed {
                owner_key: vault.owner_key,
                asset_id: vault.asset_id,
            });
        }

        self.account_verifier
            .verify(vault.owner_key, recipient, meta.account_root, account_proof)?;
        self.vault_verifier.verify(vault_proof)?;

        let amount = dequantize(vault.quantized_balance, mapping.quantum)?;
        let mut batch = StateBatch::default();
        batch.claims.push((
            key,
            ClaimRecord {
                owner_key: vault.owner_key,
                asset_id: vault.asset_id,
                recipient,
                asset: mapping.asset,
                amount,
            },
        ));

        let mut ledger = Ledger::new(&self.store);
        ledger.transfer(mapping.asset, meta.address, recipient, amount)?;
        ledger.stage_into(&mut batch);

        self.store.apply_batch(batch)?;

        Ok(WithdrawalReceipt {
            owner_key: vault.owner_key,
            asset_id: vault.asset_id,
            vault_id: vault.vault_id,
            asset: mapping.asset,
            recipient,
            quantized_balance: vault.quantized_balance,
            amount,
            claim_key: key,
        })
    }

    // =========================================================================
    // Roots
    // =========================================================================

    pub fn set_vault_root(&mut self, caller: Address, root: U256) -> Result<()> {
        self.require_role(&caller, Role::SetVaultRoot)?;
        let mut meta = self.meta()?;
        if meta.paused {
            return Err(WithdrawalError::Paused);
        }
        if root.is_zero() {
            return Err(WithdrawalError::ZeroRoot);
        }
        if !is_field_element(&root) {
            return Err(WithdrawalError::InvalidRoot(root));
        }
        if !meta.vault_root.is_zero() && !meta.root_override_allowed {
            return Err(WithdrawalError::RootAlreadySet);
        }

        let previous = meta.vault_root;
        meta.vault_root = root;
        self.commit_meta(meta)?;
        log::info!("Vault root set by {caller}: {previous:#x} -> {root:#x}");
        Ok(())
    }

    pub fn set_account_root(&mut self, caller: Address, root: B256) -> Result<()> {
        self.require_role(&caller, Role::SetAccountRoot)?;
        let mut meta = self.meta()?;
        if meta.paused {
            return Err(WithdrawalError::Paused);
        }
        if root.is_zero() {
            return Err(WithdrawalError::ZeroRoot);
        }
        if !meta.account_root.is_zero() && !meta.root_override_allowed {
            return Err(WithdrawalError::RootAlreadySet);
        }

        let previous = meta.account_root;
        meta.account_root = root;
        self.commit_meta(meta)?;
        log::info!("Account root set by {caller}: {previous} -> {root}");
        Ok(())
    }

    pub fn set_root_override_allowed(&mut self, caller: Address, allowed: bool) -> Result<()> {
        self.require_role(&caller, Role::Admin)?;
        let mut meta = self.meta()?;
        meta.root_override_allowed = allowed;
        self.commit_meta(meta)?;
        log::info!("Root override {} by {caller}", if allowed { "enabled" } else { "disabled" });
        Ok(())
    }

    // =========================================================================
    // Token mappings
    // =========================================================================

    /// Register a batch of mappings. Either every entry is stored or none is.
    pub fn register_token_mappings(
        &mut self,
        caller: Address,
        entries: &[TokenMappingEntry],
    ) -> Result<()> {
        self.require_role(&caller, Role::ManageTokenMappings)?;
        if self.meta()?.paused {
            return Err(WithdrawalError::Paused);
        }

        let store = &self.store;
        validate_entries(entries, |id| Ok(store.token_mapping(id)?.is_some()))?;

        self.store.apply_batch(StateBatch {
            token_mappings: entries
                .iter()
                .map(|e| (e.legacy_asset_id, e.mapping()))
                .collect(),
            ..StateBatch::default()
        })?;

        for entry in entries {
            log::info!(
                "Token mapping registered: {:#x} -> {} (quantum {})",
                entry.legacy_asset_id,
                entry.asset,
                entry.quantum
            );
        }
        Ok(())
    }

    // =========================================================================
    // Pause
    // =========================================================================

    pub fn pause(&mut self, caller: Address) -> Result<()> {
        self.require_role(&caller, Role::Pause)?;
        let mut meta = self.meta()?;
        if meta.paused {
            return Err(WithdrawalError::Paused);
        }
        meta.paused = true;
        self.commit_meta(meta)?;
        log::info!("Processor paused by {caller}");
        Ok(())
    }

    pub fn unpause(&mut self, caller: Address) -> Result<()> {
        self.require_role(&caller, Role::Unpause)?;
        let mut meta = self.meta()?;
        if !meta.paused {
            return Err(WithdrawalError::NotPaused);
        }
        meta.paused = false;
        self.commit_meta(meta)?;
        log::info!("Processor unpaused by {caller}");
        Ok(())
    }

    // =========================================================================
    // Roles
    // =========================================================================

    pub fn grant_role(&mut self, caller: Address, account: Address, role: Role) -> Result<()> {
        self.require_role(&caller, Role::Admin)?;
        if account == Address::ZERO {
            return Err(WithdrawalError::ZeroAddress);
        }
        let mut roles = self.store.roles(&account)?;
        if roles.contains(role) {
            return Ok(());
        }
        roles.insert(role);
        self.commit_roles(account, roles)?;
        log::info!("Role {role} granted to {account} by {caller}");
        Ok(())
    }

    pub fn revoke_role(&mut self, caller: Address, account: Address, role: Role) -> Result<()> {
        self.require_role(&caller, Role::Admin)?;
        let mut roles = self.store.roles(&account)?;
        if !roles.contains(role) {
            return Ok(());
        }
        roles.remove(role);
        self.commit_roles(account, roles)?;
        log::info!("Role {role} revoked from {account} by {caller}");
        Ok(())
    }

    // =========================================================================
    // Funding
    // =========================================================================

    /// Move funds from `from` into the processor. Allowed while paused.
    pub fn receive_funds(&mut self, from: Address, asset: Address, amount: U256) -> Result<()> {
        let meta = self.meta()?;
        if from == Address::ZERO || asset == Address::ZERO {
            return Err(WithdrawalError::ZeroAddress);
        }

        let mut batch = StateBatch::default();
        let mut ledger = Ledger::new(&self.store);
        ledger.transfer(asset, from, meta.address, amount)?;
        ledger.stage_into(&mut batch);
        self.store.apply_batch(batch)?;

        log::info!("Received {amount} of {asset} from {from}");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn address(&self) -> Result<Address> {
        Ok(self.meta()?.address)
    }

    pub fn vault_root(&self) -> Result<U256> {
        Ok(self.meta()?.vault_root)
    }

    pub fn account_root(&self) -> Result<B256> {
        Ok(self.meta()?.account_root)
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(self.meta()?.paused)
    }

    pub fn root_override_allowed(&self) -> Result<bool> {
        Ok(self.meta()?.root_override_allowed)
    }

    pub fn lifecycle(&self) -> Result<Lifecycle> {
        lifecycle_of(&self.store)
    }

    pub fn has_role(&self, account: &Address, role: Role) -> Result<bool> {
        Ok(self.store.roles(account)?.contains(role))
    }

    pub fn token_mapping(&self, asset_id: &U256) -> Result<Option<TokenMapping>> {
        Ok(self.store.token_mapping(asset_id)?)
    }

    pub fn is_mapped(&self, asset_id: &U256) -> Result<bool> {
        Ok(self.token_mapping(asset_id)?.is_some())
    }

    /// Successor asset for `asset_id`.
    pub fn resolved_address(&self, asset_id: &U256) -> Result<Address> {
        self.token_mapping(asset_id)?
            .map(|m| m.asset)
            .ok_or(WithdrawalError::AssetNotMapped(*asset_id))
    }

    pub fn quantum(&self, asset_id: &U256) -> Result<U256> {
        self.token_mapping(asset_id)?
            .map(|m| m.quantum)
            .ok_or(WithdrawalError::AssetNotMapped(*asset_id))
    }

    pub fn is_withdrawal_processed(&self, owner_key: U256, asset_id: U256) -> Result<bool> {
        Ok(self.claim_record(owner_key, asset_id)?.is_some())
    }

    pub fn claim_record(&self, owner_key: U256, asset_id: U256) -> Result<Option<ClaimRecord>> {
        Ok(self.store.claim(&claim_key(owner_key, asset_id))?)
    }

    pub fn balance_of(&self, asset: &Address, holder: &Address) -> Result<U256> {
        Ok(self.store.balance(asset, holder)?)
    }

    /// The processor's own holdings of `asset`.
    pub fn reserves(&self, asset: &Address) -> Result<U256> {
        let address = self.address()?;
        self.balance_of(asset, &address)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn meta(&self) -> Result<ProcessorMeta> {
        self.store.meta()?.ok_or(WithdrawalError::NotInitialized)
    }

    fn require_role(&self, caller: &Address, role: Role) -> Result<()> {
        if !self.store.roles(caller)?.contains(role) {
            return Err(WithdrawalError::Unauthorized {
                caller: *caller,
                role,
            });
        }
        Ok(())
    }

    fn commit_meta(&mut self, meta: ProcessorMeta) -> Result<()> {
        self.store.apply_batch(StateBatch {
            meta: Some(meta),
            ..StateBatch::default()
        })?;
        Ok(())
    }

    fn commit_roles(&mut self, account: Address, roles: RoleSet) -> Result<()> {
        self.store.apply_batch(StateBatch {
            roles: vec![(account, roles)],
            ..StateBatch::default()
        })?;
        Ok(())
    }
}
