//! Operations backed by the on-disk processor.

use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result, bail};
use exodus_config::ExodusConfig;
use exodus_core::storage::mint;
use exodus_core::{
    Lifecycle, ProcessorSettings, Role, RocksDbStore, RoleSet, RootRelay, TokenMappingEntry,
    WithdrawalProcessor, lifecycle_of,
};
use exodus_proofs::{AccountProofVerifier, VaultProofVerifier};
use std::path::Path;

use crate::inputs::{parse_role, read_account_proof, read_vault_proof};

pub fn open_store(config: &ExodusConfig) -> Result<RocksDbStore> {
    RocksDbStore::open(&config.database.path)
        .with_context(|| format!("opening database at {}", config.database.path))
}

pub fn open_processor(config: &ExodusConfig) -> Result<WithdrawalProcessor<RocksDbStore>> {
    Ok(WithdrawalProcessor::open(open_store(config)?)?)
}

/// Collect the creation-time grants named in the config.
fn configured_grants(config: &ExodusConfig) -> Result<Vec<(Address, RoleSet)>> {
    let mut grants = Vec::new();
    for grant in &config.roles {
        let roles = grant
            .roles
            .iter()
            .map(|r| parse_role(r))
            .collect::<Result<RoleSet>>()?;
        grants.push((grant.address()?, roles));
    }

    if !config.relay.sources.is_empty() {
        let relay = config.relay.address()?;
        log::info!("Granting set_vault_root to relay identity {relay}");
        grants.push((relay, [Role::SetVaultRoot].into_iter().collect()));
    }
    Ok(grants)
}

pub fn init(config: &ExodusConfig) -> Result<()> {
    let store = open_store(config)?;
    if lifecycle_of(&store)? != Lifecycle::Uninitialized {
        bail!("database at {} already holds a processor", config.database.path);
    }

    let admin = config
        .processor
        .admin()?
        .context("processor.admin must be set to initialize")?;
    let settings = ProcessorSettings {
        address: config.processor.address()?,
        admin,
        root_override_allowed: config.processor.allow_root_override,
        grants: configured_grants(config)?,
    };
    let processor = WithdrawalProcessor::create(store, settings)?;

    println!("✅ Processor {} created", processor.address()?);
    println!("   Admin: {admin}");
    Ok(())
}

pub fn status(config: &ExodusConfig) -> Result<()> {
    let store = open_store(config)?;
    let lifecycle = lifecycle_of(&store)?;
    println!("📊 Database: {}", config.database.path);
    println!("   Lifecycle: {lifecycle:?}");
    if lifecycle == Lifecycle::Uninitialized {
        return Ok(());
    }

    let processor = WithdrawalProcessor::open(store)?;
    println!("   Address:        {}", processor.address()?);
    println!("   Vault root:     {:#x}", processor.vault_root()?);
    println!("   Account root:   {}", processor.account_root()?);
    println!("   Root override:  {}", processor.root_override_allowed()?);

    let registry = processor.store().get_all_token_mappings()?;
    println!("   Token mappings: {}", registry.len());
    for (asset_id, mapping) in registry {
        println!(
            "     {asset_id:#x} -> {} (quantum {})",
            mapping.asset, mapping.quantum
        );
    }
    println!(
        "   Claims:         {}",
        processor.store().get_all_claims()?.len()
    );
    Ok(())
}

/// Check a vault proof file without touching any state.
pub fn verify_vault(path: &Path) -> Result<()> {
    let proof = read_vault_proof(path)?;
    let verifier: VaultProofVerifier = VaultProofVerifier::default();
    let record = verifier.verify(&proof)?;
    let root = verifier.extract_root(&proof)?;

    println!("✅ Vault proof valid ({} words)", proof.len());
    println!("   Owner key: {:#x}", record.owner_key);
    println!("   Asset id:  {:#x}", record.asset_id);
    println!("   Balance:   {}", record.quantized_balance);
    println!("   Vault id:  {}", record.vault_id);
    println!("   Root:      {root:#x}");
    Ok(())
}

pub fn verify_account(owner_key: U256, address: Address, root: B256, path: &Path) -> Result<()> {
    let proof = read_account_proof(path)?;
    AccountProofVerifier.verify(owner_key, address, root, &proof)?;
    println!("✅ {address} is bound to owner {owner_key:#x}");
    Ok(())
}

pub fn set_vault_root(config: &ExodusConfig, caller: Address, root: U256) -> Result<()> {
    let mut processor = open_processor(config)?;
    processor.set_vault_root(caller, root)?;
    println!("✅ Vault root set to {root:#x}");
    Ok(())
}

pub fn set_account_root(config: &ExodusConfig, caller: Address, root: B256) -> Result<()> {
    let mut processor = open_processor(config)?;
    processor.set_account_root(caller, root)?;
    println!("✅ Account root set to {root}");
    Ok(())
}

pub fn register_token(config: &ExodusConfig, caller: Address, entry: TokenMappingEntry) -> Result<()> {
    let mut processor = open_processor(config)?;
    processor.register_token_mappings(caller, &[entry])?;
    println!(
        "✅ Asset {:#x} mapped to {} (quantum {})",
        entry.legacy_asset_id, entry.asset, entry.quantum
    );
    Ok(())
}

pub fn set_paused(config: &ExodusConfig, caller: Address, paused: bool) -> Result<()> {
    let mut processor = open_processor(config)?;
    if paused {
        processor.pause(caller)?;
        println!("⏸️  Withdrawals paused");
    } else {
        processor.unpause(caller)?;
        println!("▶️  Withdrawals resumed");
    }
    Ok(())
}

pub fn change_role(
    config: &ExodusConfig,
    caller: Address,
    account: Address,
    role: Role,
    grant: bool,
) -> Result<()> {
    let mut processor = open_processor(config)?;
    if grant {
        processor.grant_role(caller, account, role)?;
        println!("✅ Granted {role} to {account}");
    } else {
        processor.revoke_role(caller, account, role)?;
        println!("✅ Revoked {role} from {account}");
    }
    Ok(())
}

/// Credit an address directly, outside the processor.
pub fn mint_to(config: &ExodusConfig, asset: Address, holder: Address, amount: U256) -> Result<()> {
    let mut store = open_store(config)?;
    let balance = mint(&mut store, asset, holder, amount)?;
    println!("🪙 {holder} now holds {balance} of {asset}");
    Ok(())
}

pub fn fund(config: &ExodusConfig, from: Address, asset: Address, amount: U256) -> Result<()> {
    let mut processor = open_processor(config)?;
    processor.receive_funds(from, asset, amount)?;
    println!(
        "💰 Reserves of {asset}: {}",
        processor.reserves(&asset)?
    );
    Ok(())
}

pub fn withdraw(
    config: &ExodusConfig,
    caller: Address,
    recipient: Address,
    account_proof: &Path,
    vault_proof: &Path,
) -> Result<()> {
    let account_proof = read_account_proof(account_proof)?;
    let vault_proof = read_vault_proof(vault_proof)?;

    let mut processor = open_processor(config)?;
    let receipt = match processor.verify_and_process_withdrawal(
        caller,
        recipient,
        &account_proof,
        &vault_proof,
    ) {
        Ok(receipt) => receipt,
        Err(e) => bail!("{e} ({:?})", e.category()),
    };

    println!("✅ Withdrawal processed");
    println!("   Owner key: {:#x}", receipt.owner_key);
    println!("   Asset id:  {:#x}", receipt.asset_id);
    println!("   Paid:      {} of {} to {}", receipt.amount, receipt.asset, receipt.recipient);
    println!("   Claim key: {}", receipt.claim_key);
    Ok(())
}

pub fn processed(config: &ExodusConfig, owner_key: U256, asset_id: U256) -> Result<()> {
    let processor = open_processor(config)?;
    match processor.claim_record(owner_key, asset_id)? {
        Some(claim) => println!(
            "✅ Claimed: {} of {} paid to {}",
            claim.amount, claim.asset, claim.recipient
        ),
        None => println!("⏳ Not yet withdrawn"),
    }
    Ok(())
}

pub fn relay(config: &ExodusConfig, chain: &str, source: &str, payload: &[u8]) -> Result<()> {
    let relay = RootRelay::new(
        config.relay.address()?,
        config
            .relay
            .sources
            .iter()
            .map(|s| (s.chain.clone(), s.address.as_str())),
    );
    let mut processor = open_processor(config)?;
    let root = relay.handle_message(&mut processor, chain, source, payload)?;
    println!("✅ Relayed vault root {root:#x} from {chain}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use exodus_config::RoleGrant;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> ExodusConfig {
        let mut config = ExodusConfig::default();
        config.database.path = dir.path().join("db").display().to_string();
        config.processor.admin = Some("0x000000000000000000000000000000000000ad01".into());
        config.roles.push(RoleGrant {
            address: "0x000000000000000000000000000000000000c0de".into(),
            roles: vec!["pause".into(), "set-vault-root".into()],
        });
        config
    }

    #[test]
    fn test_init_applies_configured_grants() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        init(&config).unwrap();
        assert!(init(&config).is_err());

        let processor = open_processor(&config).unwrap();
        let operator: Address = "0x000000000000000000000000000000000000c0de".parse().unwrap();
        assert!(processor.has_role(&operator, Role::Pause).unwrap());
        assert!(processor.has_role(&operator, Role::SetVaultRoot).unwrap());
        assert!(!processor.has_role(&operator, Role::Disburse).unwrap());
    }

    #[test]
    fn test_init_requires_admin() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.processor.admin = None;
        assert!(init(&config).is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.roles[0].roles.push("superuser".into());
        assert!(configured_grants(&config).is_err());
    }
}
