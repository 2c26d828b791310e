use alloy_primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

use crate::claims::ClaimRecord;
use crate::registry::TokenMapping;
use crate::roles::RoleSet;
use crate::storage::{ProcessorMeta, StateBatch, StateStore};

const CF_META: &str = "meta";
const CF_TOKEN_MAPPINGS: &str = "token_mappings";
const CF_CLAIMS: &str = "claims";
const CF_BALANCES: &str = "balances";
const CF_ROLES: &str = "roles";
const CF_NATIVE_REJECTIONS: &str = "native_rejections";

const META_KEY: &[u8] = b"processor";

/// A thread-safe wrapper around RocksDB.
#[derive(Clone)]
pub struct RocksDbStore {
    db: Arc<DB>,
}

fn balance_key(asset: &Address, holder: &Address) -> [u8; 40] {
    let mut key = [0u8; 40];
    key[..20].copy_from_slice(asset.as_slice());
    key[20..].copy_from_slice(holder.as_slice());
    key
}

impl RocksDbStore {
    /// Opens the database at the specified path, creating it if missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = vec![
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
            ColumnFamilyDescriptor::new(CF_TOKEN_MAPPINGS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CLAIMS, Options::default()),
            ColumnFamilyDescriptor::new(CF_BALANCES, Options::default()),
            ColumnFamilyDescriptor::new(CF_ROLES, Options::default()),
            ColumnFamilyDescriptor::new(CF_NATIVE_REJECTIONS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, families)
            .map_err(|e| anyhow::anyhow!("Failed to open RocksDB: {}", e))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get all processed claims (for audits)
    pub fn get_all_claims(&self) -> Result<Vec<ClaimRecord>> {
        let cf = self.db.cf_handle(CF_CLAIMS).context("claims CF missing")?;

        let mut claims = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_, value) = item?;
            claims.push(serde_json::from_slice(&value).context("invalid claim record")?);
        }
        Ok(claims)
    }

    /// Get all registered token mappings, ordered by legacy asset id
    pub fn get_all_token_mappings(&self) -> Result<Vec<(U256, TokenMapping)>> {
        let cf = self
            .db
            .cf_handle(CF_TOKEN_MAPPINGS)
            .context("token_mappings CF missing")?;

        let mut mappings = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (key, value) = item?;
            let id: [u8; 32] = key.as_ref().try_into().context("invalid asset id length")?;
            let mapping: TokenMapping =
                serde_json::from_slice(&value).context("invalid token mapping")?;
            mappings.push((U256::from_be_bytes(id), mapping));
        }
        Ok(mappings)
    }
}

impl StateStore for RocksDbStore {
    fn meta(&self) -> Result<Option<ProcessorMeta>> {
        let cf = self.db.cf_handle(CF_META).context("meta CF missing")?;

        match self.db.get_cf(cf, META_KEY)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("invalid processor record")?,
            )),
            None => Ok(None),
        }
    }

    fn token_mapping(&self, asset_id: &U256) -> Result<Option<TokenMapping>> {
        let cf = self
            .db
            .cf_handle(CF_TOKEN_MAPPINGS)
            .context("token_mappings CF missing")?;

        match self.db.get_cf(cf, asset_id.to_be_bytes::<32>())? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("invalid token mapping")?,
            )),
            None => Ok(None),
        }
    }

    fn claim(&self, key: &B256) -> Result<Option<ClaimRecord>> {
        let cf = self.db.cf_handle(CF_CLAIMS).context("claims CF missing")?;

        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(
                serde_json::from_slice(&bytes).context("invalid claim record")?,
            )),
            None => Ok(None),
        }
    }

    fn balance(&self, asset: &Address, holder: &Address) -> Result<U256> {
        let cf = self
            .db
            .cf_handle(CF_BALANCES)
            .context("balances CF missing")?;

        match self.db.get_cf(cf, balance_key(asset, holder))? {
            Some(bytes) => {
                let arr: [u8; 32] = bytes
                    .as_slice()
                    .try_into()
                    .context("invalid balance length")?;
                Ok(U256::from_be_bytes(arr))
            }
            None => Ok(U256::ZERO),
        }
    }

    fn roles(&self, account: &Address) -> Result<RoleSet> {
        let cf = self.db.cf_handle(CF_ROLES).context("roles CF missing")?;

        match self.db.get_cf(cf, account)? {
            Some(bytes) => {
                let bits = *bytes.first().context("empty role set")?;
                Ok(RoleSet::from_bits(bits))
            }
            None => Ok(RoleSet::EMPTY),
        }
    }

    fn rejects_native(&self, account: &Address) -> Result<bool> {
        let cf = self
            .db
            .cf_handle(CF_NATIVE_REJECTIONS)
            .context("native_rejections CF missing")?;

        Ok(self.db.get_cf(cf, account)?.is_some())
    }

    /// Atomically apply a batch of operations
    fn apply_batch(&mut self, operations: StateBatch) -> Result<()> {
        if operations.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::default();

        let cf_meta = self.db.cf_handle(CF_META).context("meta CF missing")?;
        let cf_mappings = self
            .db
            .cf_handle(CF_TOKEN_MAPPINGS)
            .context("token_mappings CF missing")?;
        let cf_claims = self.db.cf_handle(CF_CLAIMS).context("claims CF missing")?;
        let cf_balances = self
            .db
            .cf_handle(CF_BALANCES)
            .context("balances CF missing")?;
        let cf_roles = self.db.cf_handle(CF_ROLES).context("roles CF missing")?;
        let cf_rejections = self
            .db
            .cf_handle(CF_NATIVE_REJECTIONS)
            .context("native_rejections CF missing")?;

        if let Some(meta) = &operations.meta {
            batch.put_cf(cf_meta, META_KEY, serde_json::to_vec(meta)?);
        }

        for (asset_id, mapping) in &operations.token_mappings {
            batch.put_cf(
                cf_mappings,
                asset_id.to_be_bytes::<32>(),
                serde_json::to_vec(mapping)?,
            );
        }

        for (key, record) in &operations.claims {
            batch.put_cf(cf_claims, key, serde_json::to_vec(record)?);
        }

        for (asset, holder, balance) in &operations.balances {
            batch.put_cf(
                cf_balances,
                balance_key(asset, holder),
                balance.to_be_bytes::<32>(),
            );
        }

        for (account, roles) in &operations.roles {
            if roles.is_empty() {
                batch.delete_cf(cf_roles, account);
            } else {
                batch.put_cf(cf_roles, account, [roles.bits()]);
            }
        }

        for (account, rejects) in &operations.native_rejections {
            if *rejects {
                batch.put_cf(cf_rejections, account, b"");
            } else {
                batch.delete_cf(cf_rejections, account);
            }
        }

        self.db.write(batch)?;
        Ok(())
    }
}
