#![allow(dead_code)]

use alloy_primitives::{Address, B256, U256, address};
use exodus_core::storage::{mint, set_rejects_native};
use exodus_core::{
    MemoryStore, NATIVE_ASSET, ProcessorSettings, Role, RoleSet, StateStore, TokenMappingEntry,
    WithdrawalProcessor,
};
use exodus_proofs::{AccountAssociation, AccountTree, VaultRecord, VaultTree};

pub const PROCESSOR: Address = address!("00000000000000000000000000000000e0d05000");
pub const ADMIN: Address = address!("000000000000000000000000000000000000ad01");
pub const OPERATOR: Address = address!("000000000000000000000000000000000000c0de");
pub const DISBURSER: Address = address!("000000000000000000000000000000000000d15b");
pub const FUNDER: Address = address!("000000000000000000000000000000000000f00d");
pub const STRANGER: Address = address!("5555555555555555555555555555555555555555");

pub const TOKEN_X: Address = address!("7070707070707070707070707070707070707070");

pub const ASSET_A: U256 = U256::from_limbs([0xa5e7, 0, 0, 0]);
pub const NATIVE_ID: U256 = U256::from_limbs([0xe7e7, 0, 0, 0]);
pub const BIG_ASSET: U256 = U256::from_limbs([0xb16, 0, 0, 0]);
pub const UNMAPPED_ID: U256 = U256::from_limbs([0xdead, 0, 0, 0]);

pub const QUANTUM_A: u64 = 1_000_000;
pub const QUANTUM_NATIVE: u64 = 10_000_000_000;

/// Index of each vault record in `TestFixture::records`
pub const VAULT_A: usize = 0;
pub const VAULT_NATIVE: usize = 1;
pub const VAULT_ZERO: usize = 2;
pub const VAULT_UNMAPPED: usize = 3;
pub const VAULT_BIG: usize = 4;

pub const TREE_HEIGHT: usize = 31;

pub fn owner_key(n: u64) -> U256 {
    U256::from(0x5eed_0000u64 + n)
}

pub fn recipient(n: u8) -> Address {
    Address::repeat_byte(n)
}

pub fn associations() -> Vec<AccountAssociation> {
    (1..=4)
        .map(|n| AccountAssociation::new(owner_key(n as u64), recipient(n)))
        .collect()
}

pub fn records() -> Vec<VaultRecord> {
    let rec = |owner: u64, asset_id: U256, balance: U256, vault_id: u64| VaultRecord {
        owner_key: owner_key(owner),
        asset_id,
        quantized_balance: balance,
        vault_id: U256::from(vault_id),
    };
    vec![
        rec(1, ASSET_A, U256::from(1_500u64), 0),
        rec(2, NATIVE_ID, U256::from(3u64), 1),
        rec(3, ASSET_A, U256::ZERO, 2),
        rec(4, UNMAPPED_ID, U256::from(10u64), 3),
        rec(1, BIG_ASSET, U256::from(1u64) << 200, 4),
    ]
}

pub fn build_vault_tree(records: &[VaultRecord]) -> VaultTree {
    let mut tree = VaultTree::new(TREE_HEIGHT).unwrap();
    for record in records {
        tree.insert(*record).unwrap();
    }
    tree
}

pub struct TestFixture<S: StateStore = MemoryStore> {
    pub processor: WithdrawalProcessor<S>,
    pub vault_tree: VaultTree,
    pub account_tree: AccountTree,
    pub records: Vec<VaultRecord>,
    pub associations: Vec<AccountAssociation>,
}

impl TestFixture<MemoryStore> {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new(), &[])
    }

    /// Fixture whose `rejecting` addresses refuse native transfers.
    pub fn rejecting(rejecting: &[Address]) -> Self {
        Self::with_store(MemoryStore::new(), rejecting)
    }
}

impl<S: StateStore> TestFixture<S> {
    pub fn with_store(mut store: S, rejecting: &[Address]) -> Self {
        let records = records();
        let associations = associations();
        let vault_tree = build_vault_tree(&records);
        let account_tree = AccountTree::new(&associations).unwrap();

        mint(&mut store, TOKEN_X, FUNDER, U256::MAX >> 1).unwrap();
        mint(&mut store, NATIVE_ASSET, FUNDER, U256::MAX >> 1).unwrap();
        for addr in rejecting {
            set_rejects_native(&mut store, *addr, true).unwrap();
        }

        let operator_roles: RoleSet = [
            Role::Pause,
            Role::Unpause,
            Role::SetVaultRoot,
            Role::SetAccountRoot,
            Role::ManageTokenMappings,
        ]
        .into_iter()
        .collect();
        let settings = ProcessorSettings {
            address: PROCESSOR,
            admin: ADMIN,
            root_override_allowed: false,
            grants: vec![
                (OPERATOR, operator_roles),
                (DISBURSER, [Role::Disburse].into_iter().collect()),
            ],
        };
        let mut processor = WithdrawalProcessor::create(store, settings).unwrap();

        processor
            .set_vault_root(OPERATOR, vault_tree.root())
            .unwrap();
        processor
            .set_account_root(OPERATOR, account_tree.root())
            .unwrap();
        processor
            .register_token_mappings(
                OPERATOR,
                &[
                    TokenMappingEntry {
                        legacy_asset_id: ASSET_A,
                        asset: TOKEN_X,
                        quantum: U256::from(QUANTUM_A),
                    },
                    TokenMappingEntry {
                        legacy_asset_id: NATIVE_ID,
                        asset: NATIVE_ASSET,
                        quantum: U256::from(QUANTUM_NATIVE),
                    },
                    TokenMappingEntry {
                        legacy_asset_id: BIG_ASSET,
                        asset: TOKEN_X,
                        quantum: (U256::from(1u64) << 128) - U256::from(1u64),
                    },
                ],
            )
            .unwrap();

        Self {
            processor,
            vault_tree,
            account_tree,
            records,
            associations,
        }
    }

    pub fn fund(&mut self, asset: Address, amount: U256) {
        self.processor.receive_funds(FUNDER, asset, amount).unwrap();
    }

    pub fn vault_proof(&self, index: usize) -> Vec<U256> {
        self.vault_tree
            .proof(&self.records[index].vault_id)
            .unwrap()
    }

    /// Account proof for the owner of vault `index`.
    pub fn account_proof(&self, index: usize) -> Vec<B256> {
        let owner = self.records[index].owner_key;
        let assoc = self
            .associations
            .iter()
            .find(|a| a.owner_key == owner)
            .unwrap();
        self.account_tree
            .proof_for(assoc.owner_key, assoc.external_address)
            .unwrap()
    }

    /// The external address bound to the owner of vault `index`.
    pub fn recipient_for(&self, index: usize) -> Address {
        let owner = self.records[index].owner_key;
        self.associations
            .iter()
            .find(|a| a.owner_key == owner)
            .unwrap()
            .external_address
    }

    pub fn withdraw(
        &mut self,
        index: usize,
    ) -> exodus_core::Result<exodus_core::WithdrawalReceipt> {
        let recipient = self.recipient_for(index);
        let account_proof = self.account_proof(index);
        let vault_proof = self.vault_proof(index);
        self.processor
            .verify_and_process_withdrawal(DISBURSER, recipient, &account_proof, &vault_proof)
    }
}
