//! Staged balance movements
//!
//! Reads fall through to the committed store; writes stay in memory until the
//! caller folds them into a `StateBatch`. Nothing reaches the store on failure.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;

use crate::errors::{Result, WithdrawalError};
use crate::registry::NATIVE_ASSET;
use crate::storage::{StateBatch, StateStore};

pub struct Ledger<'a, S: StateStore + ?Sized> {
    store: &'a S,
    pending: HashMap<(Address, Address), U256>,
}

impl<'a, S: StateStore + ?Sized> Ledger<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            pending: HashMap::new(),
        }
    }

    pub fn balance_of(&self, asset: &Address, holder: &Address) -> Result<U256> {
        match self.pending.get(&(*asset, *holder)) {
            Some(balance) => Ok(*balance),
            None => Ok(self.store.balance(asset, holder)?),
        }
    }

    /// Move `amount` of `asset` from `from` to `to`.
    ///
    /// The sender balance is checked before anything is staged. Native transfers
    /// to an address that refuses them fail with `TransferRejected`.
    pub fn transfer(&mut self, asset: Address, from: Address, to: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(&asset, &from)?;
        if available < amount {
            return Err(WithdrawalError::InsufficientBalance {
                asset,
                available,
                required: amount,
            });
        }
        if asset == NATIVE_ASSET && self.store.rejects_native(&to)? {
            return Err(WithdrawalError::TransferRejected { recipient: to });
        }
        if from == to {
            return Ok(());
        }

        let received = self
            .balance_of(&asset, &to)?
            .checked_add(amount)
            .ok_or(WithdrawalError::BalanceOverflow { holder: to })?;

        self.pending.insert((asset, from), available - amount);
        self.pending.insert((asset, to), received);
        Ok(())
    }

    /// Fold staged balances into `batch`.
    pub fn stage_into(self, batch: &mut StateBatch) {
        batch.balances.extend(
            self.pending
                .into_iter()
                .map(|((asset, holder), balance)| (asset, holder, balance)),
        );
    }
}
