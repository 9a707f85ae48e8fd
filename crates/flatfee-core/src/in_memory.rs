// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Collaborators backed by process memory, for tests and simulations.

use crate::keepers::{AccountKeeper, BankKeeper, BranchedStore, FeeAllowance, FeegrantKeeper};
use flatfee_types::base_types::{AccAddress, BaseAccount};
use flatfee_types::coin::{Coin, Coins};
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::fee_ensure;
use flatfee_types::messages::Msg;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
pub struct InMemoryAccountKeeper {
    inner: Mutex<AccountsInner>,
}

#[derive(Default)]
struct AccountsInner {
    accounts: BTreeMap<AccAddress, BaseAccount>,
    modules: BTreeMap<String, AccAddress>,
    next_account_number: u64,
}

impl InMemoryAccountKeeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_account(&self, address: &AccAddress) -> BaseAccount {
        let mut inner = self.inner.lock();
        if let Some(existing) = inner.accounts.get(address) {
            return existing.clone();
        }
        let account = BaseAccount {
            address: address.clone(),
            account_number: inner.next_account_number,
            sequence: 0,
        };
        inner.next_account_number += 1;
        inner.accounts.insert(address.clone(), account.clone());
        account
    }

    /// Registers the account of a module and returns its address.
    pub fn add_module_account(&self, name: &str) -> AccAddress {
        let address = AccAddress::for_module(name);
        self.add_account(&address);
        self.inner
            .lock()
            .modules
            .insert(name.to_string(), address.clone());
        address
    }
}

impl AccountKeeper for InMemoryAccountKeeper {
    fn get_account(&self, address: &AccAddress) -> Option<BaseAccount> {
        self.inner.lock().accounts.get(address).cloned()
    }

    fn get_module_address(&self, name: &str) -> Option<AccAddress> {
        self.inner.lock().modules.get(name).cloned()
    }
}

/// Saved copies of a map, one per open branch.
struct Snapshots<K, V> {
    stack: Mutex<Vec<BTreeMap<K, V>>>,
}

impl<K, V> Default for Snapshots<K, V> {
    fn default() -> Self {
        Self {
            stack: Mutex::new(vec![]),
        }
    }
}

impl<K: Clone + Ord, V: Clone> Snapshots<K, V> {
    fn push(&self, state: &Mutex<BTreeMap<K, V>>) {
        let snapshot = state.lock().clone();
        self.stack.lock().push(snapshot);
    }

    fn pop(&self) -> Option<BTreeMap<K, V>> {
        self.stack.lock().pop()
    }

    fn restore(&self, state: &Mutex<BTreeMap<K, V>>) {
        // Nothing to restore without an open branch.
        if let Some(snapshot) = self.pop() {
            *state.lock() = snapshot;
        }
    }
}

/// Balances keyed by address. Module accounts are addressed with `AccAddress::for_module`.
///
/// Branches cover the whole bank, so they are only meaningful when one tx runs at a time.
#[derive(Default)]
pub struct InMemoryBank {
    balances: Mutex<BTreeMap<AccAddress, Coins>>,
    snapshots: Snapshots<AccAddress, Coins>,
}

impl InMemoryBank {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fund(&self, address: &AccAddress, amount: &Coins) {
        let mut balances = self.balances.lock();
        let balance = balances.entry(address.clone()).or_default();
        *balance = balance.add(amount);
    }

    pub fn balance(&self, address: &AccAddress) -> Coins {
        self.balances
            .lock()
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn module_balance(&self, module: &str) -> Coins {
        self.balance(&AccAddress::for_module(module))
    }

    pub fn send_coins(&self, from: &AccAddress, to: &AccAddress, amount: &Coins) -> FeeResult {
        let mut balances = self.balances.lock();
        let have = balances.get(from).cloned().unwrap_or_default();
        let left = have
            .checked_sub(amount)
            .ok_or_else(|| FeeError::InsufficientFunds {
                error: format!("spendable balance {have} is smaller than {amount}"),
            })?;
        balances.insert(from.clone(), left);
        let dest = balances.entry(to.clone()).or_default();
        *dest = dest.add(amount);
        Ok(())
    }
}

impl BranchedStore for InMemoryBank {
    fn branch(&self) {
        self.snapshots.push(&self.balances);
    }

    fn commit(&self) {
        self.snapshots.pop();
    }

    fn discard(&self) {
        self.snapshots.restore(&self.balances);
    }
}

impl BankKeeper for InMemoryBank {
    fn send_coins_from_account_to_module(
        &self,
        from: &AccAddress,
        module: &str,
        amount: &Coins,
    ) -> FeeResult {
        self.send_coins(from, &AccAddress::for_module(module), amount)
    }

    fn get_balance(&self, address: &AccAddress, denom: &str) -> Coin {
        Coin::new(self.balance(address).amount_of(denom), denom)
    }
}

#[derive(Default)]
pub struct InMemoryFeegrantKeeper {
    allowances: Mutex<BTreeMap<(AccAddress, AccAddress), FeeAllowance>>,
    snapshots: Snapshots<(AccAddress, AccAddress), FeeAllowance>,
}

impl InMemoryFeegrantKeeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn grant_allowance(
        &self,
        granter: &AccAddress,
        grantee: &AccAddress,
        allowance: FeeAllowance,
    ) {
        self.allowances
            .lock()
            .insert((granter.clone(), grantee.clone()), allowance);
    }
}

impl BranchedStore for InMemoryFeegrantKeeper {
    fn branch(&self) {
        self.snapshots.push(&self.allowances);
    }

    fn commit(&self) {
        self.snapshots.pop();
    }

    fn discard(&self) {
        self.snapshots.restore(&self.allowances);
    }
}

impl FeegrantKeeper for InMemoryFeegrantKeeper {
    fn get_allowance(&self, granter: &AccAddress, grantee: &AccAddress) -> Option<FeeAllowance> {
        self.allowances
            .lock()
            .get(&(granter.clone(), grantee.clone()))
            .cloned()
    }

    fn use_granted_fees(
        &self,
        granter: &AccAddress,
        grantee: &AccAddress,
        fee: &Coins,
        msgs: &[Msg],
    ) -> FeeResult {
        let mut allowances = self.allowances.lock();
        let key = (granter.clone(), grantee.clone());
        let allowance = allowances
            .get_mut(&key)
            .ok_or_else(|| FeeError::InvalidRequest {
                error: "fee-grant not found".to_string(),
            })?;

        if let Some(allowed) = &allowance.allowed_messages {
            for msg in msgs {
                fee_ensure!(
                    allowed.contains(&msg.type_url),
                    FeeError::InvalidRequest {
                        error: format!(
                            "message does not exist in allowed messages: {}",
                            msg.type_url
                        ),
                    }
                );
            }
        }

        if let Some(limit) = &allowance.spend_limit {
            let left = limit
                .checked_sub(fee)
                .ok_or_else(|| FeeError::InsufficientFee {
                    error: "basic allowance: fee limit exceeded".to_string(),
                })?;
            if left.is_zero() {
                // Used up grants are removed.
                allowances.remove(&key);
                return Ok(());
            }
            allowance.spend_limit = Some(left);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "unit_tests/in_memory_tests.rs"]
mod in_memory_tests;
