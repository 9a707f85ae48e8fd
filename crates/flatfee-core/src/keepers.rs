// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Interfaces of the modules the fee pipeline talks to. The pipeline only consults them;
//! each implementation owns and synchronizes its own state.

use flatfee_types::base_types::{AccAddress, BaseAccount};
use flatfee_types::coin::{Coin, Coins};
use flatfee_types::error::FeeResult;
use flatfee_types::messages::Msg;
use std::sync::Arc;

/// State whose writes can be held back until the caller decides to keep them.
///
/// Branches nest. `commit` and `discard` close the most recently opened one.
pub trait BranchedStore: Send + Sync {
    /// Starts buffering writes on top of the current state.
    fn branch(&self);

    /// Keeps the writes made since the matching `branch`.
    fn commit(&self);

    /// Drops the writes made since the matching `branch`.
    fn discard(&self);
}

impl<T: BranchedStore + ?Sized> BranchedStore for Arc<T> {
    fn branch(&self) {
        (**self).branch()
    }

    fn commit(&self) {
        (**self).commit()
    }

    fn discard(&self) {
        (**self).discard()
    }
}

/// Prices messages and lists the sub-messages they statically contain.
pub trait FeeCostCalculator: Send + Sync {
    /// Returns `(up_front, on_success)` for the given messages.
    fn calculate_msg_cost(&self, msgs: &[Msg]) -> FeeResult<(Coins, Coins)>;

    /// Returns every message followed by the messages it wraps, recursively.
    fn expand_msgs(&self, msgs: &[Msg]) -> FeeResult<Vec<Msg>>;
}

pub trait BankKeeper: BranchedStore {
    fn send_coins_from_account_to_module(
        &self,
        from: &AccAddress,
        module: &str,
        amount: &Coins,
    ) -> FeeResult;

    fn get_balance(&self, address: &AccAddress, denom: &str) -> Coin;
}

/// A fee allowance from a granter to a grantee.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeAllowance {
    /// `None` means unlimited.
    pub spend_limit: Option<Coins>,
    /// When set, only these message types may be paid for.
    pub allowed_messages: Option<Vec<String>>,
}

impl FeeAllowance {
    pub fn with_spend_limit(spend_limit: Coins) -> Self {
        Self {
            spend_limit: Some(spend_limit),
            allowed_messages: None,
        }
    }
}

pub trait FeegrantKeeper: BranchedStore {
    fn get_allowance(&self, granter: &AccAddress, grantee: &AccAddress)
        -> Option<FeeAllowance>;

    /// Deducts `fee` from the allowance, failing if it is missing or too small.
    fn use_granted_fees(
        &self,
        granter: &AccAddress,
        grantee: &AccAddress,
        fee: &Coins,
        msgs: &[Msg],
    ) -> FeeResult;
}

pub trait AccountKeeper: Send + Sync {
    fn get_account(&self, address: &AccAddress) -> Option<BaseAccount>;

    fn get_module_address(&self, name: &str) -> Option<AccAddress>;
}
