// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::AccAddress;
use crate::coin::Coins;
use crate::error::{FeeError, FeeResult};
use crate::gas::Gas;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A business message. Container messages (authz exec, proposals, triggers) carry the
/// messages they wrap in `sub_msgs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    pub type_url: String,
    #[serde(default)]
    pub value: Vec<u8>,
    #[serde(default)]
    pub sub_msgs: Vec<Msg>,
}

impl Msg {
    pub fn new(type_url: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
            value: vec![],
            sub_msgs: vec![],
        }
    }

    pub fn with_value(mut self, value: impl Into<Vec<u8>>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_sub_msgs(mut self, sub_msgs: Vec<Msg>) -> Self {
        self.sub_msgs = sub_msgs;
        self
    }
}

impl fmt::Display for Msg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_url)
    }
}

pub fn msg_type_urls(msgs: &[Msg]) -> Vec<String> {
    msgs.iter().map(|m| m.type_url.clone()).collect()
}

pub trait Tx: Send + Sync + fmt::Debug {
    fn msgs(&self) -> &[Msg];

    /// `None` when the transaction carries no fee information.
    fn as_fee_tx(&self) -> Option<&dyn FeeTx>;
}

pub trait FeeTx: Tx {
    fn fee(&self) -> &Coins;
    fn gas(&self) -> Gas;
    fn fee_payer(&self) -> &AccAddress;
    fn fee_granter(&self) -> Option<&AccAddress>;
}

pub fn get_fee_tx(tx: &dyn Tx) -> FeeResult<&dyn FeeTx> {
    tx.as_fee_tx().ok_or_else(|| FeeError::TxDecode {
        error: "Tx must be a FeeTx".to_string(),
    })
}

/// The standard signed transaction envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub msgs: Vec<Msg>,
    pub fee: Coins,
    pub gas_limit: Gas,
    pub fee_payer: AccAddress,
    pub fee_granter: Option<AccAddress>,
    #[serde(default)]
    pub memo: String,
}

impl Transaction {
    pub fn new(fee_payer: AccAddress, msgs: Vec<Msg>) -> Self {
        Self {
            msgs,
            fee: Coins::new(),
            gas_limit: 0,
            fee_payer,
            fee_granter: None,
            memo: String::new(),
        }
    }

    pub fn with_fee(mut self, fee: Coins) -> Self {
        self.fee = fee;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: Gas) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn with_fee_granter(mut self, granter: AccAddress) -> Self {
        self.fee_granter = Some(granter);
        self
    }
}

impl Tx for Transaction {
    fn msgs(&self) -> &[Msg] {
        &self.msgs
    }

    fn as_fee_tx(&self) -> Option<&dyn FeeTx> {
        Some(self)
    }
}

impl FeeTx for Transaction {
    fn fee(&self) -> &Coins {
        &self.fee
    }

    fn gas(&self) -> Gas {
        self.gas_limit
    }

    fn fee_payer(&self) -> &AccAddress {
        &self.fee_payer
    }

    fn fee_granter(&self) -> Option<&AccAddress> {
        self.fee_granter.as_ref()
    }
}

/// A transaction without fee information, e.g. one produced by a chain-internal process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NonFeeTx {
    pub msgs: Vec<Msg>,
}

impl Tx for NonFeeTx {
    fn msgs(&self) -> &[Msg] {
        &self.msgs
    }

    fn as_fee_tx(&self) -> Option<&dyn FeeTx> {
        None
    }
}
