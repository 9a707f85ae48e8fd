// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{bail, ensure, Result};
use flatfee_types::coin::{validate_denom, Coin, Coins};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 10;

/// Message types whose `sub_msgs` are charged as if submitted directly.
pub const DEFAULT_CONTAINER_MSG_TYPES: &[&str] = &[
    "/cosmos.authz.v1beta1.MsgExec",
    "/cosmos.gov.v1.MsgSubmitProposal",
];

/// Ratio used to turn costs defined in one denom into the fee denom.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConversionFactor {
    pub definition_amount: Coin,
    pub converted_amount: Coin,
}

impl ConversionFactor {
    pub fn identity(denom: &str) -> Self {
        Self {
            definition_amount: Coin::new(1, denom),
            converted_amount: Coin::new(1, denom),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.definition_amount.denom)?;
        validate_denom(&self.converted_amount.denom)?;
        ensure!(
            !self.definition_amount.is_zero(),
            "invalid definition amount {}: must be positive",
            self.definition_amount
        );
        ensure!(
            !self.converted_amount.is_zero(),
            "invalid converted amount {}: must be positive",
            self.converted_amount
        );
        Ok(())
    }

    /// Converts a coin in the definition denom, rounding up. Coins of any other denom pass
    /// through unchanged.
    pub fn convert_coin(&self, coin: &Coin) -> Coin {
        if coin.denom != self.definition_amount.denom
            || self.definition_amount == self.converted_amount
            || self.definition_amount.is_zero()
        {
            return coin.clone();
        }
        let def = self.definition_amount.amount;
        let amount = coin
            .amount
            .checked_mul(self.converted_amount.amount)
            .map(|n| n.div_ceil(def))
            .unwrap_or(u128::MAX);
        Coin::new(amount, self.converted_amount.denom.clone())
    }

    pub fn convert_coins(&self, coins: &Coins) -> Coins {
        coins
            .to_vec()
            .iter()
            .map(|c| self.convert_coin(c))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlatFeeParams {
    /// Cost of any message type without an entry in `msg_fees`, in the definition denom.
    pub default_cost: Coin,
    pub conversion_factor: ConversionFactor,
    /// Message type URL to cost. An empty cost makes the type free.
    #[serde(default)]
    pub msg_fees: BTreeMap<String, Coins>,
    #[serde(default = "default_container_msg_types")]
    pub container_msg_types: Vec<String>,
    #[serde(default = "default_max_expansion_depth")]
    pub max_expansion_depth: usize,
}

fn default_container_msg_types() -> Vec<String> {
    DEFAULT_CONTAINER_MSG_TYPES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_expansion_depth() -> usize {
    DEFAULT_MAX_EXPANSION_DEPTH
}

impl FlatFeeParams {
    pub fn new(default_cost: Coin) -> Self {
        let conversion_factor = ConversionFactor::identity(&default_cost.denom);
        Self {
            default_cost,
            conversion_factor,
            msg_fees: BTreeMap::new(),
            container_msg_types: default_container_msg_types(),
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
        }
    }

    pub fn with_msg_fee(mut self, type_url: impl Into<String>, cost: Coins) -> Self {
        self.msg_fees.insert(type_url.into(), cost);
        self
    }

    pub fn with_conversion_factor(mut self, factor: ConversionFactor) -> Self {
        self.conversion_factor = factor;
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.default_cost.denom)?;
        self.conversion_factor.validate()?;
        for type_url in self.msg_fees.keys() {
            if type_url.is_empty() {
                bail!("msg fee entry with empty type url");
            }
        }
        ensure!(
            self.max_expansion_depth > 0,
            "max-expansion-depth must be positive"
        );
        Ok(())
    }
}

impl Default for FlatFeeParams {
    fn default() -> Self {
        Self::new(Coin::new(100, "stake"))
    }
}
