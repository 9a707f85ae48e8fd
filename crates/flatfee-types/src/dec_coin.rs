// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::coin::{split_amount_denom, Coin, Coins};
use crate::error::{FeeError, FeeResult};
use crate::fee_ensure;
use itertools::Itertools;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A decimal token amount, used for gas prices.
#[derive(Clone, Debug, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Decimal,
}

impl DecCoin {
    pub fn new(amount: Decimal, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for DecCoin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.denom)
    }
}

impl FromStr for DecCoin {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, denom) = split_amount_denom(s)?;
        let amount = Decimal::from_str(amount).map_err(|e| FeeError::InvalidCoin {
            error: format!("invalid decimal amount in {s:?}: {e}"),
        })?;
        fee_ensure!(
            !amount.is_sign_negative(),
            FeeError::InvalidCoin {
                error: format!("negative amount in {s:?}"),
            }
        );
        Ok(DecCoin::new(amount, denom))
    }
}

/// A set of decimal token amounts, one per denom. Zero entries are kept so that a
/// configured zero price stays visible.
#[derive(Clone, Debug, Default, PartialEq, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct DecCoins(BTreeMap<String, Decimal>);

impl DecCoins {
    pub fn new(coins: impl IntoIterator<Item = DecCoin>) -> FeeResult<Self> {
        let mut out = BTreeMap::new();
        for coin in coins {
            fee_ensure!(
                out.insert(coin.denom.clone(), coin.amount).is_none(),
                FeeError::InvalidCoin {
                    error: format!("duplicate denomination {}", coin.denom),
                }
            );
        }
        Ok(Self(out))
    }

    /// True when every amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.values().all(Decimal::is_zero)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Decimal)> + '_ {
        self.0.iter().map(|(d, a)| (d.as_str(), a))
    }

    /// `ceil(price * gas)` for every denom.
    pub fn fee_for_gas(&self, gas: u64) -> Coins {
        let gas = Decimal::from(gas);
        self.iter()
            .map(|(denom, price)| {
                let amount = price
                    .checked_mul(gas)
                    .unwrap_or(Decimal::MAX)
                    .ceil()
                    .to_u128()
                    .unwrap_or(u128::MAX);
                Coin::new(amount, denom)
            })
            .collect()
    }
}

impl fmt::Display for DecCoins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.0
                .iter()
                .map(|(d, a)| format!("{}{d}", a.normalize()))
                .join(",")
        )
    }
}

impl FromStr for DecCoins {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coins = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(DecCoin::from_str)
            .collect::<FeeResult<Vec<_>>>()?;
        DecCoins::new(coins)
    }
}
