// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{FeeError, FeeResult};
use crate::fee_ensure;
use itertools::Itertools;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const MIN_DENOM_LEN: usize = 3;
pub const MAX_DENOM_LEN: usize = 128;

/// Checks a denomination the way the bank module does: a leading letter, then letters,
/// digits or one of `/:._-`.
pub fn validate_denom(denom: &str) -> FeeResult {
    fee_ensure!(
        (MIN_DENOM_LEN..=MAX_DENOM_LEN).contains(&denom.len()),
        FeeError::InvalidCoin {
            error: format!("invalid denom length: {denom:?}"),
        }
    );
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    fee_ensure!(
        first_ok && rest_ok,
        FeeError::InvalidCoin {
            error: format!("invalid denom: {denom:?}"),
        }
    );
    Ok(())
}

/// Splits `"100stake"` into its amount and denom parts.
pub(crate) fn split_amount_denom(s: &str) -> FeeResult<(&str, &str)> {
    let s = s.trim();
    let idx = s
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| FeeError::InvalidCoin {
            error: format!("missing denom in {s:?}"),
        })?;
    let (amount, denom) = s.split_at(idx);
    fee_ensure!(
        !amount.is_empty(),
        FeeError::InvalidCoin {
            error: format!("missing amount in {s:?}"),
        }
    );
    validate_denom(denom)?;
    Ok((amount, denom))
}

/// A single token amount.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(amount: u128, denom: impl Into<String>) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

impl FromStr for Coin {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (amount, denom) = split_amount_denom(s)?;
        let amount = amount.parse::<u128>().map_err(|e| FeeError::InvalidCoin {
            error: format!("invalid amount in {s:?}: {e}"),
        })?;
        Ok(Coin::new(amount, denom))
    }
}

/// A normalized set of token amounts: one entry per denom, sorted by denom, no zero entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub struct Coins(BTreeMap<String, u128>);

impl Coins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a normalized set, summing duplicate denoms and dropping zero amounts.
    pub fn from_coins(coins: impl IntoIterator<Item = Coin>) -> Self {
        let mut out = Coins::new();
        for coin in coins {
            out.add_coin(&coin);
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0.get(denom).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u128)> + '_ {
        self.0.iter().map(|(d, a)| (d.as_str(), *a))
    }

    pub fn to_vec(&self) -> Vec<Coin> {
        self.iter().map(|(d, a)| Coin::new(a, d)).collect()
    }

    pub fn denoms(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.keys().map(String::as_str)
    }

    /// Amounts saturate at `u128::MAX`.
    pub fn add_coin(&mut self, coin: &Coin) {
        if coin.is_zero() {
            return;
        }
        let entry = self.0.entry(coin.denom.clone()).or_insert(0);
        *entry = entry.saturating_add(coin.amount);
    }

    pub fn add(&self, other: &Coins) -> Coins {
        let mut out = self.clone();
        for (denom, amount) in other.iter() {
            out.add_coin(&Coin::new(amount, denom));
        }
        out
    }

    /// Returns `None` if any resulting amount would be negative.
    pub fn checked_sub(&self, other: &Coins) -> Option<Coins> {
        let mut out = self.clone();
        for (denom, amount) in other.iter() {
            let have = out.amount_of(denom);
            let left = have.checked_sub(amount)?;
            if left == 0 {
                out.0.remove(denom);
            } else {
                out.0.insert(denom.to_string(), left);
            }
        }
        Some(out)
    }

    /// Per-denom subtraction clamped at zero.
    pub fn saturating_sub(&self, other: &Coins) -> Coins {
        Coins::from_coins(
            self.iter()
                .map(|(d, a)| Coin::new(a.saturating_sub(other.amount_of(d)), d)),
        )
    }

    /// True if `self` holds at least every amount in `other`.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.iter().all(|(d, a)| self.amount_of(d) >= a)
    }

    /// True if `self` holds at least the amount of any one denom in `other`.
    /// Always false for an empty `other`.
    pub fn is_any_gte(&self, other: &Coins) -> bool {
        other.iter().any(|(d, a)| self.amount_of(d) >= a)
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Coins::from_coins([coin])
    }
}

impl FromIterator<Coin> for Coins {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        Coins::from_coins(iter)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.iter().map(|(d, a)| format!("{a}{d}")).join(",")
        )
    }
}

impl FromStr for Coins {
    type Err = FeeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = BTreeMap::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let coin = Coin::from_str(part)?;
            fee_ensure!(
                !out.contains_key(&coin.denom),
                FeeError::InvalidCoin {
                    error: format!("duplicate denomination {}", coin.denom),
                }
            );
            if !coin.is_zero() {
                out.insert(coin.denom, coin.amount);
            }
        }
        Ok(Coins(out))
    }
}

#[cfg(test)]
#[path = "unit_tests/coin_tests.rs"]
mod coin_tests;
