// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::keepers::FeeCostCalculator;
use flatfee_config::FlatFeeParams;
use flatfee_types::coin::{Coin, Coins};
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::fee_bail;
use flatfee_types::messages::Msg;
use std::collections::HashSet;

/// Prices messages from a static per-type table.
pub struct FlatFeeSchedule {
    params: FlatFeeParams,
    container_msg_types: HashSet<String>,
    default_cost: Coin,
}

impl FlatFeeSchedule {
    pub fn new(params: FlatFeeParams) -> Self {
        let container_msg_types = params.container_msg_types.iter().cloned().collect();
        let default_cost = params.conversion_factor.convert_coin(&params.default_cost);
        Self {
            params,
            container_msg_types,
            default_cost,
        }
    }

    pub fn params(&self) -> &FlatFeeParams {
        &self.params
    }

    /// The default cost in the converted denom.
    pub fn default_cost(&self) -> &Coin {
        &self.default_cost
    }

    /// Converted cost of a single message type. Unknown types cost the default.
    pub fn msg_cost(&self, type_url: &str) -> Coins {
        match self.params.msg_fees.get(type_url) {
            Some(cost) => self.params.conversion_factor.convert_coins(cost),
            None => Coins::from(self.default_cost.clone()),
        }
    }

    fn expand_into(&self, msgs: &[Msg], depth: usize, out: &mut Vec<Msg>) -> FeeResult {
        for msg in msgs {
            out.push(msg.clone());
            if msg.sub_msgs.is_empty() || !self.container_msg_types.contains(&msg.type_url) {
                continue;
            }
            if depth >= self.params.max_expansion_depth {
                fee_bail!(FeeError::InvalidRequest {
                    error: "could not expand sub-messages: max depth exceeded".to_string(),
                });
            }
            self.expand_into(&msg.sub_msgs, depth + 1, out)?;
        }
        Ok(())
    }
}

/// Splits a message cost against the default cost. Amounts in a denom other than the
/// default's are due on success. Up to the default amount is due up front and anything
/// above it on success.
pub fn split_msg_cost(default_cost: &Coin, cost: &Coins) -> (Coins, Coins) {
    let mut up_front = Coins::new();
    let mut on_success = Coins::new();
    for (denom, amount) in cost.iter() {
        if denom != default_cost.denom {
            on_success.add_coin(&Coin::new(amount, denom));
        } else if amount <= default_cost.amount {
            up_front.add_coin(&Coin::new(amount, denom));
        } else {
            up_front.add_coin(default_cost);
            on_success.add_coin(&Coin::new(amount - default_cost.amount, denom));
        }
    }
    (up_front, on_success)
}

impl FeeCostCalculator for FlatFeeSchedule {
    fn calculate_msg_cost(&self, msgs: &[Msg]) -> FeeResult<(Coins, Coins)> {
        let mut up_front = Coins::new();
        let mut on_success = Coins::new();
        for msg in msgs {
            let cost = self.msg_cost(&msg.type_url);
            if cost.is_zero() {
                continue;
            }
            let (u, o) = split_msg_cost(&self.default_cost, &cost);
            up_front = up_front.add(&u);
            on_success = on_success.add(&o);
        }
        Ok((up_front, on_success))
    }

    fn expand_msgs(&self, msgs: &[Msg]) -> FeeResult<Vec<Msg>> {
        let mut out = Vec::with_capacity(msgs.len());
        self.expand_into(msgs, 0, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
#[path = "unit_tests/flat_fee_schedule_tests.rs"]
mod flat_fee_schedule_tests;
