// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::keepers::FeeCostCalculator;
use flatfee_types::coin::Coins;
use flatfee_types::error::FeeResult;
use flatfee_types::gas::{Gas, GasMeter};
use flatfee_types::messages::{msg_type_urls, Msg};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A gas meter that also keeps track of the fee a transaction owes.
///
/// Costs are computed once from the tx's messages (`set_costs`). Messages dispatched
/// beyond those (`consume_msg`) are collected and priced at settlement (`finalize`).
/// Business logic may add fees at any point (`consume_added_fee`).
///
/// Gas accounting is delegated to the wrapped meter; this type only records per-descriptor
/// totals for diagnostics.
pub struct FlatFeeGasMeter {
    base: Box<dyn GasMeter>,
    calculator: Arc<dyn FeeCostCalculator>,

    up_front_cost: Coins,
    on_success_cost: Coins,
    extra_msgs_cost: Coins,
    added_fees: Coins,

    known_msgs: BTreeMap<String, usize>,
    extra_msgs: Vec<Msg>,
    // Every message type seen, in order.
    msg_type_urls: Vec<String>,

    used: BTreeMap<String, Gas>,
    counts: BTreeMap<String, u64>,
}

impl FlatFeeGasMeter {
    pub fn new(base: Box<dyn GasMeter>, calculator: Arc<dyn FeeCostCalculator>) -> Self {
        Self {
            base,
            calculator,
            up_front_cost: Coins::new(),
            on_success_cost: Coins::new(),
            extra_msgs_cost: Coins::new(),
            added_fees: Coins::new(),
            known_msgs: BTreeMap::new(),
            extra_msgs: vec![],
            msg_type_urls: vec![],
            used: BTreeMap::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Computes the costs of `msgs` (and anything they wrap) and resets everything else
    /// fee related. On error the meter is left with no costs.
    pub fn set_costs(&mut self, msgs: &[Msg]) -> FeeResult {
        self.up_front_cost = Coins::new();
        self.on_success_cost = Coins::new();
        self.extra_msgs_cost = Coins::new();
        self.added_fees = Coins::new();
        self.known_msgs.clear();
        self.extra_msgs.clear();
        self.msg_type_urls.clear();

        let expanded = self.calculator.expand_msgs(msgs)?;
        let (up_front, on_success) = self.calculator.calculate_msg_cost(&expanded)?;

        self.msg_type_urls = msg_type_urls(&expanded);
        for url in &self.msg_type_urls {
            *self.known_msgs.entry(url.clone()).or_default() += 1;
        }
        self.up_front_cost = up_front;
        self.on_success_cost = on_success;
        Ok(())
    }

    /// Records that `msg` is about to be executed.
    pub fn consume_msg(&mut self, msg: &Msg) {
        if let Some(count) = self.known_msgs.get_mut(&msg.type_url) {
            if *count > 0 {
                *count -= 1;
                return;
            }
        }
        debug!(type_url = %msg.type_url, "Extra msg encountered");
        self.msg_type_urls.push(msg.type_url.clone());
        self.extra_msgs.push(msg.clone());
    }

    pub fn consume_added_fee(&mut self, fee: &Coins) {
        self.added_fees = self.added_fees.add(fee);
    }

    /// Prices the extra messages. Safe to call more than once.
    pub fn finalize(&mut self) -> FeeResult {
        self.extra_msgs_cost = Coins::new();
        if self.extra_msgs.is_empty() {
            return Ok(());
        }
        let (up_front, on_success) = self.calculator.calculate_msg_cost(&self.extra_msgs)?;
        self.extra_msgs_cost = up_front.add(&on_success);
        Ok(())
    }

    pub fn up_front_cost(&self) -> &Coins {
        &self.up_front_cost
    }

    pub fn on_success_cost(&self) -> &Coins {
        &self.on_success_cost
    }

    pub fn extra_msgs_cost(&self) -> &Coins {
        &self.extra_msgs_cost
    }

    pub fn added_fees(&self) -> &Coins {
        &self.added_fees
    }

    pub fn extra_msgs(&self) -> &[Msg] {
        &self.extra_msgs
    }

    /// Overrides the computed costs. Used by test-mode cost adjustments.
    pub fn set_up_front_and_on_success(&mut self, up_front: Coins, on_success: Coins) {
        self.up_front_cost = up_front;
        self.on_success_cost = on_success;
    }

    pub fn required_fee(&self) -> Coins {
        self.up_front_cost
            .add(&self.on_success_cost)
            .add(&self.extra_msgs_cost)
            .add(&self.added_fees)
    }

    /// The type URLs seen, duplicates collapsed, e.g. `"a, 3xb"`.
    pub fn msg_counts_string(&self) -> String {
        match self.msg_type_urls.as_slice() {
            [] => return "<none>".to_string(),
            [only] => return only.clone(),
            _ => {}
        }
        let counts = self.msg_type_urls.iter().counts();
        self.msg_type_urls
            .iter()
            .unique()
            .map(|url| match counts[url] {
                1 => url.clone(),
                n => format!("{n}x{url}"),
            })
            .join(", ")
    }

    /// One line per gas descriptor, then the total.
    pub fn gas_use_string(&self) -> String {
        let lines = self
            .used
            .iter()
            .map(|(desc, used)| {
                let count = self.counts.get(desc).copied().unwrap_or(0);
                format!("{used:>10} = {count:>3}x {desc}")
            })
            .join("\n");
        let total: Gas = self.used.values().fold(0, |acc, g| acc.saturating_add(*g));
        format!("{lines}\n{}\n{total:>10} = Total gas", "-".repeat(30))
    }

    /// The required fee and, when it has more than one component, its breakdown.
    pub fn required_fee_string(&self) -> String {
        let parts = [
            (&self.up_front_cost, "up-front"),
            (&self.on_success_cost, "on success"),
            (&self.extra_msgs_cost, "extra msgs"),
            (&self.added_fees, "added fees"),
        ]
        .into_iter()
        .filter(|(coins, _)| !coins.is_zero())
        .map(|(coins, label)| format!("{coins} ({label})"))
        .collect::<Vec<_>>();

        let total = self.required_fee();
        if parts.len() > 1 {
            format!("{total} = {}", parts.join(" + "))
        } else {
            total.to_string()
        }
    }

    pub fn details_string(&self) -> String {
        format!(
            "FlatFeeGasMeter:\n  Msgs: {}\n  Cost: {}\n   Gas:\n{}",
            self.msg_counts_string(),
            self.required_fee_string(),
            self.gas_use_string()
        )
    }
}

impl GasMeter for FlatFeeGasMeter {
    fn gas_consumed(&self) -> Gas {
        self.base.gas_consumed()
    }

    fn gas_consumed_to_limit(&self) -> Gas {
        self.base.gas_consumed_to_limit()
    }

    fn gas_remaining(&self) -> Gas {
        self.base.gas_remaining()
    }

    fn limit(&self) -> Gas {
        self.base.limit()
    }

    fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> FeeResult {
        let used = self.used.entry(descriptor.to_string()).or_default();
        *used = used.saturating_add(amount);
        *self.counts.entry(descriptor.to_string()).or_default() += 1;
        self.base.consume_gas(amount, descriptor)
    }

    fn is_past_limit(&self) -> bool {
        self.base.is_past_limit()
    }

    fn is_out_of_gas(&self) -> bool {
        self.base.is_out_of_gas()
    }
}

impl fmt::Debug for FlatFeeGasMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatFeeGasMeter")
            .field("base", &self.base)
            .field("up_front_cost", &self.up_front_cost)
            .field("on_success_cost", &self.on_success_cost)
            .field("extra_msgs_cost", &self.extra_msgs_cost)
            .field("added_fees", &self.added_fees)
            .field("known_msgs", &self.known_msgs)
            .field("extra_msgs", &self.extra_msgs)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FlatFeeGasMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [
            ("msg type urls", self.msg_counts_string()),
            ("up-front cost", self.up_front_cost.to_string()),
            ("on-success cost", self.on_success_cost.to_string()),
            ("extra msgs cost", self.extra_msgs_cost.to_string()),
            ("added fees", self.added_fees.to_string()),
            ("gas meter type", self.base.to_string()),
        ];
        write!(
            f,
            "FlatFeeGasMeter:\n{}",
            parts
                .iter()
                .map(|(label, value)| format!("{label:>17}: {value}"))
                .join("\n")
        )
    }
}

#[cfg(test)]
#[path = "unit_tests/gas_meter_tests.rs"]
mod gas_meter_tests;
