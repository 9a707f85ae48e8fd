// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::ante::utils::get_gas_wanted;
use flatfee_config::FeePipelineConfig;
use flatfee_types::gas::Gas;
use flatfee_types::messages::Tx;
use std::sync::Arc;
use tracing::trace;

/// Picks mempool txs for a block proposal within byte and gas budgets.
///
/// A tx is charged against the gas budget with the same limit the ante chain would meter it
/// with, so a tx whose gas field is really a fee amount does not crowd out the block.
pub struct TxSelector {
    config: Arc<FeePipelineConfig>,
    total_tx_bytes: u64,
    total_tx_gas: Gas,
    selected_txs: Vec<Vec<u8>>,
}

impl TxSelector {
    pub fn new(config: Arc<FeePipelineConfig>) -> Self {
        Self {
            config,
            total_tx_bytes: 0,
            total_tx_gas: 0,
            selected_txs: vec![],
        }
    }

    /// A copy of the selected txs, in the order they were selected.
    pub fn selected_txs(&self) -> Vec<Vec<u8>> {
        self.selected_txs.clone()
    }

    pub fn total_tx_bytes(&self) -> u64 {
        self.total_tx_bytes
    }

    pub fn total_tx_gas(&self) -> Gas {
        self.total_tx_gas
    }

    pub fn clear(&mut self) {
        self.total_tx_bytes = 0;
        self.total_tx_gas = 0;
        self.selected_txs.clear();
    }

    /// Offers a tx for the proposal. `max_block_gas == 0` means the block has no gas limit.
    ///
    /// Returns true once the proposal is full and no more txs should be offered.
    pub fn select_tx_for_proposal(
        &mut self,
        max_tx_bytes: u64,
        max_block_gas: Gas,
        tx: &dyn Tx,
        tx_bytes: &[u8],
    ) -> bool {
        let tx_size = tx_bytes.len() as u64;
        let tx_gas = match tx.as_fee_tx() {
            // A tx we cannot work out a limit for will not fit any gas budget.
            Some(fee_tx) => get_gas_wanted(&self.config, fee_tx).unwrap_or(Gas::MAX),
            None => 0,
        };

        match self.total_tx_bytes.checked_add(tx_size) {
            Some(bytes) if bytes <= max_tx_bytes => {
                if max_block_gas == 0 {
                    self.add(bytes, self.total_tx_gas, tx_bytes);
                } else {
                    match self.total_tx_gas.checked_add(tx_gas) {
                        Some(gas) if gas <= max_block_gas => self.add(bytes, gas, tx_bytes),
                        _ => trace!(tx_gas, max_block_gas, "Tx skipped, not enough gas left"),
                    }
                }
            }
            _ => trace!(tx_size, max_tx_bytes, "Tx skipped, not enough bytes left"),
        }

        self.total_tx_bytes >= max_tx_bytes
            || (max_block_gas > 0 && self.total_tx_gas >= max_block_gas)
    }

    fn add(&mut self, total_bytes: u64, total_gas: Gas, tx_bytes: &[u8]) {
        self.total_tx_bytes = total_bytes;
        self.total_tx_gas = total_gas;
        self.selected_txs.push(tx_bytes.to_vec());
    }
}

#[cfg(test)]
#[path = "unit_tests/tx_selector_tests.rs"]
mod tx_selector_tests;
