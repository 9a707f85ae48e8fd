// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Flat-fee transaction pipeline: a fee-aware gas meter, the admission chain that installs it
//! and collects the up-front cost, message dispatch that reports executed messages to it,
//! settlement of the remaining fee, and block-proposal tx selection.

pub mod ante;
pub mod context;
pub mod fee_grant;
pub mod flat_fee_schedule;
pub mod gas_meter;
pub mod in_memory;
pub mod keepers;
pub mod metrics;
pub mod router;
pub mod runner;
pub mod settlement;
pub mod tx_selector;

pub use context::{ExecContext, ExecMode};
pub use gas_meter::FlatFeeGasMeter;
pub use runner::{TxOutcome, TxRunner};

#[cfg(test)]
#[path = "unit_tests/test_utils.rs"]
mod test_utils;
