// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, Histogram, IntCounter, IntCounterVec, Registry,
};

const GAS_USED_BUCKETS: &[f64] = &[
    1_000., 10_000., 50_000., 100_000., 250_000., 500_000., 1_000_000., 4_000_000., 10_000_000.,
];

#[derive(Clone, Debug)]
pub struct FeePipelineMetrics {
    pub txs_processed: IntCounter,
    pub ante_rejections: IntCounterVec,
    pub msg_failures: IntCounter,
    pub settlement_successes: IntCounter,
    pub settlement_failures: IntCounter,
    pub tx_gas_used: Histogram,
}

impl FeePipelineMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            txs_processed: register_int_counter_with_registry!(
                "fee_pipeline_txs_processed",
                "Number of txs run through the fee pipeline",
                registry,
            )
            .unwrap(),
            ante_rejections: register_int_counter_vec_with_registry!(
                "fee_pipeline_ante_rejections",
                "Number of txs rejected during admission, by error kind",
                &["kind"],
                registry,
            )
            .unwrap(),
            msg_failures: register_int_counter_with_registry!(
                "fee_pipeline_msg_failures",
                "Number of txs with a failing message",
                registry,
            )
            .unwrap(),
            settlement_successes: register_int_counter_with_registry!(
                "fee_pipeline_settlement_successes",
                "Number of txs whose fee remainder was settled",
                registry,
            )
            .unwrap(),
            settlement_failures: register_int_counter_with_registry!(
                "fee_pipeline_settlement_failures",
                "Number of txs that failed during fee settlement",
                registry,
            )
            .unwrap(),
            tx_gas_used: register_histogram_with_registry!(
                "fee_pipeline_tx_gas_used",
                "Gas consumed per tx",
                GAS_USED_BUCKETS.to_vec(),
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_tests() -> Self {
        Self::new(&Registry::new())
    }
}
