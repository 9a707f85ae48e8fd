// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{ensure, Context, Result};
use flatfee_types::coin::validate_denom;
use flatfee_types::gas::Gas;
use flatfee_types::FEE_COLLECTOR_NAME;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub mod flat_fees;

pub use flat_fees::{ConversionFactor, FlatFeeParams};

pub const DEFAULT_FEE_DENOM: &str = "stake";
pub const DEFAULT_GAS_LIMIT: Gas = 500_000;
pub const TX_GAS_LIMIT: Gas = 4_000_000;
pub const GAS_LIMIT_CEILING: Gas = 100_000_000;
pub const LEGACY_GAS_PRICE_MULTIPLIERS: &[u128] = &[1905, 19050];

/// How costs are adjusted on chains that are only used for testing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestModeOverride {
    /// Up-front cost becomes whatever fee the tx provides; nothing is due on success.
    ChargeProvidedFee,
    /// Everything is free.
    Free,
}

/// Settings shared by every stage of the fee pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FeePipelineConfig {
    #[serde(default = "default_fee_denom")]
    pub fee_denom: String,
    /// Gas limit substituted when a tx does not request a usable one.
    #[serde(default = "default_gas_limit")]
    pub default_gas_limit: Gas,
    /// Upper bound on a single tx's gas when the block has a gas limit.
    #[serde(default = "default_tx_gas_limit")]
    pub tx_gas_limit: Gas,
    /// Requests above this are assumed to be a fee mistakenly sent as gas.
    #[serde(default = "default_gas_limit_ceiling")]
    pub gas_limit_ceiling: Gas,
    #[serde(default = "default_legacy_gas_price_multipliers")]
    pub legacy_gas_price_multipliers: Vec<u128>,
    #[serde(default = "default_fee_collector_name")]
    pub fee_collector_name: String,
    #[serde(default = "default_fee_grants_enabled")]
    pub fee_grants_enabled: bool,
    #[serde(default)]
    pub test_mode: Option<TestModeOverride>,
    #[serde(default)]
    pub flat_fees: FlatFeeParams,
}

fn default_fee_denom() -> String {
    DEFAULT_FEE_DENOM.to_string()
}

fn default_gas_limit() -> Gas {
    DEFAULT_GAS_LIMIT
}

fn default_tx_gas_limit() -> Gas {
    TX_GAS_LIMIT
}

fn default_gas_limit_ceiling() -> Gas {
    GAS_LIMIT_CEILING
}

fn default_legacy_gas_price_multipliers() -> Vec<u128> {
    LEGACY_GAS_PRICE_MULTIPLIERS.to_vec()
}

fn default_fee_collector_name() -> String {
    FEE_COLLECTOR_NAME.to_string()
}

fn default_fee_grants_enabled() -> bool {
    true
}

impl Default for FeePipelineConfig {
    fn default() -> Self {
        Self {
            fee_denom: default_fee_denom(),
            default_gas_limit: DEFAULT_GAS_LIMIT,
            tx_gas_limit: TX_GAS_LIMIT,
            gas_limit_ceiling: GAS_LIMIT_CEILING,
            legacy_gas_price_multipliers: default_legacy_gas_price_multipliers(),
            fee_collector_name: default_fee_collector_name(),
            fee_grants_enabled: true,
            test_mode: None,
            flat_fees: FlatFeeParams::default(),
        }
    }
}

impl FeePipelineConfig {
    pub fn with_flat_fees(mut self, flat_fees: FlatFeeParams) -> Self {
        self.flat_fees = flat_fees;
        self
    }

    pub fn with_test_mode(mut self, test_mode: TestModeOverride) -> Self {
        self.test_mode = Some(test_mode);
        self
    }

    pub fn is_test_mode(&self) -> bool {
        self.test_mode.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        validate_denom(&self.fee_denom).context("invalid fee-denom")?;
        ensure!(self.default_gas_limit > 0, "default-gas-limit must be positive");
        ensure!(self.tx_gas_limit > 0, "tx-gas-limit must be positive");
        ensure!(
            self.gas_limit_ceiling >= self.default_gas_limit,
            "gas-limit-ceiling {} is below default-gas-limit {}",
            self.gas_limit_ceiling,
            self.default_gas_limit
        );
        ensure!(
            !self.fee_collector_name.is_empty(),
            "fee-collector-name must not be empty"
        );
        self.flat_fees.validate().context("invalid flat-fees")
    }
}

pub fn load<P: AsRef<Path>, T: DeserializeOwned + Serialize>(path: P) -> Result<T> {
    let path = path.as_ref();
    debug!("Reading config from {:?}", path);
    Ok(serde_yaml::from_reader(
        std::fs::File::open(path).context(format!("cannot open {:?}", path))?,
    )?)
}

/// Loads and validates a pipeline config.
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<FeePipelineConfig> {
    let config: FeePipelineConfig = load(path)?;
    config.validate()?;
    Ok(config)
}
