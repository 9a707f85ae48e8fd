// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::utils::{
    adjust_costs_for_test_mode, get_gas_wanted, tx_gas_limit_should_apply, validate_fee_amount,
};
use super::{AnteDecorator, AnteNext};
use crate::context::ExecContext;
use crate::gas_meter::FlatFeeGasMeter;
use crate::keepers::FeeCostCalculator;
use flatfee_config::FeePipelineConfig;
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::fee_ensure;
use flatfee_types::messages::{get_fee_tx, Tx};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Installs the tx's gas meter and turns running out of gas anywhere later in the chain
/// into an `OutOfGas` error. Must be the first stage.
pub struct SetUpContextDecorator {
    config: Arc<FeePipelineConfig>,
    calculator: Arc<dyn FeeCostCalculator>,
}

impl SetUpContextDecorator {
    pub fn new(config: Arc<FeePipelineConfig>, calculator: Arc<dyn FeeCostCalculator>) -> Self {
        Self { config, calculator }
    }
}

/// Converts a raw gas exhaustion signal into the error reported to the user.
pub fn convert_out_of_gas(ctx: &ExecContext, err: FeeError) -> FeeError {
    match err {
        FeeError::GasExhausted { descriptor } => FeeError::OutOfGas {
            descriptor,
            gas_wanted: ctx.gas_meter().limit(),
            gas_used: ctx.gas_meter().gas_consumed(),
        },
        other => other,
    }
}

impl AnteDecorator for SetUpContextDecorator {
    #[instrument(name = "set_up_context", level = "debug", skip_all, fields(simulate = simulate))]
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult {
        let gas_wanted =
            match get_fee_tx(tx).and_then(|fee_tx| get_gas_wanted(&self.config, fee_tx)) {
                Ok(gas_wanted) => gas_wanted,
                Err(e) => {
                    // Nothing can be charged against a tx we cannot meter.
                    let meter = ctx.new_base_gas_meter(simulate, 0);
                    ctx.set_gas_meter(meter);
                    return Err(e);
                }
            };

        let base = ctx.new_base_gas_meter(simulate, gas_wanted);
        ctx.set_flat_fee_gas_meter(FlatFeeGasMeter::new(base, self.calculator.clone()));
        debug!(gas_wanted, "Gas meter installed");

        if let Some(max_block_gas) = ctx.max_block_gas() {
            fee_ensure!(
                gas_wanted <= max_block_gas,
                FeeError::InvalidGasLimit {
                    error: format!(
                        "tx gas limit {gas_wanted} exceeds block max gas {max_block_gas}"
                    ),
                }
            );
            if tx_gas_limit_should_apply(&self.config, tx.msgs()) {
                fee_ensure!(
                    gas_wanted <= self.config.tx_gas_limit,
                    FeeError::InvalidGasLimit {
                        error: format!(
                            "tx gas limit {gas_wanted} exceeds tx max gas {}",
                            self.config.tx_gas_limit
                        ),
                    }
                );
            }
        }

        next.run(ctx, tx, simulate).map_err(|e| convert_out_of_gas(ctx, e))
    }
}

/// Computes the tx's costs and checks that the declared fee covers them.
pub struct FlatFeeSetupDecorator {
    config: Arc<FeePipelineConfig>,
}

impl FlatFeeSetupDecorator {
    pub fn new(config: Arc<FeePipelineConfig>) -> Self {
        Self { config }
    }
}

impl AnteDecorator for FlatFeeSetupDecorator {
    #[instrument(name = "flat_fee_setup", level = "debug", skip_all)]
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult {
        let fee_tx = get_fee_tx(tx)?;
        let skip_fee_check = simulate || ctx.is_init_genesis();

        let meter = ctx.require_flat_fee_gas_meter()?;
        meter
            .set_costs(tx.msgs())
            .map_err(|e| FeeError::CostCalculation {
                error: e.to_string(),
            })?;
        adjust_costs_for_test_mode(&self.config, meter, fee_tx.fee());
        debug!(required_fee = %meter.required_fee_string(), "Msg costs computed");

        if !skip_fee_check {
            validate_fee_amount(&meter.required_fee(), fee_tx.fee())?;
        }

        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
#[path = "../unit_tests/setup_tests.rs"]
mod setup_tests;
