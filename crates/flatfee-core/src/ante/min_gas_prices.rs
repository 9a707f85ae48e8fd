// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{AnteDecorator, AnteNext};
use crate::context::ExecContext;
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::fee_ensure;
use flatfee_types::messages::{get_fee_tx, Tx};
use tracing::instrument;

/// Enforces the node's own minimum gas prices on txs entering its mempool.
///
/// The fee has to cover `ceil(price * gas)` in at least one of the configured denoms. The
/// check is skipped when simulating and outside mempool validation, since gas prices are a
/// node-local setting and must not influence block execution.
#[derive(Default)]
pub struct MinGasPricesDecorator;

impl MinGasPricesDecorator {
    pub fn new() -> Self {
        Self
    }
}

impl AnteDecorator for MinGasPricesDecorator {
    #[instrument(name = "min_gas_prices", level = "debug", skip_all)]
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult {
        if simulate {
            return next.run(ctx, tx, simulate);
        }
        let fee_tx = get_fee_tx(tx)?;
        if !ctx.is_check_tx() {
            return next.run(ctx, tx, simulate);
        }

        let required = ctx.min_gas_prices().fee_for_gas(fee_tx.gas());
        if !required.is_zero() {
            let fee = fee_tx.fee();
            fee_ensure!(
                fee.is_any_gte(&required),
                FeeError::InsufficientFee {
                    error: format!("min-gas-prices not met; got: {fee} required: {required}"),
                }
            );
        }

        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
#[path = "../unit_tests/min_gas_prices_tests.rs"]
mod min_gas_prices_tests;
