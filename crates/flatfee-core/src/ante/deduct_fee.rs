// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::utils::{pay_fee, validate_has_balance};
use super::{AnteDecorator, AnteNext};
use crate::context::ExecContext;
use crate::fee_grant::{get_fee_payer_using_fee_grant, resolve_fee_payer};
use crate::keepers::{AccountKeeper, BankKeeper, FeegrantKeeper};
use flatfee_config::FeePipelineConfig;
use flatfee_types::error::{FeeError, FeeResult, FeeResultExt};
use flatfee_types::event::{
    Event, ATTRIBUTE_KEY_FEE, ATTRIBUTE_KEY_FEE_PAYER, ATTRIBUTE_KEY_MIN_FEE_CHARGED,
    EVENT_TYPE_TX,
};
use flatfee_types::messages::{get_fee_tx, Tx};
use flatfee_types::{fee_bail, fee_ensure};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Collects the up-front cost and makes sure the payer can cover the whole declared fee.
///
/// The balance check is against the full fee so that txs which could never pay are
/// rejected before their messages run. Funds received during the tx cannot be used to
/// pay for it.
pub struct DeductFeeDecorator {
    config: Arc<FeePipelineConfig>,
    account_keeper: Arc<dyn AccountKeeper>,
    bank_keeper: Arc<dyn BankKeeper>,
    feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
}

impl DeductFeeDecorator {
    pub fn new(
        config: Arc<FeePipelineConfig>,
        account_keeper: Arc<dyn AccountKeeper>,
        bank_keeper: Arc<dyn BankKeeper>,
        feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
    ) -> Self {
        Self {
            config,
            account_keeper,
            bank_keeper,
            feegrant_keeper,
        }
    }

    fn check_deduct_up_front_cost(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
    ) -> FeeResult {
        let fee_collector = &self.config.fee_collector_name;
        if self.account_keeper.get_module_address(fee_collector).is_none() {
            fee_bail!(FeeError::Logic {
                error: format!("{fee_collector} module account has not been set"),
            });
        }

        let fee_tx = get_fee_tx(tx)?;
        let up_front_cost = ctx.require_flat_fee_gas_meter()?.up_front_cost().clone();
        let payer = resolve_fee_payer(self.feegrant_keeper.as_deref(), fee_tx)?;

        let full_fee = fee_tx.fee();
        if !simulate {
            fee_ensure!(
                self.account_keeper.get_account(&payer.address).is_some(),
                FeeError::UnknownAddress {
                    error: format!(
                        "fee payer address {:?} does not exist",
                        payer.address.to_string()
                    ),
                }
            );
            validate_has_balance(self.bank_keeper.as_ref(), &payer.address, full_fee)?;
        }

        // The allowance is only drawn on once the payer is known to be able to pay.
        let payer = get_fee_payer_using_fee_grant(
            self.feegrant_keeper.as_deref(),
            fee_tx,
            &up_front_cost,
            tx.msgs(),
        )?;

        if !simulate && !ctx.is_init_genesis() && !up_front_cost.is_zero() {
            pay_fee(
                self.bank_keeper.as_ref(),
                fee_collector,
                &payer.address,
                &up_front_cost,
            )
            .wrap_err_with(|| {
                format!(
                    "could not collect up-front fee of {:?}",
                    up_front_cost.to_string()
                )
            })?;
            debug!(%up_front_cost, payer = %payer.address, "Up-front cost collected");
        } else {
            debug!(%up_front_cost, simulate, "Skipping collection of up-front cost");
        }

        ctx.emit_event(
            Event::new(EVENT_TYPE_TX)
                .with_attribute(ATTRIBUTE_KEY_FEE, full_fee)
                .with_attribute(ATTRIBUTE_KEY_FEE_PAYER, &payer.address),
        );
        ctx.emit_event(
            Event::new(EVENT_TYPE_TX)
                .with_attribute(ATTRIBUTE_KEY_MIN_FEE_CHARGED, &up_front_cost)
                .with_attribute(ATTRIBUTE_KEY_FEE_PAYER, &payer.address),
        );
        Ok(())
    }
}

impl AnteDecorator for DeductFeeDecorator {
    #[instrument(name = "deduct_fee", level = "debug", skip_all)]
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult {
        self.check_deduct_up_front_cost(ctx, tx, simulate)?;
        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
#[path = "../unit_tests/deduct_fee_tests.rs"]
mod deduct_fee_tests;
