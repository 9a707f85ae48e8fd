// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::ante::utils::{pay_fee, validate_fee_amount};
use crate::ante::{PostDecorator, PostNext};
use crate::context::ExecContext;
use crate::fee_grant::get_fee_payer_using_fee_grant;
use crate::keepers::{BankKeeper, FeegrantKeeper};
use flatfee_config::FeePipelineConfig;
use flatfee_types::base_types::AccAddress;
use flatfee_types::coin::Coins;
use flatfee_types::error::{FeeError, FeeResult, FeeResultExt};
use flatfee_types::event::{
    Event, ATTRIBUTE_KEY_ADDITIONAL_FEE, ATTRIBUTE_KEY_BASE_FEE, ATTRIBUTE_KEY_FEE_OVERAGE,
    ATTRIBUTE_KEY_FEE_PAYER, ATTRIBUTE_KEY_FEE_TOTAL, EVENT_TYPE_TX,
};
use flatfee_types::messages::{get_fee_tx, Tx};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Collects the rest of the fee once all of a tx's messages succeeded.
///
/// The whole declared fee is collected, even the part above what was required. Failed txs
/// only pay the up-front cost, which was taken during admission.
pub struct FlatFeePostHandler {
    config: Arc<FeePipelineConfig>,
    bank_keeper: Arc<dyn BankKeeper>,
    feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
}

impl FlatFeePostHandler {
    pub fn new(
        config: Arc<FeePipelineConfig>,
        bank_keeper: Arc<dyn BankKeeper>,
        feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
    ) -> Self {
        Self {
            config,
            bank_keeper,
            feegrant_keeper,
        }
    }

    fn settle(&self, ctx: &mut ExecContext, tx: &dyn Tx, simulate: bool) -> FeeResult {
        let fee_tx = get_fee_tx(tx)?;
        let charge = !simulate && !ctx.is_init_genesis();

        let meter = ctx.require_flat_fee_gas_meter()?;
        meter.finalize().wrap_err("could not finalize gas meter")?;

        let required_fee = meter.required_fee();
        let up_front_cost = meter.up_front_cost().clone();
        let new_charges = meter.added_fees().add(meter.extra_msgs_cost());
        let fee_provided = fee_tx.fee();

        if !new_charges.is_zero() && charge {
            // Costs were discovered during execution. Make sure the fee still covers them.
            validate_fee_amount(&required_fee, fee_provided)?;
        }

        let uncharged = if charge {
            checked_remainder(fee_provided, &up_front_cost)?
        } else {
            // There might not be a fee when simulating, so pretend the required fee was given.
            checked_remainder(&required_fee, &up_front_cost)?
        };
        debug!(%fee_provided, %required_fee, %up_front_cost, %uncharged, "Fee remainder computed");

        let payer = get_fee_payer_using_fee_grant(
            self.feegrant_keeper.as_deref(),
            fee_tx,
            &uncharged,
            tx.msgs(),
        )?;

        if charge && !uncharged.is_zero() {
            pay_fee(
                self.bank_keeper.as_ref(),
                &self.config.fee_collector_name,
                &payer.address,
                &uncharged,
            )
            .wrap_err_with(|| {
                format!(
                    "could not collect fee remainder {:?} upon success",
                    uncharged.to_string()
                )
            })?;
            debug!(%uncharged, payer = %payer.address, "Collected fee remainder");
        } else {
            debug!(%uncharged, simulate, "Skipping collection of fee remainder");
        }

        let overage = if charge {
            checked_remainder(fee_provided, &required_fee)?
        } else {
            Coins::new()
        };
        let on_success_cost = checked_remainder(&required_fee, &up_front_cost)?;
        ctx.emit_event(create_fee_event(
            &payer.address,
            &up_front_cost,
            &on_success_cost,
            &overage,
        ));
        Ok(())
    }
}

fn checked_remainder(total: &Coins, taken: &Coins) -> FeeResult<Coins> {
    total.checked_sub(taken).ok_or_else(|| FeeError::Logic {
        error: format!("cannot subtract {taken} from {total}"),
    })
}

impl PostDecorator for FlatFeePostHandler {
    #[instrument(name = "flat_fee_settlement", level = "debug", skip_all, fields(success = success))]
    fn post_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        success: bool,
        next: PostNext<'_>,
    ) -> FeeResult {
        if !success {
            debug!("Skipping settlement because tx was not successful");
        } else {
            self.settle(ctx, tx, simulate)?;
        }
        next.run(ctx, tx, simulate, success)
    }
}

/// The settlement event. Zero additional fees and overages are left out.
pub fn create_fee_event(
    fee_payer: &AccAddress,
    base_fee: &Coins,
    additional_fee: &Coins,
    overage: &Coins,
) -> Event {
    let mut total = base_fee.clone();
    let mut event = Event::new(EVENT_TYPE_TX)
        .with_attribute(ATTRIBUTE_KEY_FEE_PAYER, fee_payer)
        .with_attribute(ATTRIBUTE_KEY_BASE_FEE, base_fee);
    if !additional_fee.is_zero() {
        total = total.add(additional_fee);
        event = event.with_attribute(ATTRIBUTE_KEY_ADDITIONAL_FEE, additional_fee);
    }
    if !overage.is_zero() {
        total = total.add(overage);
        event = event.with_attribute(ATTRIBUTE_KEY_FEE_OVERAGE, overage);
    }
    event.with_attribute(ATTRIBUTE_KEY_FEE_TOTAL, &total)
}

#[cfg(test)]
#[path = "unit_tests/settlement_tests.rs"]
mod settlement_tests;
