// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::gas_meter::FlatFeeGasMeter;
use crate::keepers::BankKeeper;
use flatfee_config::{FeePipelineConfig, TestModeOverride};
use flatfee_types::base_types::AccAddress;
use flatfee_types::coin::Coins;
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::fee_ensure;
use flatfee_types::gas::Gas;
use flatfee_types::messages::{FeeTx, Msg};
use tracing::debug;

/// Works out the gas limit to use for a tx.
///
/// Clients that simulate with a gas price of one fee-denom unit end up sending the fee as
/// the gas limit, and clients that skip simulation send no gas limit at all. Both get the
/// default limit. A fee that looks like it was computed with one of the legacy gas prices
/// is rejected so the client can fix its settings instead of overpaying.
pub fn get_gas_wanted(config: &FeePipelineConfig, fee_tx: &dyn FeeTx) -> FeeResult<Gas> {
    let tx_gas = fee_tx.gas();
    if tx_gas == 0 {
        debug!(
            method = "get_gas_wanted",
            tx_gas,
            returning = config.default_gas_limit,
            "No gas limit provided. Using default."
        );
        return Ok(config.default_gas_limit);
    }
    if tx_gas > config.gas_limit_ceiling {
        debug!(
            method = "get_gas_wanted",
            tx_gas,
            ceiling = config.gas_limit_ceiling,
            returning = config.default_gas_limit,
            "Gas limit above ceiling. Using default."
        );
        return Ok(config.default_gas_limit);
    }

    let fee = fee_tx.fee();
    let fee_amount = fee.amount_of(&config.fee_denom);
    if fee_amount == 0 {
        debug!(
            method = "get_gas_wanted",
            tx_gas,
            %fee,
            returning = tx_gas,
            "No fee denom in fee. Using provided gas limit."
        );
        return Ok(tx_gas);
    }

    if fee_amount == u128::from(tx_gas) {
        debug!(
            method = "get_gas_wanted",
            tx_gas,
            %fee,
            returning = config.default_gas_limit,
            "Gas limit equals fee amount. Using default gas limit."
        );
        return Ok(config.default_gas_limit);
    }

    if is_legacy_gas_price(config, fee_amount, tx_gas) {
        debug!(
            method = "get_gas_wanted",
            tx_gas,
            %fee,
            "Gas limit indicates old gas-prices value."
        );
        return Err(FeeError::LegacyGasPrice {
            fee_denom: config.fee_denom.clone(),
        });
    }

    debug!(
        method = "get_gas_wanted",
        tx_gas,
        %fee,
        returning = tx_gas,
        "Using provided gas limit."
    );
    Ok(tx_gas)
}

pub fn is_legacy_gas_price(config: &FeePipelineConfig, fee_amount: u128, gas: Gas) -> bool {
    config
        .legacy_gas_price_multipliers
        .iter()
        .any(|m| u128::from(gas).checked_mul(*m) == Some(fee_amount))
}

pub fn is_gov_prop(msg: &Msg) -> bool {
    msg.type_url.starts_with("/cosmos.gov.") && msg.type_url.ends_with(".MsgSubmitProposal")
}

/// False for an empty list.
pub fn is_only_gov_props(msgs: &[Msg]) -> bool {
    !msgs.is_empty() && msgs.iter().all(is_gov_prop)
}

/// The per-tx gas cap is lifted in test mode and for txs that only submit governance
/// proposals, which can carry large payloads.
pub fn tx_gas_limit_should_apply(config: &FeePipelineConfig, msgs: &[Msg]) -> bool {
    !config.is_test_mode() && !is_only_gov_props(msgs)
}

/// Replaces the computed costs on chains configured for testing.
pub fn adjust_costs_for_test_mode(
    config: &FeePipelineConfig,
    meter: &mut FlatFeeGasMeter,
    fee_provided: &Coins,
) {
    match config.test_mode {
        None => {}
        Some(TestModeOverride::ChargeProvidedFee) => {
            meter.set_up_front_and_on_success(fee_provided.clone(), Coins::new())
        }
        Some(TestModeOverride::Free) => {
            meter.set_up_front_and_on_success(Coins::new(), Coins::new())
        }
    }
}

pub fn validate_fee_amount(required: &Coins, provided: &Coins) -> FeeResult {
    fee_ensure!(
        provided.is_all_gte(required),
        FeeError::InsufficientFee {
            error: format!(
                "fee required: {:?}, fee provided: {:?}, shortfall: {:?}",
                required.to_string(),
                provided.to_string(),
                required.saturating_sub(provided).to_string()
            ),
        }
    );
    Ok(())
}

pub fn validate_has_balance(
    bank: &dyn BankKeeper,
    address: &AccAddress,
    required: &Coins,
) -> FeeResult {
    if required.is_zero() {
        return Ok(());
    }
    let balance: Coins = required
        .denoms()
        .map(|denom| bank.get_balance(address, denom))
        .collect();
    fee_ensure!(
        balance.is_all_gte(required),
        FeeError::InsufficientFunds {
            error: format!(
                "account {:?} balance: {:?}, required: {:?}",
                address.to_string(),
                balance.to_string(),
                required.to_string()
            ),
        }
    );
    Ok(())
}

/// Sends `fee` from `address` to the fee collector module.
pub fn pay_fee(
    bank: &dyn BankKeeper,
    fee_collector: &str,
    address: &AccAddress,
    fee: &Coins,
) -> FeeResult {
    if fee.is_zero() {
        return Ok(());
    }
    bank.send_coins_from_account_to_module(address, fee_collector, fee)
        .map_err(|e| FeeError::InsufficientFunds {
            error: format!("{e}: account: {address}"),
        })
}

#[cfg(test)]
#[path = "../unit_tests/ante_utils_tests.rs"]
mod ante_utils_tests;
