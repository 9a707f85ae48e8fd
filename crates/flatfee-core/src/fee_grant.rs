// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::keepers::FeegrantKeeper;
use flatfee_types::base_types::AccAddress;
use flatfee_types::coin::Coins;
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::messages::{msg_type_urls, FeeTx, Msg};
use tracing::debug;

/// The account a fee is taken from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeePayer {
    pub address: AccAddress,
    pub used_fee_grant: bool,
}

/// Works out who pays for `fee_tx` without touching any allowance: the granter when the
/// tx names one other than its fee payer, the fee payer otherwise.
pub fn resolve_fee_payer(
    feegrant_keeper: Option<&dyn FeegrantKeeper>,
    fee_tx: &dyn FeeTx,
) -> FeeResult<FeePayer> {
    let fee_payer = fee_tx.fee_payer();
    match fee_tx.fee_granter() {
        Some(granter) if granter != fee_payer => {
            if feegrant_keeper.is_none() {
                return Err(FeeError::FeeGrantsDisabled);
            }
            Ok(FeePayer {
                address: granter.clone(),
                used_fee_grant: true,
            })
        }
        _ => Ok(FeePayer {
            address: fee_payer.clone(),
            used_fee_grant: false,
        }),
    }
}

/// Works out who pays `amount` for `fee_tx`.
///
/// If the tx names a granter other than its fee payer, `amount` is taken out of the
/// granter's allowance for the payer and the granter pays. A zero amount resolves the
/// granter without touching the allowance.
pub fn get_fee_payer_using_fee_grant(
    feegrant_keeper: Option<&dyn FeegrantKeeper>,
    fee_tx: &dyn FeeTx,
    amount: &Coins,
    msgs: &[Msg],
) -> FeeResult<FeePayer> {
    let payer = resolve_fee_payer(feegrant_keeper, fee_tx)?;
    if !payer.used_fee_grant || amount.is_zero() {
        return Ok(payer);
    }

    let keeper = feegrant_keeper.ok_or(FeeError::FeeGrantsDisabled)?;
    let granter = &payer.address;
    let grantee = fee_tx.fee_payer();
    keeper
        .use_granted_fees(granter, grantee, amount, msgs)
        .map_err(|e| FeeError::FeeGrant {
            granter: granter.to_string(),
            grantee: grantee.to_string(),
            fee: amount.to_string(),
            msgs: msg_type_urls(msgs),
            error: e.to_string(),
        })?;
    debug!(%granter, %grantee, %amount, "Used fee grant");
    Ok(payer)
}

#[cfg(test)]
#[path = "unit_tests/fee_grant_tests.rs"]
mod fee_grant_tests;
