// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::in_memory::InMemoryFeegrantKeeper;
use crate::keepers::FeeAllowance;
use crate::test_utils::{addr, coins, msgs, MSG_CHEAP, MSG_PRICEY};
use flatfee_types::messages::{Transaction, Tx};
use pretty_assertions::assert_eq;

fn granted_tx(fee: &str) -> Transaction {
    Transaction::new(addr("grantee"), msgs(&[MSG_CHEAP]))
        .with_fee(coins(fee))
        .with_fee_granter(addr("granter"))
}

fn keeper_with_allowance(limit: &str) -> std::sync::Arc<InMemoryFeegrantKeeper> {
    let keeper = InMemoryFeegrantKeeper::new();
    keeper.grant_allowance(
        &addr("granter"),
        &addr("grantee"),
        FeeAllowance::with_spend_limit(coins(limit)),
    );
    keeper
}

#[test]
fn test_payer_without_granter() {
    let tx = Transaction::new(addr("payer"), vec![]).with_fee(coins("10stake"));
    let payer = get_fee_payer_using_fee_grant(None, &tx, &coins("10stake"), tx.msgs()).unwrap();
    assert_eq!(
        payer,
        FeePayer {
            address: addr("payer"),
            used_fee_grant: false,
        }
    );
}

#[test]
fn test_granter_equal_to_payer_is_ignored() {
    let tx = Transaction::new(addr("payer"), vec![])
        .with_fee(coins("10stake"))
        .with_fee_granter(addr("payer"));
    let payer = get_fee_payer_using_fee_grant(None, &tx, &coins("10stake"), tx.msgs()).unwrap();
    assert!(!payer.used_fee_grant);
}

#[test]
fn test_granter_pays_from_allowance() {
    let keeper = keeper_with_allowance("100stake");
    let tx = granted_tx("60stake");

    let payer =
        get_fee_payer_using_fee_grant(Some(&*keeper), &tx, &coins("60stake"), tx.msgs())
            .unwrap();
    assert_eq!(payer.address, addr("granter"));
    assert!(payer.used_fee_grant);
    assert_eq!(
        keeper
            .get_allowance(&addr("granter"), &addr("grantee"))
            .unwrap()
            .spend_limit,
        Some(coins("40stake"))
    );

    // Zero amounts resolve the granter without touching the allowance.
    get_fee_payer_using_fee_grant(Some(&*keeper), &tx, &Coins::new(), tx.msgs()).unwrap();
    assert_eq!(
        keeper
            .get_allowance(&addr("granter"), &addr("grantee"))
            .unwrap()
            .spend_limit,
        Some(coins("40stake"))
    );
}

#[test]
fn test_exhausted_allowance_is_removed() {
    let keeper = keeper_with_allowance("60stake");
    let tx = granted_tx("60stake");
    get_fee_payer_using_fee_grant(Some(&*keeper), &tx, &coins("60stake"), tx.msgs())
        .unwrap();
    assert!(keeper
        .get_allowance(&addr("granter"), &addr("grantee"))
        .is_none());
}

#[test]
fn test_grants_disabled() {
    let tx = granted_tx("60stake");
    assert_eq!(
        get_fee_payer_using_fee_grant(None, &tx, &coins("60stake"), tx.msgs()).unwrap_err(),
        FeeError::FeeGrantsDisabled
    );
}

#[test]
fn test_allowance_too_small() {
    let keeper = keeper_with_allowance("50stake");
    let tx = granted_tx("60stake");
    let err =
        get_fee_payer_using_fee_grant(Some(&*keeper), &tx, &coins("60stake"), tx.msgs())
            .unwrap_err();
    assert_eq!(
        err,
        FeeError::FeeGrant {
            granter: "granter".to_string(),
            grantee: "grantee".to_string(),
            fee: "60stake".to_string(),
            msgs: vec![MSG_CHEAP.to_string()],
            error: "insufficient fee: basic allowance: fee limit exceeded".to_string(),
        }
    );
    // Nothing was deducted.
    assert_eq!(
        keeper
            .get_allowance(&addr("granter"), &addr("grantee"))
            .unwrap()
            .spend_limit,
        Some(coins("50stake"))
    );
}

#[test]
fn test_allowance_restricted_to_msg_types() {
    let keeper = InMemoryFeegrantKeeper::new();
    keeper.grant_allowance(
        &addr("granter"),
        &addr("grantee"),
        FeeAllowance {
            spend_limit: None,
            allowed_messages: Some(vec![MSG_PRICEY.to_string()]),
        },
    );
    let tx = granted_tx("60stake");
    let err =
        get_fee_payer_using_fee_grant(Some(&*keeper), &tx, &coins("60stake"), tx.msgs())
            .unwrap_err();
    assert!(matches!(err, FeeError::FeeGrant { .. }));
    assert!(err
        .to_string()
        .contains("message does not exist in allowed messages"));
}

#[test]
fn test_missing_grant() {
    let keeper = InMemoryFeegrantKeeper::new();
    let tx = granted_tx("60stake");
    let err =
        get_fee_payer_using_fee_grant(Some(&*keeper), &tx, &coins("60stake"), tx.msgs())
            .unwrap_err();
    assert!(err.to_string().ends_with("invalid request: fee-grant not found"));
}

#[test]
fn test_resolve_fee_payer_leaves_allowance_alone() {
    let keeper = keeper_with_allowance("100stake");
    let tx = granted_tx("60stake");

    let payer = resolve_fee_payer(Some(&*keeper), &tx).unwrap();
    assert_eq!(
        payer,
        FeePayer {
            address: addr("granter"),
            used_fee_grant: true,
        }
    );
    assert_eq!(
        keeper
            .get_allowance(&addr("granter"), &addr("grantee"))
            .unwrap()
            .spend_limit,
        Some(coins("100stake"))
    );
    assert_eq!(
        resolve_fee_payer(None, &tx).unwrap_err(),
        FeeError::FeeGrantsDisabled
    );
}
