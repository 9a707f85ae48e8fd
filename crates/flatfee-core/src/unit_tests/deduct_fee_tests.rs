// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::in_memory::InMemoryAccountKeeper;
use crate::keepers::FeeAllowance;
use crate::test_utils::{
    addr, coins, config, ctx_with_costs, deliver_ctx, msgs, run_decorator, TestKeepers,
    MSG_CHEAP, MSG_PRICEY,
};
use flatfee_types::messages::Transaction;
use pretty_assertions::assert_eq;

fn decorator(keepers: &TestKeepers, with_grants: bool) -> DeductFeeDecorator {
    DeductFeeDecorator::new(
        config(),
        keepers.accounts.clone(),
        keepers.bank.clone(),
        with_grants.then(|| keepers.feegrant.clone() as Arc<dyn FeegrantKeeper>),
    )
}

fn pricey_tx(payer: &str, fee: &str) -> Transaction {
    Transaction::new(addr(payer), msgs(&[MSG_PRICEY]))
        .with_gas_limit(1000)
        .with_fee(coins(fee))
}

#[test]
fn test_deduct_up_front_cost() {
    let keepers = TestKeepers::new();
    let payer = keepers.funded("payer", "500stake");
    let tx = pricey_tx("payer", "150stake");
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, called) = run_decorator(decorator(&keepers, false), &mut ctx, &tx, false);
    result.unwrap();
    assert!(called);
    assert_eq!(keepers.collected(), coins("100stake"));
    assert_eq!(keepers.bank.balance(&payer), coins("400stake"));

    let events = ctx.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].attribute(ATTRIBUTE_KEY_FEE), Some("150stake"));
    assert_eq!(events[0].attribute(ATTRIBUTE_KEY_FEE_PAYER), Some("payer"));
    assert_eq!(
        events[1].attribute(ATTRIBUTE_KEY_MIN_FEE_CHARGED),
        Some("100stake")
    );
}

#[test]
fn test_deduct_checks_balance_for_full_fee() {
    let keepers = TestKeepers::new();
    let payer = keepers.funded("payer", "120stake");
    let tx = pricey_tx("payer", "150stake");
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, called) = run_decorator(decorator(&keepers, false), &mut ctx, &tx, false);
    assert!(matches!(result, Err(FeeError::InsufficientFunds { .. })));
    assert!(!called);
    assert!(keepers.collected().is_zero());
    assert_eq!(keepers.bank.balance(&payer), coins("120stake"));
    assert!(ctx.events().is_empty());
}

#[test]
fn test_deduct_rejects_unknown_payer() {
    let keepers = TestKeepers::new();
    let tx = pricey_tx("nobody", "150stake");
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, _) = run_decorator(decorator(&keepers, false), &mut ctx, &tx, false);
    assert_eq!(
        result.unwrap_err().to_string(),
        r#"unknown address: fee payer address "nobody" does not exist"#
    );
}

#[test]
fn test_deduct_requires_fee_collector() {
    let keepers = TestKeepers::new();
    keepers.funded("payer", "500stake");
    let no_modules = DeductFeeDecorator::new(
        config(),
        InMemoryAccountKeeper::new(),
        keepers.bank.clone(),
        None,
    );
    let tx = pricey_tx("payer", "150stake");
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, _) = run_decorator(no_modules, &mut ctx, &tx, false);
    assert_eq!(
        result.unwrap_err(),
        FeeError::Logic {
            error: "fee_collector module account has not been set".to_string()
        }
    );
}

#[test]
fn test_deduct_skips_collection_when_simulating() {
    let keepers = TestKeepers::new();
    // Simulations need neither an account nor funds.
    let tx = pricey_tx("ghost", "");
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, called) = run_decorator(decorator(&keepers, false), &mut ctx, &tx, true);
    result.unwrap();
    assert!(called);
    assert!(keepers.collected().is_zero());
    assert_eq!(
        ctx.events()[1].attribute(ATTRIBUTE_KEY_MIN_FEE_CHARGED),
        Some("100stake")
    );
}

#[test]
fn test_deduct_nothing_for_free_msgs() {
    let keepers = TestKeepers::new();
    keepers.funded("payer", "1stake");
    let tx = Transaction::new(addr("payer"), msgs(&["/test.v1.MsgFree"])).with_gas_limit(1000);
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    run_decorator(decorator(&keepers, false), &mut ctx, &tx, false)
        .0
        .unwrap();
    assert!(keepers.collected().is_zero());
}

#[test]
fn test_deduct_from_fee_granter() {
    let keepers = TestKeepers::new();
    let granter = keepers.funded("granter", "1000stake");
    let grantee = keepers.funded("grantee", "0stake");
    keepers.feegrant.grant_allowance(
        &granter,
        &grantee,
        FeeAllowance::with_spend_limit(coins("300stake")),
    );
    let tx = pricey_tx("grantee", "150stake").with_fee_granter(granter.clone());
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    run_decorator(decorator(&keepers, true), &mut ctx, &tx, false)
        .0
        .unwrap();
    assert_eq!(keepers.bank.balance(&granter), coins("900stake"));
    assert_eq!(keepers.collected(), coins("100stake"));
    assert_eq!(ctx.events()[0].attribute(ATTRIBUTE_KEY_FEE_PAYER), Some("granter"));

    assert_eq!(
        keepers
            .feegrant
            .get_allowance(&granter, &grantee)
            .unwrap()
            .spend_limit,
        Some(coins("200stake"))
    );
}

#[test]
fn test_deduct_keeps_allowance_when_granter_cannot_pay() {
    let keepers = TestKeepers::new();
    let granter = keepers.funded("granter", "150stake");
    let grantee = keepers.funded("grantee", "0stake");
    keepers.feegrant.grant_allowance(
        &granter,
        &grantee,
        FeeAllowance::with_spend_limit(coins("300stake")),
    );
    let tx = pricey_tx("grantee", "200stake").with_fee_granter(granter.clone());
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, called) = run_decorator(decorator(&keepers, true), &mut ctx, &tx, false);
    assert!(matches!(result, Err(FeeError::InsufficientFunds { .. })));
    assert!(!called);
    assert!(keepers.collected().is_zero());
    assert_eq!(keepers.bank.balance(&granter), coins("150stake"));
    assert_eq!(
        keepers
            .feegrant
            .get_allowance(&granter, &grantee)
            .unwrap()
            .spend_limit,
        Some(coins("300stake"))
    );
}

#[test]
fn test_deduct_with_granter_but_grants_disabled() {
    let keepers = TestKeepers::new();
    let granter = keepers.funded("granter", "1000stake");
    keepers.funded("grantee", "1000stake");
    let tx = pricey_tx("grantee", "150stake").with_fee_granter(granter);
    let mut ctx = ctx_with_costs(1000, tx.msgs());

    let (result, _) = run_decorator(decorator(&keepers, false), &mut ctx, &tx, false);
    assert_eq!(result.unwrap_err(), FeeError::FeeGrantsDisabled);
}

#[test]
fn test_deduct_needs_flat_fee_meter() {
    let keepers = TestKeepers::new();
    keepers.funded("payer", "500stake");
    let mut ctx = deliver_ctx();
    let tx = Transaction::new(addr("payer"), msgs(&[MSG_CHEAP]));
    let (result, _) = run_decorator(decorator(&keepers, false), &mut ctx, &tx, false);
    assert!(matches!(result, Err(FeeError::Logic { .. })));
}
