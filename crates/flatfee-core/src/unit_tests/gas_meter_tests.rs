// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::flat_fee_schedule::FlatFeeSchedule;
use flatfee_config::FlatFeeParams;
use flatfee_types::coin::Coin;
use flatfee_types::error::FeeError;
use flatfee_types::gas::{BasicGasMeter, InfiniteGasMeter};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const TYPES: &[&str] = &["/test.MsgA", "/test.MsgB", "/test.MsgC", "/test.MsgFree"];

fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

fn calculator() -> Arc<dyn FeeCostCalculator> {
    let params = FlatFeeParams::new(Coin::new(100, "stake"))
        .with_msg_fee("/test.MsgA", coins("10stake"))
        .with_msg_fee("/test.MsgB", coins("150stake"))
        .with_msg_fee("/test.MsgC", coins("20stake,3atom"))
        .with_msg_fee("/test.MsgFree", Coins::new());
    Arc::new(FlatFeeSchedule::new(params))
}

fn meter() -> FlatFeeGasMeter {
    FlatFeeGasMeter::new(Box::new(InfiniteGasMeter::new()), calculator())
}

fn msgs(urls: &[&str]) -> Vec<Msg> {
    urls.iter().map(|u| Msg::new(*u)).collect()
}

struct FailingCalculator;

impl FeeCostCalculator for FailingCalculator {
    fn calculate_msg_cost(&self, _msgs: &[Msg]) -> FeeResult<(Coins, Coins)> {
        Err(FeeError::InvalidRequest {
            error: "no prices".to_string(),
        })
    }

    fn expand_msgs(&self, msgs: &[Msg]) -> FeeResult<Vec<Msg>> {
        Ok(msgs.to_vec())
    }
}

#[test]
fn test_set_costs() {
    let mut m = meter();
    m.set_costs(&msgs(&["/test.MsgA", "/test.MsgB", "/test.MsgC"]))
        .unwrap();
    assert_eq!(m.up_front_cost(), &coins("130stake"));
    assert_eq!(m.on_success_cost(), &coins("3atom,50stake"));
    assert_eq!(m.required_fee(), coins("3atom,180stake"));
    assert!(m.extra_msgs_cost().is_zero());
    assert!(m.added_fees().is_zero());
}

#[test]
fn test_set_costs_resets_previous_state() {
    let mut m = meter();
    m.set_costs(&msgs(&["/test.MsgA"])).unwrap();
    m.consume_msg(&Msg::new("/test.MsgB"));
    m.consume_added_fee(&coins("5stake"));
    m.finalize().unwrap();
    assert_eq!(m.required_fee(), coins("165stake"));

    m.set_costs(&msgs(&["/test.MsgA"])).unwrap();
    assert!(m.extra_msgs().is_empty());
    assert_eq!(m.required_fee(), coins("10stake"));
}

#[test]
fn test_set_costs_failure_leaves_no_costs() {
    let mut m = meter();
    m.set_costs(&msgs(&["/test.MsgB"])).unwrap();

    let mut failing = FlatFeeGasMeter::new(
        Box::new(InfiniteGasMeter::new()),
        Arc::new(FailingCalculator),
    );
    failing.consume_added_fee(&coins("1stake"));
    let err = failing.set_costs(&msgs(&["/test.MsgB"])).unwrap_err();
    assert!(matches!(err, FeeError::InvalidRequest { .. }));
    assert!(failing.required_fee().is_zero());
    assert_eq!(failing.msg_counts_string(), "<none>");
}

#[test]
fn test_consume_msg_tracks_extras() {
    let mut m = meter();
    m.set_costs(&msgs(&["/test.MsgA", "/test.MsgA"])).unwrap();

    m.consume_msg(&Msg::new("/test.MsgA"));
    m.consume_msg(&Msg::new("/test.MsgA"));
    assert!(m.extra_msgs().is_empty());

    // A third one was not accounted for.
    m.consume_msg(&Msg::new("/test.MsgA"));
    m.consume_msg(&Msg::new("/test.MsgC"));
    assert_eq!(m.extra_msgs(), msgs(&["/test.MsgA", "/test.MsgC"]).as_slice());

    assert!(m.extra_msgs_cost().is_zero());
    m.finalize().unwrap();
    assert_eq!(m.extra_msgs_cost(), &coins("3atom,30stake"));
    assert_eq!(m.required_fee(), coins("3atom,50stake"));

    // Finalizing again does not double count.
    m.finalize().unwrap();
    assert_eq!(m.extra_msgs_cost(), &coins("3atom,30stake"));
}

#[test]
fn test_wrapped_msgs_are_known() {
    let mut m = meter();
    let exec = Msg::new("/cosmos.authz.v1beta1.MsgExec")
        .with_sub_msgs(msgs(&["/test.MsgA", "/test.MsgB"]));
    m.set_costs(&[exec.clone()]).unwrap();
    // exec costs the default.
    assert_eq!(m.up_front_cost(), &coins("210stake"));

    m.consume_msg(&exec);
    m.consume_msg(&Msg::new("/test.MsgA"));
    m.consume_msg(&Msg::new("/test.MsgB"));
    m.finalize().unwrap();
    assert!(m.extra_msgs_cost().is_zero());
}

#[test]
fn test_gas_is_delegated() {
    let mut m = FlatFeeGasMeter::new(Box::new(BasicGasMeter::new(100)), calculator());
    m.consume_gas(10, "ReadFlat").unwrap();
    m.consume_gas(20, "ReadFlat").unwrap();
    m.consume_gas(30, "txSize").unwrap();
    assert_eq!(m.gas_consumed(), 60);
    assert_eq!(m.limit(), 100);
    assert_eq!(m.gas_remaining(), 40);

    let err = m.consume_gas(50, "WriteFlat").unwrap_err();
    assert!(matches!(err, FeeError::GasExhausted { .. }));
    assert!(m.is_past_limit());
    assert_eq!(m.gas_consumed_to_limit(), 100);

    assert_eq!(
        m.gas_use_string(),
        [
            "        30 =   2x ReadFlat",
            "        50 =   1x WriteFlat",
            "        30 =   1x txSize",
            "------------------------------",
            "       110 = Total gas",
        ]
        .join("\n")
    );
}

#[test]
fn test_msg_counts_string() {
    let mut m = meter();
    assert_eq!(m.msg_counts_string(), "<none>");

    m.set_costs(&msgs(&["/test.MsgA"])).unwrap();
    assert_eq!(m.msg_counts_string(), "/test.MsgA");

    m.set_costs(&msgs(&["/test.MsgB", "/test.MsgA", "/test.MsgB", "/test.MsgB"]))
        .unwrap();
    assert_eq!(m.msg_counts_string(), "3x/test.MsgB, /test.MsgA");

    m.consume_msg(&Msg::new("/test.MsgC"));
    assert_eq!(m.msg_counts_string(), "3x/test.MsgB, /test.MsgA, /test.MsgC");
}

#[test]
fn test_required_fee_string() {
    let mut m = meter();
    m.set_costs(&msgs(&["/test.MsgA"])).unwrap();
    assert_eq!(m.required_fee_string(), "10stake");

    m.set_costs(&msgs(&["/test.MsgB"])).unwrap();
    assert_eq!(
        m.required_fee_string(),
        "150stake = 100stake (up-front) + 50stake (on success)"
    );

    m.consume_msg(&Msg::new("/test.MsgB"));
    m.consume_msg(&Msg::new("/test.MsgA"));
    m.consume_added_fee(&coins("7stake"));
    m.finalize().unwrap();
    assert_eq!(
        m.required_fee_string(),
        "167stake = 100stake (up-front) + 50stake (on success) + 10stake (extra msgs) + 7stake (added fees)"
    );
    assert!(m.details_string().starts_with(
        "FlatFeeGasMeter:\n  Msgs: /test.MsgB, /test.MsgA\n  Cost: 167stake = "
    ));
    assert!(m.to_string().contains("    up-front cost: 100stake"));
}

fn arb_msgs() -> impl Strategy<Value = Vec<Msg>> {
    prop::collection::vec(prop::sample::select(TYPES), 0..8)
        .prop_map(|urls| urls.into_iter().map(Msg::new).collect())
}

proptest! {
    #[test]
    fn test_required_fee_after_set_costs(tx_msgs in arb_msgs()) {
        let mut m = meter();
        m.set_costs(&tx_msgs).unwrap();
        let (up_front, on_success) = calculator().calculate_msg_cost(&tx_msgs).unwrap();
        prop_assert_eq!(m.required_fee(), up_front.add(&on_success));
    }

    #[test]
    fn test_consuming_known_msgs_costs_nothing_extra(tx_msgs in arb_msgs()) {
        let mut m = meter();
        m.set_costs(&tx_msgs).unwrap();
        let before = m.required_fee();
        for msg in tx_msgs.iter().rev() {
            m.consume_msg(msg);
        }
        m.finalize().unwrap();
        prop_assert!(m.extra_msgs_cost().is_zero());
        prop_assert_eq!(m.required_fee(), before);
    }

    #[test]
    fn test_extra_msgs_priced_as_a_set(tx_msgs in arb_msgs(), extras in arb_msgs()) {
        let mut m = meter();
        m.set_costs(&tx_msgs).unwrap();
        for msg in tx_msgs.iter().chain(extras.iter()) {
            m.consume_msg(msg);
        }
        m.finalize().unwrap();
        let (up_front, on_success) = calculator().calculate_msg_cost(&extras).unwrap();
        prop_assert_eq!(m.extra_msgs_cost(), &up_front.add(&on_success));
    }

    #[test]
    fn test_added_fees_accumulate(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let a = Coins::from(Coin::new(a.into(), "stake"));
        let b = Coins::from_coins([Coin::new(b.into(), "stake"), Coin::new(1, "atom")]);

        let mut split = meter();
        split.consume_added_fee(&a);
        split.consume_added_fee(&b);

        let mut joined = meter();
        joined.consume_added_fee(&a.add(&b));

        prop_assert_eq!(split.added_fees(), joined.added_fees());
        prop_assert_eq!(split.required_fee(), joined.required_fee());
    }
}
