// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::test_utils::{coins, ctx_with_costs, deliver_ctx, msgs, MSG_CHEAP, MSG_PRICEY};
use pretty_assertions::assert_eq;

fn ok_handler(
    _ctx: &mut ExecContext,
    _router: &MsgServiceRouter,
    msg: &Msg,
) -> FeeResult<MsgResponse> {
    Ok(MsgResponse {
        data: msg.type_url.clone().into_bytes(),
    })
}

/// Dispatches every wrapped message.
fn container_handler(
    ctx: &mut ExecContext,
    router: &MsgServiceRouter,
    msg: &Msg,
) -> FeeResult<MsgResponse> {
    for sub in &msg.sub_msgs {
        router.dispatch(ctx, sub)?;
    }
    Ok(MsgResponse::default())
}

fn router() -> MsgServiceRouter {
    let mut router = MsgServiceRouter::new();
    router.register(MSG_CHEAP, ok_handler).unwrap();
    router.register(MSG_PRICEY, ok_handler).unwrap();
    router.register("/test.v1.MsgWrap", container_handler).unwrap();
    router
}

struct DenyList(Vec<&'static str>);

impl CircuitBreaker for DenyList {
    fn is_allowed(&self, type_url: &str) -> FeeResult<bool> {
        Ok(!self.0.contains(&type_url))
    }
}

#[test]
fn test_register_rejects_duplicates() {
    let mut router = router();
    let err = router.register(MSG_CHEAP, ok_handler).unwrap_err();
    assert!(err.to_string().contains("has already been registered"));
    assert!(router.handler(MSG_CHEAP).is_some());
    assert!(router.handler("/test.v1.Nope").is_none());
}

#[test]
fn test_dispatch_calls_handler() {
    let router = router();
    let mut ctx = deliver_ctx();
    let response = router.dispatch(&mut ctx, &Msg::new(MSG_CHEAP)).unwrap();
    assert_eq!(response.data, MSG_CHEAP.as_bytes());
}

#[test]
fn test_dispatch_unknown_route() {
    let router = router();
    let mut ctx = ctx_with_costs(1000, &[]);
    let err = router
        .dispatch(&mut ctx, &Msg::new("/test.v1.Nope"))
        .unwrap_err();
    assert_eq!(
        err,
        FeeError::UnknownMsgRoute {
            type_url: "/test.v1.Nope".to_string()
        }
    );
    // Unroutable messages are never recorded.
    assert!(ctx.flat_fee_gas_meter().unwrap().extra_msgs().is_empty());
}

#[test]
fn test_dispatch_records_msgs_on_meter() {
    let router = router();
    let mut ctx = ctx_with_costs(1000, &msgs(&[MSG_CHEAP]));

    router.dispatch(&mut ctx, &Msg::new(MSG_CHEAP)).unwrap();
    assert!(ctx.flat_fee_gas_meter().unwrap().extra_msgs().is_empty());

    // A message the costs were not computed for is an extra.
    let wrap = Msg::new("/test.v1.MsgWrap").with_sub_msgs(msgs(&[MSG_PRICEY]));
    router.dispatch(&mut ctx, &wrap).unwrap();
    let meter = ctx.flat_fee_gas_meter_mut().unwrap();
    assert_eq!(
        msg_type_urls_of(meter.extra_msgs()),
        vec!["/test.v1.MsgWrap", MSG_PRICEY]
    );
    meter.finalize().unwrap();
    assert_eq!(meter.extra_msgs_cost(), &coins("250stake"));
}

fn msg_type_urls_of(msgs: &[Msg]) -> Vec<&str> {
    msgs.iter().map(|m| m.type_url.as_str()).collect()
}

#[test]
fn test_dispatch_without_flat_fee_meter() {
    let router = router();
    let mut ctx = deliver_ctx();
    let wrap = Msg::new("/test.v1.MsgWrap").with_sub_msgs(msgs(&[MSG_CHEAP, MSG_PRICEY]));
    router.dispatch(&mut ctx, &wrap).unwrap();
    assert!(ctx.flat_fee_gas_meter().is_none());
}

#[test]
fn test_circuit_breaker() {
    let mut router = router();
    router.set_circuit_breaker(Arc::new(DenyList(vec![MSG_PRICEY])));
    let mut ctx = ctx_with_costs(1000, &[]);

    router.dispatch(&mut ctx, &Msg::new(MSG_CHEAP)).unwrap();
    let err = router
        .dispatch(&mut ctx, &Msg::new(MSG_PRICEY))
        .unwrap_err();
    assert_eq!(
        err,
        FeeError::CircuitBreakerTripped {
            type_url: MSG_PRICEY.to_string()
        }
    );
    // The tripped message was still recorded before being refused.
    assert_eq!(ctx.flat_fee_gas_meter().unwrap().extra_msgs().len(), 2);
}

#[test]
fn test_consume_additional_fee() {
    let mut ctx = ctx_with_costs(1000, &msgs(&[MSG_CHEAP]));
    consume_additional_fee(&mut ctx, &coins("5stake"));
    consume_additional_fee(&mut ctx, &Coins::new());
    consume_additional_fee(&mut ctx, &coins("2atom,1stake"));
    let meter = ctx.flat_fee_gas_meter().unwrap();
    assert_eq!(meter.added_fees(), &coins("2atom,6stake"));
    assert_eq!(meter.required_fee(), coins("2atom,36stake"));

    // No meter, nothing to record and nothing to fail.
    consume_additional_fee(&mut deliver_ctx(), &coins("5stake"));
}
