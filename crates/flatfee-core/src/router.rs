// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::context::ExecContext;
use anyhow::bail;
use flatfee_types::coin::Coins;
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::fee_ensure;
use flatfee_types::messages::Msg;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MsgResponse {
    pub data: Vec<u8>,
}

/// Executes one message type. The router is passed in so handlers can dispatch
/// sub-messages of their own.
pub trait MsgHandler: Send + Sync {
    fn handle(
        &self,
        ctx: &mut ExecContext,
        router: &MsgServiceRouter,
        msg: &Msg,
    ) -> FeeResult<MsgResponse>;
}

impl<F> MsgHandler for F
where
    F: Fn(&mut ExecContext, &MsgServiceRouter, &Msg) -> FeeResult<MsgResponse> + Send + Sync,
{
    fn handle(
        &self,
        ctx: &mut ExecContext,
        router: &MsgServiceRouter,
        msg: &Msg,
    ) -> FeeResult<MsgResponse> {
        self(ctx, router, msg)
    }
}

pub trait CircuitBreaker: Send + Sync {
    fn is_allowed(&self, type_url: &str) -> FeeResult<bool>;
}

/// Routes messages to their handlers, recording each one on the tx's fee meter first.
#[derive(Default)]
pub struct MsgServiceRouter {
    routes: HashMap<String, Arc<dyn MsgHandler>>,
    circuit_breaker: Option<Arc<dyn CircuitBreaker>>,
}

impl MsgServiceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_circuit_breaker(&mut self, circuit_breaker: Arc<dyn CircuitBreaker>) {
        self.circuit_breaker = Some(circuit_breaker);
    }

    /// Each message type can only be registered once.
    pub fn register(
        &mut self,
        type_url: impl Into<String>,
        handler: impl MsgHandler + 'static,
    ) -> anyhow::Result<()> {
        let type_url = type_url.into();
        if self.routes.contains_key(&type_url) {
            bail!(
                "msg service {type_url} has already been registered. Please make sure to only register each service once"
            );
        }
        debug!(%type_url, "Registered msg handler");
        self.routes.insert(type_url, Arc::new(handler));
        Ok(())
    }

    pub fn handler(&self, type_url: &str) -> Option<Arc<dyn MsgHandler>> {
        self.routes.get(type_url).cloned()
    }

    pub fn dispatch(&self, ctx: &mut ExecContext, msg: &Msg) -> FeeResult<MsgResponse> {
        let handler = self
            .handler(&msg.type_url)
            .ok_or_else(|| FeeError::UnknownMsgRoute {
                type_url: msg.type_url.clone(),
            })?;

        consume_msg_fees(ctx, msg);

        if let Some(circuit_breaker) = &self.circuit_breaker {
            fee_ensure!(
                circuit_breaker.is_allowed(&msg.type_url)?,
                FeeError::CircuitBreakerTripped {
                    type_url: msg.type_url.clone(),
                }
            );
        }

        trace!(type_url = %msg.type_url, "Dispatching msg");
        handler.handle(ctx, self, msg)
    }
}

/// Tells the fee meter that `msg` is executing.
///
/// Messages run by governance after a proposal passes never went through the ante chain,
/// so there is no fee meter and nothing to record. Those are executed regardless of fees.
fn consume_msg_fees(ctx: &mut ExecContext, msg: &Msg) {
    if let Some(meter) = ctx.flat_fee_gas_meter_mut() {
        meter.consume_msg(msg);
    }
}

/// Adds a fee owed on top of the message costs. Does nothing for a zero fee or when the
/// context has no fee meter.
pub fn consume_additional_fee(ctx: &mut ExecContext, fee: &Coins) {
    if fee.is_zero() {
        return;
    }
    match ctx.flat_fee_gas_meter_mut() {
        Some(meter) => meter.consume_added_fee(fee),
        None => debug!(%fee, "No fee meter in context, additional fee not recorded"),
    }
}

#[cfg(test)]
#[path = "unit_tests/router_tests.rs"]
mod router_tests;
