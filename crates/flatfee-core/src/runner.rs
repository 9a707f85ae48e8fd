// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::ante::{convert_out_of_gas, AnteHandler, PostHandler};
use crate::context::ExecContext;
use crate::metrics::FeePipelineMetrics;
use crate::router::{MsgResponse, MsgServiceRouter};
use flatfee_types::error::FeeResult;
use flatfee_types::event::{
    Event, ATTRIBUTE_KEY_FEE, ATTRIBUTE_KEY_MIN_FEE_CHARGED, EVENT_TYPE_TX,
};
use flatfee_types::gas::Gas;
use flatfee_types::messages::Tx;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// What running a tx produced.
#[derive(Debug)]
pub struct TxOutcome {
    pub result: FeeResult<Vec<MsgResponse>>,
    pub gas_wanted: Gas,
    pub gas_used: Gas,
    pub events: Vec<Event>,
}

impl TxOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The fee to report to the user: the declared fee for a successful tx, the amount
    /// actually charged for a failed one. `None` if the tx was rejected during admission.
    pub fn reported_fee(&self) -> Option<&str> {
        let key = if self.is_ok() {
            ATTRIBUTE_KEY_FEE
        } else {
            ATTRIBUTE_KEY_MIN_FEE_CHARGED
        };
        self.events
            .iter()
            .filter(|e| e.ty == EVENT_TYPE_TX)
            .find_map(|e| e.attribute(key))
    }
}

/// Runs txs through admission, message execution and settlement.
pub struct TxRunner {
    ante_handler: AnteHandler,
    router: Arc<MsgServiceRouter>,
    post_handler: PostHandler,
    metrics: Option<Arc<FeePipelineMetrics>>,
}

impl TxRunner {
    pub fn new(
        ante_handler: AnteHandler,
        router: Arc<MsgServiceRouter>,
        post_handler: PostHandler,
    ) -> Self {
        Self {
            ante_handler,
            router,
            post_handler,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<FeePipelineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn router(&self) -> &MsgServiceRouter {
        &self.router
    }

    /// A tx rejected during admission keeps no state changes and no events. Once admitted,
    /// its admission events are kept even when the tx fails later on. Events of the
    /// messages and of settlement are only kept when the whole tx succeeds.
    #[instrument(level = "debug", skip_all, fields(mode = %ctx.mode(), height = ctx.block_height(), simulate = simulate))]
    pub fn run_tx(&self, ctx: &mut ExecContext, tx: &dyn Tx, simulate: bool) -> TxOutcome {
        if let Some(metrics) = &self.metrics {
            metrics.txs_processed.inc();
        }

        if let Err(e) = self.ante_handler.handle(ctx, tx, simulate) {
            debug!(error = %e, "Tx rejected during admission");
            if let Some(metrics) = &self.metrics {
                metrics.ante_rejections.with_label_values(&[e.kind()]).inc();
            }
            // Nothing a rejected tx did is kept, its events included.
            ctx.take_events();
            return self.outcome(ctx, Err(e), vec![]);
        }
        let mut events = ctx.take_events();

        let result = self.run_msgs(ctx, tx);
        let success = result.is_ok();
        if let Err(e) = &result {
            debug!(error = %e, "Msg execution failed");
            if let Some(metrics) = &self.metrics {
                metrics.msg_failures.inc();
            }
            ctx.take_events();
        }

        let result = match self.post_handler.handle(ctx, tx, simulate, success) {
            Ok(()) => {
                if success {
                    if let Some(metrics) = &self.metrics {
                        metrics.settlement_successes.inc();
                    }
                    events.extend(ctx.take_events());
                }
                result
            }
            Err(e) => {
                if success {
                    debug!(error = %e, "Fee settlement failed");
                    if let Some(metrics) = &self.metrics {
                        metrics.settlement_failures.inc();
                    }
                } else {
                    warn!(error = %e, "Post chain failed for unsuccessful tx");
                }
                ctx.take_events();
                // The first failure is the one reported.
                result.and(Err(e))
            }
        };
        self.outcome(ctx, result, events)
    }

    fn run_msgs(&self, ctx: &mut ExecContext, tx: &dyn Tx) -> FeeResult<Vec<MsgResponse>> {
        let mut responses = Vec::with_capacity(tx.msgs().len());
        for msg in tx.msgs() {
            let response = self
                .router
                .dispatch(ctx, msg)
                .map_err(|e| convert_out_of_gas(ctx, e))?;
            responses.push(response);
        }
        Ok(responses)
    }

    fn outcome(
        &self,
        ctx: &ExecContext,
        result: FeeResult<Vec<MsgResponse>>,
        events: Vec<Event>,
    ) -> TxOutcome {
        let meter = ctx.gas_meter();
        let gas_used = meter.gas_consumed_to_limit();
        if let Some(metrics) = &self.metrics {
            metrics.tx_gas_used.observe(gas_used as f64);
        }
        if let Some(flat_fee_meter) = ctx.flat_fee_gas_meter() {
            debug!(details = %flat_fee_meter.details_string(), "Tx fee details");
        }
        TxOutcome {
            result,
            gas_wanted: meter.limit(),
            gas_used,
            events,
        }
    }
}

#[cfg(test)]
#[path = "unit_tests/runner_tests.rs"]
mod runner_tests;
