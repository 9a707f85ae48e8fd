// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::ante::{AnteDecorator, AnteHandler, AnteNext};
use crate::context::{ExecContext, ExecMode};
use crate::flat_fee_schedule::FlatFeeSchedule;
use crate::gas_meter::FlatFeeGasMeter;
use crate::in_memory::{InMemoryAccountKeeper, InMemoryBank, InMemoryFeegrantKeeper};
use crate::keepers::FeeCostCalculator;
use flatfee_config::{FeePipelineConfig, FlatFeeParams};
use flatfee_types::base_types::AccAddress;
use flatfee_types::coin::{Coin, Coins};
use flatfee_types::error::FeeResult;
use flatfee_types::gas::GasMeter;
use flatfee_types::messages::{Msg, Tx};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const MSG_CHEAP: &str = "/test.v1.MsgCheap";
pub const MSG_PRICEY: &str = "/test.v1.MsgPricey";
pub const MSG_MIXED: &str = "/test.v1.MsgMixed";
pub const MSG_FREE: &str = "/test.v1.MsgFree";
pub const MSG_UNPRICED: &str = "/test.v1.MsgUnpriced";

pub fn coins(s: &str) -> Coins {
    s.parse().unwrap()
}

pub fn addr(s: &str) -> AccAddress {
    AccAddress::new(s)
}

pub fn msgs(urls: &[&str]) -> Vec<Msg> {
    urls.iter().map(|u| Msg::new(*u)).collect()
}

/// Default cost 100stake. Cheap is 30stake, pricey 150stake (100 up front, 50 on success),
/// mixed 20stake,5atom and free nothing.
pub fn flat_fee_params() -> FlatFeeParams {
    FlatFeeParams::new(Coin::new(100, "stake"))
        .with_msg_fee(MSG_CHEAP, coins("30stake"))
        .with_msg_fee(MSG_PRICEY, coins("150stake"))
        .with_msg_fee(MSG_MIXED, coins("5atom,20stake"))
        .with_msg_fee(MSG_FREE, Coins::new())
}

pub fn calculator() -> Arc<dyn FeeCostCalculator> {
    Arc::new(FlatFeeSchedule::new(flat_fee_params()))
}

pub fn config() -> Arc<FeePipelineConfig> {
    Arc::new(FeePipelineConfig::default().with_flat_fees(flat_fee_params()))
}

pub fn deliver_ctx() -> ExecContext {
    ExecContext::new("test-chain", 10, ExecMode::Finalize)
}

/// A block context with a flat-fee meter of `limit` gas and costs set for `msgs`.
pub fn ctx_with_costs(limit: u64, msgs: &[Msg]) -> ExecContext {
    let mut ctx = deliver_ctx();
    let base = ctx.new_base_gas_meter(false, limit);
    let mut meter = FlatFeeGasMeter::new(base, calculator());
    meter.set_costs(msgs).unwrap();
    ctx.set_flat_fee_gas_meter(meter);
    ctx
}

/// The in-memory collaborators with a registered fee collector.
pub struct TestKeepers {
    pub accounts: Arc<InMemoryAccountKeeper>,
    pub bank: Arc<InMemoryBank>,
    pub feegrant: Arc<InMemoryFeegrantKeeper>,
    pub fee_collector: AccAddress,
}

impl TestKeepers {
    pub fn new() -> Self {
        let accounts = InMemoryAccountKeeper::new();
        let fee_collector = accounts.add_module_account(flatfee_types::FEE_COLLECTOR_NAME);
        Self {
            accounts,
            bank: InMemoryBank::new(),
            feegrant: InMemoryFeegrantKeeper::new(),
            fee_collector,
        }
    }

    /// Creates an account holding `balance`.
    pub fn funded(&self, name: &str, balance: &str) -> AccAddress {
        let address = addr(name);
        self.accounts.add_account(&address);
        self.bank.fund(&address, &coins(balance));
        address
    }

    pub fn collected(&self) -> Coins {
        self.bank.balance(&self.fee_collector)
    }
}

/// Last stage of a test chain. Records that it was reached and optionally burns gas.
#[derive(Default)]
pub struct Terminator {
    called: AtomicBool,
    gas_to_consume: u64,
}

impl Terminator {
    pub fn consuming(gas_to_consume: u64) -> Self {
        Self {
            called: AtomicBool::new(false),
            gas_to_consume,
        }
    }

    pub fn called(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }
}

impl AnteDecorator for Terminator {
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult {
        self.called.store(true, Ordering::SeqCst);
        if self.gas_to_consume > 0 {
            ctx.gas_meter_mut()
                .consume_gas(self.gas_to_consume, "terminator")?;
        }
        next.run(ctx, tx, simulate)
    }
}

impl AnteDecorator for Arc<Terminator> {
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult {
        (**self).ante_handle(ctx, tx, simulate, next)
    }
}

/// Runs `decorator` followed by a terminator. Returns the result and whether the
/// terminator was reached.
pub fn run_decorator(
    decorator: impl AnteDecorator + 'static,
    ctx: &mut ExecContext,
    tx: &dyn Tx,
    simulate: bool,
) -> (FeeResult, bool) {
    let terminator = Arc::new(Terminator::default());
    let handler = AnteHandler::chain(vec![Box::new(decorator), Box::new(terminator.clone())]);
    let result = handler.handle(ctx, tx, simulate);
    (result, terminator.called())
}
