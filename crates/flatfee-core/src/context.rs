// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::gas_meter::FlatFeeGasMeter;
use flatfee_types::dec_coin::DecCoins;
use flatfee_types::error::{FeeError, FeeResult};
use flatfee_types::event::{Event, EventManager};
use flatfee_types::gas::{BasicGasMeter, Gas, GasMeter, InfiniteGasMeter};
use strum::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExecMode {
    /// First validation of a tx on its way into the mempool.
    CheckTx,
    /// Re-validation of a mempool tx after a block was committed.
    ReCheckTx,
    /// Execution as part of a block.
    Finalize,
}

enum TxGasMeter {
    Plain(Box<dyn GasMeter>),
    FlatFee(Box<FlatFeeGasMeter>),
}

impl TxGasMeter {
    fn as_dyn(&self) -> &dyn GasMeter {
        match self {
            TxGasMeter::Plain(m) => m.as_ref(),
            TxGasMeter::FlatFee(m) => &**m,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn GasMeter {
        match self {
            TxGasMeter::Plain(m) => m.as_mut(),
            TxGasMeter::FlatFee(m) => &mut **m,
        }
    }
}

/// Per-transaction execution state handed from stage to stage.
pub struct ExecContext {
    chain_id: String,
    block_height: i64,
    mode: ExecMode,
    max_block_gas: Option<Gas>,
    min_gas_prices: DecCoins,
    gas_meter: TxGasMeter,
    events: EventManager,
}

impl ExecContext {
    pub fn new(chain_id: impl Into<String>, block_height: i64, mode: ExecMode) -> Self {
        Self {
            chain_id: chain_id.into(),
            block_height,
            mode,
            max_block_gas: None,
            min_gas_prices: DecCoins::default(),
            gas_meter: TxGasMeter::Plain(Box::new(InfiniteGasMeter::new())),
            events: EventManager::default(),
        }
    }

    /// A zero limit means the block has no gas limit.
    pub fn with_max_block_gas(mut self, max_block_gas: Gas) -> Self {
        self.max_block_gas = (max_block_gas > 0).then_some(max_block_gas);
        self
    }

    pub fn with_min_gas_prices(mut self, min_gas_prices: DecCoins) -> Self {
        self.min_gas_prices = min_gas_prices;
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn block_height(&self) -> i64 {
        self.block_height
    }

    pub fn mode(&self) -> ExecMode {
        self.mode
    }

    /// True during mempool validation.
    pub fn is_check_tx(&self) -> bool {
        matches!(self.mode, ExecMode::CheckTx | ExecMode::ReCheckTx)
    }

    pub fn is_recheck_tx(&self) -> bool {
        self.mode == ExecMode::ReCheckTx
    }

    /// Genesis transactions run at height zero and are never charged.
    pub fn is_init_genesis(&self) -> bool {
        self.block_height <= 0
    }

    pub fn max_block_gas(&self) -> Option<Gas> {
        self.max_block_gas
    }

    pub fn min_gas_prices(&self) -> &DecCoins {
        &self.min_gas_prices
    }

    pub fn gas_meter(&self) -> &dyn GasMeter {
        self.gas_meter.as_dyn()
    }

    pub fn gas_meter_mut(&mut self) -> &mut dyn GasMeter {
        self.gas_meter.as_dyn_mut()
    }

    pub fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> FeeResult {
        self.gas_meter_mut().consume_gas(amount, descriptor)
    }

    pub fn set_gas_meter(&mut self, meter: Box<dyn GasMeter>) {
        self.gas_meter = TxGasMeter::Plain(meter);
    }

    pub fn set_flat_fee_gas_meter(&mut self, meter: FlatFeeGasMeter) {
        self.gas_meter = TxGasMeter::FlatFee(Box::new(meter));
    }

    /// Installs an unlimited meter when simulating or at genesis, otherwise one bounded by
    /// `limit`.
    pub fn new_base_gas_meter(&self, simulate: bool, limit: Gas) -> Box<dyn GasMeter> {
        if simulate || self.block_height == 0 {
            Box::new(InfiniteGasMeter::new())
        } else {
            Box::new(BasicGasMeter::new(limit))
        }
    }

    pub fn flat_fee_gas_meter(&self) -> Option<&FlatFeeGasMeter> {
        match &self.gas_meter {
            TxGasMeter::FlatFee(m) => Some(&**m),
            TxGasMeter::Plain(_) => None,
        }
    }

    pub fn flat_fee_gas_meter_mut(&mut self) -> Option<&mut FlatFeeGasMeter> {
        match &mut self.gas_meter {
            TxGasMeter::FlatFee(m) => Some(&mut **m),
            TxGasMeter::Plain(_) => None,
        }
    }

    /// Like `flat_fee_gas_meter_mut`, for stages that cannot proceed without one.
    pub fn require_flat_fee_gas_meter(&mut self) -> FeeResult<&mut FlatFeeGasMeter> {
        self.flat_fee_gas_meter_mut().ok_or_else(|| FeeError::Logic {
            error: "gas meter is not a FlatFeeGasMeter".to_string(),
        })
    }

    pub fn emit_event(&mut self, event: Event) {
        self.events.emit(event);
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take()
    }
}
