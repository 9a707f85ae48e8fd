// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{FeeError, FeeResult};
use std::fmt;

pub type Gas = u64;

macro_rules! ok_or_gas_error {
    ($cond:expr, $variant:ident, $descriptor:expr) => {
        if !$cond {
            Err(FeeError::$variant {
                descriptor: $descriptor.to_string(),
            })
        } else {
            Ok(())
        }
    };
}

/// Tracks gas consumption for one transaction.
///
/// `consume_gas` returns `FeeError::GasExhausted` once the running total passes the
/// limit. The consumed amount is still recorded so the caller can report it.
pub trait GasMeter: Send + fmt::Debug + fmt::Display {
    fn gas_consumed(&self) -> Gas;
    /// Consumed gas, capped at the limit.
    fn gas_consumed_to_limit(&self) -> Gas;
    fn gas_remaining(&self) -> Gas;
    fn limit(&self) -> Gas;
    fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> FeeResult;
    fn is_past_limit(&self) -> bool;
    fn is_out_of_gas(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct BasicGasMeter {
    limit: Gas,
    consumed: Gas,
}

impl BasicGasMeter {
    pub fn new(limit: Gas) -> Self {
        Self { limit, consumed: 0 }
    }
}

impl GasMeter for BasicGasMeter {
    fn gas_consumed(&self) -> Gas {
        self.consumed
    }

    fn gas_consumed_to_limit(&self) -> Gas {
        self.consumed.min(self.limit)
    }

    fn gas_remaining(&self) -> Gas {
        self.limit.saturating_sub(self.consumed)
    }

    fn limit(&self) -> Gas {
        self.limit
    }

    fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> FeeResult {
        let consumed = self.consumed.checked_add(amount);
        self.consumed = consumed.unwrap_or(Gas::MAX);
        ok_or_gas_error!(consumed.is_some(), GasOverflow, descriptor)?;
        ok_or_gas_error!(self.consumed <= self.limit, GasExhausted, descriptor)
    }

    fn is_past_limit(&self) -> bool {
        self.consumed > self.limit
    }

    fn is_out_of_gas(&self) -> bool {
        self.consumed >= self.limit
    }
}

impl fmt::Display for BasicGasMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BasicGasMeter:\n  limit: {}\n  consumed: {}",
            self.limit, self.consumed
        )
    }
}

/// Used for simulation and genesis, where nothing limits consumption.
#[derive(Clone, Debug, Default)]
pub struct InfiniteGasMeter {
    consumed: Gas,
}

impl InfiniteGasMeter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GasMeter for InfiniteGasMeter {
    fn gas_consumed(&self) -> Gas {
        self.consumed
    }

    fn gas_consumed_to_limit(&self) -> Gas {
        self.consumed
    }

    fn gas_remaining(&self) -> Gas {
        Gas::MAX
    }

    fn limit(&self) -> Gas {
        Gas::MAX
    }

    fn consume_gas(&mut self, amount: Gas, descriptor: &str) -> FeeResult {
        let consumed = self.consumed.checked_add(amount);
        self.consumed = consumed.unwrap_or(Gas::MAX);
        ok_or_gas_error!(consumed.is_some(), GasOverflow, descriptor)
    }

    fn is_past_limit(&self) -> bool {
        false
    }

    fn is_out_of_gas(&self) -> bool {
        false
    }
}

impl fmt::Display for InfiniteGasMeter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InfiniteGasMeter:\n  consumed: {}", self.consumed)
    }
}

#[cfg(test)]
#[path = "unit_tests/gas_tests.rs"]
mod gas_tests;
