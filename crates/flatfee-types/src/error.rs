// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::gas::Gas;
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

#[macro_export]
macro_rules! fee_bail {
    ($e:expr) => {
        return Err($e)
    };
}

#[macro_export(local_inner_macros)]
macro_rules! fee_ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            fee_bail!($e);
        }
    };
}

/// Custom error type for the fee pipeline.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FeeError {
    #[error("tx parse error: {error}")]
    TxDecode { error: String },
    #[error("{error}")]
    InvalidGasLimit { error: String },

    // Raised by a gas meter when the limit is crossed. The setup stage
    // turns this into `OutOfGas`.
    #[error("out of gas in location: {descriptor}")]
    GasExhausted { descriptor: String },
    #[error("gas overflow in location: {descriptor}")]
    GasOverflow { descriptor: String },
    #[error("out of gas in location: {descriptor}; gasWanted: {gas_wanted}, gasUsed: {gas_used}")]
    OutOfGas {
        descriptor: String,
        gas_wanted: Gas,
        gas_used: Gas,
    },

    #[error("insufficient fee: {error}")]
    InsufficientFee { error: String },
    #[error("insufficient funds: {error}")]
    InsufficientFunds { error: String },
    #[error("unknown address: {error}")]
    UnknownAddress { error: String },
    #[error("invalid request: {error}")]
    InvalidRequest { error: String },
    #[error("invalid coins: {error}")]
    InvalidCoin { error: String },

    #[error("fee grants are not enabled")]
    FeeGrantsDisabled,
    #[error("failed to use fee grant: granter: {granter}, grantee: {grantee}, fee: {fee:?}, msgs: {msgs:?}: {error}")]
    FeeGrant {
        granter: String,
        grantee: String,
        fee: String,
        msgs: Vec<String>,
        error: String,
    },

    #[error("could not calculate msg costs: {error}")]
    CostCalculation { error: String },
    #[error("old gas-prices value detected; always use 1{fee_denom}")]
    LegacyGasPrice { fee_denom: String },

    #[error("unrecognized message type: {type_url}")]
    UnknownMsgRoute { type_url: String },
    #[error("message type {type_url} is not allowed by the circuit breaker")]
    CircuitBreakerTripped { type_url: String },
    #[error("failed to execute message; message type: {type_url}: {error}")]
    MsgExecution { type_url: String, error: String },

    #[error("{context}: {source}")]
    Wrapped {
        context: String,
        source: Box<FeeError>,
    },

    // Invariant violations inside the pipeline itself.
    #[error("internal logic error: {error}")]
    Logic { error: String },
}

pub type FeeResult<T = ()> = Result<T, FeeError>;

impl FeeError {
    pub fn wrap(self, context: impl Into<String>) -> Self {
        FeeError::Wrapped {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strips any `Wrapped` layers.
    pub fn root_cause(&self) -> &FeeError {
        match self {
            FeeError::Wrapped { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Short name of the root cause, for metric labels.
    pub fn kind(&self) -> &'static str {
        self.root_cause().into()
    }

    pub fn is_insufficient_fee(&self) -> bool {
        matches!(self.root_cause(), FeeError::InsufficientFee { .. })
    }

    pub fn is_out_of_gas(&self) -> bool {
        matches!(
            self.root_cause(),
            FeeError::OutOfGas { .. } | FeeError::GasExhausted { .. }
        )
    }
}

/// Extension for attaching context to a `FeeResult`, in the spirit of `anyhow::Context`.
pub trait FeeResultExt<T> {
    fn wrap_err(self, context: impl Into<String>) -> FeeResult<T>;

    fn wrap_err_with<F, C>(self, f: F) -> FeeResult<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> FeeResultExt<T> for FeeResult<T> {
    fn wrap_err(self, context: impl Into<String>) -> FeeResult<T> {
        self.map_err(|e| e.wrap(context))
    }

    fn wrap_err_with<F, C>(self, f: F) -> FeeResult<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| e.wrap(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_errors_keep_root_cause() {
        let err = FeeError::InsufficientFunds {
            error: "0stake < 5stake".to_string(),
        }
        .wrap("could not collect fee");
        assert_eq!(
            err.to_string(),
            "could not collect fee: insufficient funds: 0stake < 5stake"
        );
        assert!(matches!(err.root_cause(), FeeError::InsufficientFunds { .. }));
        assert_eq!(err.kind(), "insufficient_funds");
        assert!(!err.is_insufficient_fee());

        let res: FeeResult = Err(FeeError::FeeGrantsDisabled);
        let err = res.wrap_err_with(|| "outer").unwrap_err();
        assert_eq!(err.kind(), "fee_grants_disabled");
    }
}
