// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Admission and settlement stages.
//!
//! Each stage receives the context, the tx and the remainder of the chain. A stage that
//! returns an error stops the chain; one that calls `next.run` hands control to the next
//! stage and may inspect the result on the way back. The order of stages is a consensus
//! rule.

use crate::context::ExecContext;
use crate::keepers::BranchedStore;
use flatfee_types::error::FeeResult;
use flatfee_types::messages::Tx;

mod deduct_fee;
mod handler;
mod min_gas_prices;
mod setup;
pub mod utils;

pub use deduct_fee::DeductFeeDecorator;
pub use handler::{new_handlers, HandlerOptions};
pub use min_gas_prices::MinGasPricesDecorator;
pub use setup::{convert_out_of_gas, FlatFeeSetupDecorator, SetUpContextDecorator};

pub trait AnteDecorator: Send + Sync {
    fn ante_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        next: AnteNext<'_>,
    ) -> FeeResult;
}

/// The stages after the current one.
pub struct AnteNext<'a> {
    rest: &'a [Box<dyn AnteDecorator>],
}

impl AnteNext<'_> {
    pub fn run(self, ctx: &mut ExecContext, tx: &dyn Tx, simulate: bool) -> FeeResult {
        match self.rest.split_first() {
            Some((decorator, rest)) => {
                decorator.ante_handle(ctx, tx, simulate, AnteNext { rest })
            }
            None => Ok(()),
        }
    }
}

/// Runs the admission stages. Writes they make to the registered stores are kept only
/// when every stage succeeds.
#[derive(Default)]
pub struct AnteHandler {
    decorators: Vec<Box<dyn AnteDecorator>>,
    stores: Vec<Box<dyn BranchedStore>>,
}

impl AnteHandler {
    pub fn chain(decorators: Vec<Box<dyn AnteDecorator>>) -> Self {
        Self {
            decorators,
            stores: vec![],
        }
    }

    pub fn with_store(mut self, store: impl BranchedStore + 'static) -> Self {
        self.stores.push(Box::new(store));
        self
    }

    pub fn handle(&self, ctx: &mut ExecContext, tx: &dyn Tx, simulate: bool) -> FeeResult {
        for store in &self.stores {
            store.branch();
        }
        let result = AnteNext {
            rest: &self.decorators,
        }
        .run(ctx, tx, simulate);
        for store in self.stores.iter().rev() {
            if result.is_ok() {
                store.commit();
            } else {
                store.discard();
            }
        }
        result
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

/// Like `AnteDecorator`, but runs after the messages, with their outcome.
pub trait PostDecorator: Send + Sync {
    fn post_handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        success: bool,
        next: PostNext<'_>,
    ) -> FeeResult;
}

pub struct PostNext<'a> {
    rest: &'a [Box<dyn PostDecorator>],
}

impl PostNext<'_> {
    pub fn run(
        self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        success: bool,
    ) -> FeeResult {
        match self.rest.split_first() {
            Some((decorator, rest)) => {
                decorator.post_handle(ctx, tx, simulate, success, PostNext { rest })
            }
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct PostHandler {
    decorators: Vec<Box<dyn PostDecorator>>,
}

impl PostHandler {
    pub fn chain(decorators: Vec<Box<dyn PostDecorator>>) -> Self {
        Self { decorators }
    }

    pub fn handle(
        &self,
        ctx: &mut ExecContext,
        tx: &dyn Tx,
        simulate: bool,
        success: bool,
    ) -> FeeResult {
        PostNext {
            rest: &self.decorators,
        }
        .run(ctx, tx, simulate, success)
    }
}

#[cfg(test)]
#[path = "../unit_tests/ante_chain_tests.rs"]
mod ante_chain_tests;
