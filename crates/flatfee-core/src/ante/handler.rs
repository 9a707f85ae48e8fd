// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{
    AnteDecorator, AnteHandler, DeductFeeDecorator, FlatFeeSetupDecorator,
    MinGasPricesDecorator, PostDecorator, PostHandler, SetUpContextDecorator,
};
use crate::keepers::{AccountKeeper, BankKeeper, FeeCostCalculator, FeegrantKeeper};
use crate::settlement::FlatFeePostHandler;
use anyhow::Result;
use flatfee_config::FeePipelineConfig;
use std::sync::Arc;
use tracing::info;

/// Everything needed to build the admission and settlement chains.
pub struct HandlerOptions {
    pub config: Arc<FeePipelineConfig>,
    pub account_keeper: Arc<dyn AccountKeeper>,
    pub bank_keeper: Arc<dyn BankKeeper>,
    pub feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
    pub calculator: Arc<dyn FeeCostCalculator>,
    /// Stages run after the fee has been taken (signature checks, sequence increments, ...).
    pub extra_ante_decorators: Vec<Box<dyn AnteDecorator>>,
    /// Stages run after settlement.
    pub extra_post_decorators: Vec<Box<dyn PostDecorator>>,
}

impl HandlerOptions {
    pub fn new(
        config: Arc<FeePipelineConfig>,
        account_keeper: Arc<dyn AccountKeeper>,
        bank_keeper: Arc<dyn BankKeeper>,
        calculator: Arc<dyn FeeCostCalculator>,
    ) -> Self {
        Self {
            config,
            account_keeper,
            bank_keeper,
            feegrant_keeper: None,
            calculator,
            extra_ante_decorators: vec![],
            extra_post_decorators: vec![],
        }
    }

    pub fn with_feegrant_keeper(mut self, feegrant_keeper: Arc<dyn FeegrantKeeper>) -> Self {
        self.feegrant_keeper = Some(feegrant_keeper);
        self
    }

    pub fn with_ante_decorator(mut self, decorator: impl AnteDecorator + 'static) -> Self {
        self.extra_ante_decorators.push(Box::new(decorator));
        self
    }

    pub fn with_post_decorator(mut self, decorator: impl PostDecorator + 'static) -> Self {
        self.extra_post_decorators.push(Box::new(decorator));
        self
    }

    /// The grant keeper, unless grants are switched off.
    fn effective_feegrant_keeper(&self) -> Option<Arc<dyn FeegrantKeeper>> {
        if self.config.fee_grants_enabled {
            self.feegrant_keeper.clone()
        } else {
            None
        }
    }
}

/// Builds the ante and post chains. The ante order is part of consensus: setup first, then
/// the node-local price check, cost computation and fee collection. Bank and grant writes
/// made during admission are dropped if any ante stage fails.
pub fn new_handlers(options: HandlerOptions) -> Result<(AnteHandler, PostHandler)> {
    options.config.validate()?;
    let feegrant_keeper = options.effective_feegrant_keeper();

    let mut ante: Vec<Box<dyn AnteDecorator>> = vec![
        Box::new(SetUpContextDecorator::new(
            options.config.clone(),
            options.calculator.clone(),
        )),
        Box::new(MinGasPricesDecorator::new()),
        Box::new(FlatFeeSetupDecorator::new(options.config.clone())),
        Box::new(DeductFeeDecorator::new(
            options.config.clone(),
            options.account_keeper.clone(),
            options.bank_keeper.clone(),
            feegrant_keeper.clone(),
        )),
    ];
    ante.extend(options.extra_ante_decorators);

    let mut ante = AnteHandler::chain(ante).with_store(options.bank_keeper.clone());
    if let Some(keeper) = &feegrant_keeper {
        ante = ante.with_store(keeper.clone());
    }

    let mut post: Vec<Box<dyn PostDecorator>> = vec![Box::new(FlatFeePostHandler::new(
        options.config.clone(),
        options.bank_keeper.clone(),
        feegrant_keeper,
    ))];
    post.extend(options.extra_post_decorators);

    info!(
        ante_stages = ante.len(),
        post_stages = post.len(),
        fee_grants_enabled = options.config.fee_grants_enabled,
        "Fee pipeline handlers built"
    );
    Ok((ante, PostHandler::chain(post)))
}
