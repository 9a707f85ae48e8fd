// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod base_types;
pub mod coin;
pub mod dec_coin;
pub mod error;
pub mod event;
pub mod gas;
pub mod messages;

pub const FEE_COLLECTOR_NAME: &str = "fee_collector";
