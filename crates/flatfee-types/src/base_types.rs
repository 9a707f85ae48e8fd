// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccAddress(String);

impl AccAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Address of the protocol-owned account for a module.
    pub fn for_module(name: &str) -> Self {
        Self(format!("module/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccAddress {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What the account keeper returns for an existing account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseAccount {
    pub address: AccAddress,
    pub account_number: u64,
    pub sequence: u64,
}
