// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

pub const EVENT_TYPE_TX: &str = "tx";

pub const ATTRIBUTE_KEY_FEE: &str = "fee";
pub const ATTRIBUTE_KEY_FEE_PAYER: &str = "fee_payer";
pub const ATTRIBUTE_KEY_MIN_FEE_CHARGED: &str = "min_fee_charged";
pub const ATTRIBUTE_KEY_BASE_FEE: &str = "basefee";
pub const ATTRIBUTE_KEY_ADDITIONAL_FEE: &str = "additionalfee";
pub const ATTRIBUTE_KEY_FEE_OVERAGE: &str = "fee_overage";
pub const ATTRIBUTE_KEY_FEE_TOTAL: &str = "total";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub ty: String,
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(ty: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            attributes: vec![],
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.attributes.push(EventAttribute {
            key: key.into(),
            value: value.to_string(),
        });
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

#[derive(Clone, Debug, Default)]
pub struct EventManager {
    events: Vec<Event>,
}

impl EventManager {
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
