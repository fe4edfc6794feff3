// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance Limits Events

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const SET: &str = "limits.set";
pub const RESET: &str = "limits.reset";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LimitsEvent {
    Set(LimitsSet),
    Reset,
}

impl LimitsEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LimitsEvent::Set(_) => SET,
            LimitsEvent::Reset => RESET,
        }
    }
}

/// Only fields that changed are set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LimitsSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log_retention: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<bool>,
}
