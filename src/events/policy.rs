// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lockout policy payloads, shared by the instance default and org policies

use serde::{Deserialize, Serialize};

use crate::domain::LockoutPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockoutPolicyEvent {
    Added(LockoutPolicyAdded),
    Changed(LockoutPolicyChanged),
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockoutPolicyAdded {
    pub max_password_attempts: u64,
    pub max_otp_attempts: u64,
    pub show_lockout_failures: bool,
}

impl From<LockoutPolicy> for LockoutPolicyAdded {
    fn from(policy: LockoutPolicy) -> Self {
        Self {
            max_password_attempts: policy.max_password_attempts,
            max_otp_attempts: policy.max_otp_attempts,
            show_lockout_failures: policy.show_lockout_failures,
        }
    }
}

/// Only fields that changed are set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockoutPolicyChanged {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_password_attempts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_otp_attempts: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_lockout_failures: Option<bool>,
}

impl LockoutPolicyChanged {
    /// Diff `current` against `desired`, `None` when nothing changes
    pub fn diff(current: &LockoutPolicy, desired: &LockoutPolicy) -> Option<Self> {
        let changed = Self {
            max_password_attempts: (current.max_password_attempts
                != desired.max_password_attempts)
                .then_some(desired.max_password_attempts),
            max_otp_attempts: (current.max_otp_attempts != desired.max_otp_attempts)
                .then_some(desired.max_otp_attempts),
            show_lockout_failures: (current.show_lockout_failures
                != desired.show_lockout_failures)
                .then_some(desired.show_lockout_failures),
        };
        (changed != Self::default()).then_some(changed)
    }
}
