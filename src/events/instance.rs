// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance Aggregate Events
//!
//! The instance is the top-level tenant. `instance.removed` is the ancestor
//! removal every instance scoped model must react to.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{CustomTextEvent, LockoutPolicyEvent, MemberEvent};
use crate::crypto::GeneratorConfig;
use crate::domain::SecretGeneratorType;

pub const ADDED: &str = "instance.added";
pub const REMOVED: &str = "instance.removed";
pub const SECRET_GENERATOR_ADDED: &str = "instance.secret.generator.added";
pub const SECRET_GENERATOR_CHANGED: &str = "instance.secret.generator.changed";
pub const SECRET_GENERATOR_REMOVED: &str = "instance.secret.generator.removed";
pub const LOCKOUT_POLICY_ADDED: &str = "instance.policy.lockout.added";
pub const LOCKOUT_POLICY_CHANGED: &str = "instance.policy.lockout.changed";
pub const LOCKOUT_POLICY_REMOVED: &str = "instance.policy.lockout.removed";
pub const MEMBER_ADDED: &str = "instance.member.added";
pub const MEMBER_CHANGED: &str = "instance.member.changed";
pub const MEMBER_REMOVED: &str = "instance.member.removed";
pub const MEMBER_CASCADE_REMOVED: &str = "instance.member.cascade.removed";
pub const CUSTOM_TEXT_SET: &str = "instance.customtext.set";
pub const CUSTOM_TEXT_REMOVED: &str = "instance.customtext.removed";
pub const CUSTOM_TEXT_TEMPLATE_REMOVED: &str = "instance.customtext.template.removed";

pub const UNIQUE_INSTANCE_NAME_TYPE: &str = "instance_name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceEvent {
    Added(InstanceAdded),
    Removed(InstanceRemoved),
    SecretGeneratorAdded(SecretGeneratorAdded),
    SecretGeneratorChanged(SecretGeneratorChanged),
    SecretGeneratorRemoved(SecretGeneratorRemoved),
    LockoutPolicy(LockoutPolicyEvent),
    Member(MemberEvent),
    CustomText(CustomTextEvent),
}

impl InstanceEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            InstanceEvent::Added(_) => ADDED,
            InstanceEvent::Removed(_) => REMOVED,
            InstanceEvent::SecretGeneratorAdded(_) => SECRET_GENERATOR_ADDED,
            InstanceEvent::SecretGeneratorChanged(_) => SECRET_GENERATOR_CHANGED,
            InstanceEvent::SecretGeneratorRemoved(_) => SECRET_GENERATOR_REMOVED,
            InstanceEvent::LockoutPolicy(e) => match e {
                LockoutPolicyEvent::Added(_) => LOCKOUT_POLICY_ADDED,
                LockoutPolicyEvent::Changed(_) => LOCKOUT_POLICY_CHANGED,
                LockoutPolicyEvent::Removed => LOCKOUT_POLICY_REMOVED,
            },
            InstanceEvent::Member(e) => match e {
                MemberEvent::Added(_) => MEMBER_ADDED,
                MemberEvent::Changed(_) => MEMBER_CHANGED,
                MemberEvent::Removed(_) => MEMBER_REMOVED,
                MemberEvent::CascadeRemoved(_) => MEMBER_CASCADE_REMOVED,
            },
            InstanceEvent::CustomText(e) => match e {
                CustomTextEvent::Set(_) => CUSTOM_TEXT_SET,
                CustomTextEvent::Removed(_) => CUSTOM_TEXT_REMOVED,
                CustomTextEvent::TemplateRemoved(_) => CUSTOM_TEXT_TEMPLATE_REMOVED,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceAdded {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRemoved {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGeneratorAdded {
    pub generator_type: SecretGeneratorType,
    pub config: GeneratorConfig,
}

/// Only fields that changed are set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGeneratorChanged {
    pub generator_type: SecretGeneratorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_lower_letters: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_upper_letters: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_digits: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_symbols: Option<bool>,
}

impl SecretGeneratorChanged {
    /// Diff `current` against `desired`, `None` when nothing changes
    pub fn diff(
        generator_type: SecretGeneratorType,
        current: &GeneratorConfig,
        desired: &GeneratorConfig,
    ) -> Option<Self> {
        fn changed<T: PartialEq + Clone>(current: &T, desired: &T) -> Option<T> {
            (current != desired).then(|| desired.clone())
        }

        let event = Self {
            generator_type,
            length: changed(&current.length, &desired.length),
            expiry: changed(&current.expiry, &desired.expiry),
            include_lower_letters: changed(
                &current.include_lower_letters,
                &desired.include_lower_letters,
            ),
            include_upper_letters: changed(
                &current.include_upper_letters,
                &desired.include_upper_letters,
            ),
            include_digits: changed(&current.include_digits, &desired.include_digits),
            include_symbols: changed(&current.include_symbols, &desired.include_symbols),
        };

        let unchanged = event.length.is_none()
            && event.expiry.is_none()
            && event.include_lower_letters.is_none()
            && event.include_upper_letters.is_none()
            && event.include_digits.is_none()
            && event.include_symbols.is_none();
        (!unchanged).then_some(event)
    }

    /// Apply the changed fields onto `config`
    pub fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(length) = self.length {
            config.length = length;
        }
        if let Some(expiry) = self.expiry {
            config.expiry = expiry;
        }
        if let Some(v) = self.include_lower_letters {
            config.include_lower_letters = v;
        }
        if let Some(v) = self.include_upper_letters {
            config.include_upper_letters = v;
        }
        if let Some(v) = self.include_digits {
            config.include_digits = v;
        }
        if let Some(v) = self.include_symbols {
            config.include_symbols = v;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretGeneratorRemoved {
    pub generator_type: SecretGeneratorType,
}
