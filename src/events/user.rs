// Copyright (c) 2025 - Cowboy AI, Inc.
//! User Aggregate Events

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::UniqueConstraint;
use crate::crypto::CryptoValue;

pub const HUMAN_ADDED: &str = "user.human.added";
pub const EMAIL_CHANGED: &str = "user.human.email.changed";
pub const EMAIL_CODE_ADDED: &str = "user.human.email.code.added";
pub const EMAIL_VERIFIED: &str = "user.human.email.verified";
pub const EMAIL_VERIFICATION_FAILED: &str = "user.human.email.verification.failed";
pub const REMOVED: &str = "user.removed";

pub const UNIQUE_USERNAME_TYPE: &str = "username";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserEvent {
    HumanAdded(HumanAdded),
    EmailChanged(EmailChanged),
    EmailCodeAdded(EmailCodeAdded),
    EmailVerified,
    EmailVerificationFailed,
    Removed(UserRemoved),
}

impl UserEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            UserEvent::HumanAdded(_) => HUMAN_ADDED,
            UserEvent::EmailChanged(_) => EMAIL_CHANGED,
            UserEvent::EmailCodeAdded(_) => EMAIL_CODE_ADDED,
            UserEvent::EmailVerified => EMAIL_VERIFIED,
            UserEvent::EmailVerificationFailed => EMAIL_VERIFICATION_FAILED,
            UserEvent::Removed(_) => REMOVED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanAdded {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChanged {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailCodeAdded {
    pub code: CryptoValue,
    pub expiry: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRemoved {
    pub username: String,
}

fn username_field(org_id: &str, username: &str) -> String {
    format!("{org_id}:{}", username.to_lowercase())
}

pub fn add_username_unique_constraint(org_id: &str, username: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_USERNAME_TYPE,
        username_field(org_id, username),
        "username already taken",
    )
}

pub fn remove_username_unique_constraint(org_id: &str, username: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_USERNAME_TYPE, username_field(org_id, username))
}
