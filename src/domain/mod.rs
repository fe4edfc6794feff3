// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Domain Value Objects
//!
//! Plain values shared by events, write models and commands. Nothing in
//! here performs I/O.

use serde::{Deserialize, Serialize};

pub mod language;

pub use language::{Language, LanguageError};

/// Lifecycle state of an object folded from events
///
/// `Inactive` is only reachable for organizations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectState {
    #[default]
    Unspecified,
    Active,
    Inactive,
    Removed,
}

impl ObjectState {
    pub fn is_active(&self) -> bool {
        matches!(self, ObjectState::Active)
    }

    /// Exists and was not removed
    pub fn exists(&self) -> bool {
        matches!(self, ObjectState::Active | ObjectState::Inactive)
    }
}

/// Purpose a secret generator config is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretGeneratorType {
    InitCode,
    VerifyEmailCode,
    VerifyPhoneCode,
    PasswordResetCode,
    PasswordlessInitCode,
    AppSecret,
    VerifyDomain,
    OtpSms,
    OtpEmail,
    InviteCode,
    SigningKey,
}

impl SecretGeneratorType {
    pub const ALL: [SecretGeneratorType; 11] = [
        SecretGeneratorType::InitCode,
        SecretGeneratorType::VerifyEmailCode,
        SecretGeneratorType::VerifyPhoneCode,
        SecretGeneratorType::PasswordResetCode,
        SecretGeneratorType::PasswordlessInitCode,
        SecretGeneratorType::AppSecret,
        SecretGeneratorType::VerifyDomain,
        SecretGeneratorType::OtpSms,
        SecretGeneratorType::OtpEmail,
        SecretGeneratorType::InviteCode,
        SecretGeneratorType::SigningKey,
    ];
}

/// One-time per-instance achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    InstanceCreated,
    AuthenticationSucceededOnInstance,
    ProjectCreated,
    ApplicationCreated,
    AuthenticationSucceededOnApplication,
    InstanceDeleted,
}

/// Message templates that support custom texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTemplate {
    InitCode,
    PasswordReset,
    VerifyEmail,
    VerifyPhone,
    VerifyEmailOtp,
    VerifySmsOtp,
    DomainClaimed,
    PasswordlessRegistration,
    PasswordChange,
    InviteUser,
}

/// Text fields of a message template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTextKey {
    Title,
    PreHeader,
    Subject,
    Greeting,
    Text,
    ButtonText,
    FooterText,
}

impl MessageTextKey {
    pub const ALL: [MessageTextKey; 7] = [
        MessageTextKey::Title,
        MessageTextKey::PreHeader,
        MessageTextKey::Subject,
        MessageTextKey::Greeting,
        MessageTextKey::Text,
        MessageTextKey::ButtonText,
        MessageTextKey::FooterText,
    ];
}

/// Custom texts of one template in one language
///
/// An empty field means "use the built-in default".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageText {
    pub title: String,
    pub pre_header: String,
    pub subject: String,
    pub greeting: String,
    pub text: String,
    pub button_text: String,
    pub footer_text: String,
}

impl MessageText {
    pub fn get(&self, key: MessageTextKey) -> &str {
        match key {
            MessageTextKey::Title => &self.title,
            MessageTextKey::PreHeader => &self.pre_header,
            MessageTextKey::Subject => &self.subject,
            MessageTextKey::Greeting => &self.greeting,
            MessageTextKey::Text => &self.text,
            MessageTextKey::ButtonText => &self.button_text,
            MessageTextKey::FooterText => &self.footer_text,
        }
    }

    pub fn set(&mut self, key: MessageTextKey, value: impl Into<String>) {
        let value = value.into();
        match key {
            MessageTextKey::Title => self.title = value,
            MessageTextKey::PreHeader => self.pre_header = value,
            MessageTextKey::Subject => self.subject = value,
            MessageTextKey::Greeting => self.greeting = value,
            MessageTextKey::Text => self.text = value,
            MessageTextKey::ButtonText => self.button_text = value,
            MessageTextKey::FooterText => self.footer_text = value,
        }
    }

    pub fn is_empty(&self) -> bool {
        MessageTextKey::ALL.iter().all(|key| self.get(*key).is_empty())
    }
}

/// Lockout thresholds
///
/// A threshold of zero disables lockout for that factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockoutPolicy {
    pub max_password_attempts: u64,
    pub max_otp_attempts: u64,
    pub show_lockout_failures: bool,
}

/// How an API application authenticates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiAuthMethod {
    /// Client id and hashed client secret
    #[default]
    Basic,
    PrivateKeyJwt,
}

/// Trim and reject blank names
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
