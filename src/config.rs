// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Service Configuration
//!
//! Defaults are usable as-is. [`CommandsConfig::from_env`] overrides the
//! cache and hasher settings from environment variables:
//!
//! - `IAM_CACHE_MAX_CAPACITY`: maximum number of cached entries
//! - `IAM_CACHE_TTL_SECS`: time to live of cached entries in seconds
//! - `IAM_HASHER_ROUNDS`: iterations of the secret hasher

use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::{GeneratorConfig, Sha256Hasher};
use crate::domain::SecretGeneratorType;
use crate::errors::{CommandError, CommandResult};

pub const ENV_CACHE_MAX_CAPACITY: &str = "IAM_CACHE_MAX_CAPACITY";
pub const ENV_CACHE_TTL_SECS: &str = "IAM_CACHE_TTL_SECS";
pub const ENV_HASHER_ROUNDS: &str = "IAM_HASHER_ROUNDS";

/// Configuration of the [`Commands`](crate::command::Commands) service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub secret_generators: SecretGeneratorDefaults,
    pub cache: CacheConfig,
    pub hasher: HasherConfig,
}

impl CommandsConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> CommandResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`
    pub fn from_vars<F>(lookup: F) -> CommandResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(capacity) = parse_var::<u64, _>(&lookup, ENV_CACHE_MAX_CAPACITY)? {
            config.cache.max_capacity = capacity;
        }
        if let Some(ttl) = parse_var::<u64, _>(&lookup, ENV_CACHE_TTL_SECS)? {
            config.cache.time_to_live = Duration::from_secs(ttl);
        }
        if let Some(rounds) = parse_var::<u32, _>(&lookup, ENV_HASHER_ROUNDS)? {
            if rounds == 0 {
                return Err(CommandError::Configuration(format!(
                    "{ENV_HASHER_ROUNDS} must be positive"
                )));
            }
            config.hasher.rounds = rounds;
        }
        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> CommandResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| CommandError::Configuration(format!("{key}={raw}: {e}")))
        })
        .transpose()
}

/// Milestone cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_capacity: u64,
    pub time_to_live: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            time_to_live: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HasherConfig {
    pub rounds: u32,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            rounds: Sha256Hasher::DEFAULT_ROUNDS,
        }
    }
}

/// Generator configs used when an instance has not set its own
///
/// Purposes without an override use the built-in default.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretGeneratorDefaults {
    overrides: BTreeMap<SecretGeneratorType, GeneratorConfig>,
}

impl SecretGeneratorDefaults {
    pub fn with(mut self, generator_type: SecretGeneratorType, config: GeneratorConfig) -> Self {
        self.overrides.insert(generator_type, config);
        self
    }

    pub fn get(&self, generator_type: SecretGeneratorType) -> GeneratorConfig {
        self.overrides
            .get(&generator_type)
            .cloned()
            .unwrap_or_else(|| built_in(generator_type))
    }
}

fn built_in(generator_type: SecretGeneratorType) -> GeneratorConfig {
    const HOUR: u64 = 60 * 60;

    let (length, expiry_secs, lower, upper, digits) = match generator_type {
        SecretGeneratorType::InitCode | SecretGeneratorType::InviteCode => {
            (6, 72 * HOUR, false, true, true)
        }
        SecretGeneratorType::VerifyEmailCode
        | SecretGeneratorType::VerifyPhoneCode
        | SecretGeneratorType::PasswordResetCode => (6, HOUR, false, true, true),
        SecretGeneratorType::PasswordlessInitCode => (12, HOUR, true, true, true),
        SecretGeneratorType::AppSecret => (64, 0, true, true, true),
        SecretGeneratorType::VerifyDomain => (32, 0, true, true, true),
        SecretGeneratorType::SigningKey => (36, 0, true, true, true),
        SecretGeneratorType::OtpSms | SecretGeneratorType::OtpEmail => (8, 5 * 60, false, false, true),
    };
    GeneratorConfig {
        length,
        expiry: Duration::from_secs(expiry_secs),
        include_lower_letters: lower,
        include_upper_letters: upper,
        include_digits: digits,
        include_symbols: false,
    }
}
