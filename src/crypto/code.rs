// Copyright (c) 2025 - Cowboy AI, Inc.
//! One-time codes and generated secrets
//!
//! # Verification
//!
//! ```text
//! expired = now > created + expiry
//! matches = ct_eq(decrypt(crypted), candidate)
//! valid   = matches & !expired
//! ```
//!
//! Both checks always run; the result is combined with `subtle::Choice`
//! so the time spent does not depend on which check failed.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};
use thiserror::Error;

use super::{decrypt, encrypt, CryptoValue, EncryptionAlgorithm, SecretHasher};
use crate::errors::{CommandError, CryptoError};

const LOWER_LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPER_LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"~!@#$^&*()_+`-={}|[]:<>?,./";

/// Longest expiry a generator config may carry
pub const MAX_EXPIRY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Shape of generated codes and secrets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub length: u32,
    /// Zero means the secret never expires
    pub expiry: Duration,
    pub include_lower_letters: bool,
    pub include_upper_letters: bool,
    pub include_digits: bool,
    pub include_symbols: bool,
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), CryptoError> {
        if self.length == 0 {
            return Err(CryptoError::InvalidGeneratorConfig(
                "length must be positive".to_string(),
            ));
        }
        if self.alphabet().is_empty() {
            return Err(CryptoError::InvalidGeneratorConfig(
                "at least one character class must be enabled".to_string(),
            ));
        }
        if self.expiry > MAX_EXPIRY {
            return Err(CryptoError::InvalidGeneratorConfig(format!(
                "expiry must not exceed {} seconds",
                MAX_EXPIRY.as_secs()
            )));
        }
        Ok(())
    }

    pub fn alphabet(&self) -> Vec<u8> {
        let mut alphabet = Vec::new();
        if self.include_lower_letters {
            alphabet.extend_from_slice(LOWER_LETTERS);
        }
        if self.include_upper_letters {
            alphabet.extend_from_slice(UPPER_LETTERS);
        }
        if self.include_digits {
            alphabet.extend_from_slice(DIGITS);
        }
        if self.include_symbols {
            alphabet.extend_from_slice(SYMBOLS);
        }
        alphabet
    }

    /// Draw a random string from the configured alphabet
    pub fn generate(&self) -> Result<String, CryptoError> {
        self.validate()?;
        let alphabet = self.alphabet();
        let mut rng = rand::thread_rng();
        Ok((0..self.length)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect())
    }
}

/// Freshly generated code; `plain` must be handed out and then dropped
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedCode {
    pub crypted: CryptoValue,
    pub plain: String,
    pub expiry: Duration,
}

impl fmt::Debug for EncryptedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedCode")
            .field("crypted", &self.crypted)
            .field("plain", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

pub fn new_encrypted_code(
    config: &GeneratorConfig,
    alg: &dyn EncryptionAlgorithm,
) -> Result<EncryptedCode, CryptoError> {
    let plain = config.generate()?;
    let crypted = encrypt(plain.as_bytes(), alg)?;
    Ok(EncryptedCode {
        crypted,
        plain,
        expiry: config.expiry,
    })
}

/// Freshly generated long-lived secret with its stored hash
#[derive(Clone, PartialEq, Eq)]
pub struct HashedSecret {
    pub plain: String,
    pub encoded_hash: String,
}

impl fmt::Debug for HashedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedSecret")
            .field("plain", &"<redacted>")
            .field("encoded_hash", &self.encoded_hash)
            .finish()
    }
}

pub fn new_hashed_secret(
    config: &GeneratorConfig,
    hasher: &dyn SecretHasher,
) -> Result<HashedSecret, CryptoError> {
    let plain = config.generate()?;
    let encoded_hash = hasher.hash(&plain)?;
    Ok(HashedSecret { plain, encoded_hash })
}

/// Why a code was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("code expired")]
    Expired,

    #[error("code invalid")]
    Invalid,

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<CodeError> for CommandError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::Expired => CommandError::precondition_failed("code expired"),
            CodeError::Invalid => CommandError::invalid_argument("code invalid"),
            CodeError::Crypto(err) => CommandError::Crypto(err),
        }
    }
}

/// Check a candidate against a stored encrypted code
///
/// A zero `expiry` never expires.
pub fn verify_encrypted_code(
    created_at: DateTime<Utc>,
    expiry: Duration,
    crypted: &CryptoValue,
    candidate: &str,
    alg: &dyn EncryptionAlgorithm,
    now: DateTime<Utc>,
) -> Result<(), CodeError> {
    let plain = decrypt(crypted, alg)?;

    let expired = Choice::from(u8::from(is_expired(created_at, expiry, now)));
    let matches = plain.as_slice().ct_eq(candidate.as_bytes());

    if bool::from(matches & !expired) {
        return Ok(());
    }
    if bool::from(expired) {
        Err(CodeError::Expired)
    } else {
        Err(CodeError::Invalid)
    }
}

/// Strictly past `created_at + expiry`
///
/// Deadlines beyond the representable time range never pass.
fn is_expired(created_at: DateTime<Utc>, expiry: Duration, now: DateTime<Utc>) -> bool {
    if expiry.is_zero() {
        return false;
    }
    chrono::Duration::from_std(expiry)
        .ok()
        .and_then(|expiry| created_at.checked_add_signed(expiry))
        .is_some_and(|deadline| now > deadline)
}
