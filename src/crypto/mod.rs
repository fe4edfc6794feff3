// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secrets: Encryption, Hashing and One-Time Codes
//!
//! Two paths exist for secrets handed out by commands:
//!
//! ```text
//! one-time code   ── generate ── encrypt ── CryptoValue in event ── decrypt ── verify
//! client secret   ── generate ── hash    ── encoded hash in event ── verify
//! ```
//!
//! Encrypted values carry their algorithm and key id so keys can be rotated
//! without rewriting history. Plaintexts are returned to the caller exactly
//! once and never stored.

use serde::{Deserialize, Serialize};

use crate::errors::CryptoError;

pub mod code;
pub mod encryption;
pub mod hash;

pub use code::{
    new_encrypted_code, new_hashed_secret, verify_encrypted_code, CodeError, EncryptedCode,
    GeneratorConfig, HashedSecret, MAX_EXPIRY,
};
pub use encryption::ChaChaEncryption;
pub use hash::Sha256Hasher;

/// How a [`CryptoValue`] was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CryptoType {
    Encryption,
    Hash,
}

/// Ciphertext together with the identifiers needed to open it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoValue {
    pub crypto_type: CryptoType,
    pub algorithm: String,
    pub key_id: String,
    pub crypted: Vec<u8>,
}

/// Symmetric encryption provider
pub trait EncryptionAlgorithm: Send + Sync {
    /// Identifier stored next to every ciphertext
    fn algorithm(&self) -> &'static str;

    /// Key used for new ciphertexts
    fn encryption_key_id(&self) -> &str;

    /// Keys that may still open existing ciphertexts
    fn decryption_key_ids(&self) -> Vec<String>;

    fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(&self, crypted: &[u8], key_id: &str) -> Result<Vec<u8>, CryptoError>;
}

/// One-way hasher for long-lived secrets
pub trait SecretHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, CryptoError>;

    /// `Ok(false)` on mismatch, `Err` only for unreadable hashes
    fn verify(&self, encoded_hash: &str, candidate: &str) -> Result<bool, CryptoError>;
}

pub fn encrypt(plain: &[u8], alg: &dyn EncryptionAlgorithm) -> Result<CryptoValue, CryptoError> {
    Ok(CryptoValue {
        crypto_type: CryptoType::Encryption,
        algorithm: alg.algorithm().to_string(),
        key_id: alg.encryption_key_id().to_string(),
        crypted: alg.encrypt(plain)?,
    })
}

pub fn decrypt(value: &CryptoValue, alg: &dyn EncryptionAlgorithm) -> Result<Vec<u8>, CryptoError> {
    if value.crypto_type != CryptoType::Encryption || value.algorithm != alg.algorithm() {
        return Err(CryptoError::UnsupportedAlgorithm(value.algorithm.clone()));
    }
    if !alg.decryption_key_ids().iter().any(|id| id == &value.key_id) {
        return Err(CryptoError::UnknownKey(value.key_id.clone()));
    }
    alg.decrypt(&value.crypted, &value.key_id)
}

pub fn decrypt_string(value: &CryptoValue, alg: &dyn EncryptionAlgorithm) -> Result<String, CryptoError> {
    String::from_utf8(decrypt(value, alg)?).map_err(|_| CryptoError::Decrypt)
}
