// Copyright (c) 2025 - Cowboy AI, Inc.
//! ChaCha20-Poly1305 key ring
//!
//! Ciphertext layout: `nonce (12 bytes) || ciphertext+tag`.

use std::collections::HashMap;
use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::Aead;
use chacha20poly1305::{ChaCha20Poly1305, KeyInit, Nonce};
use rand::RngCore;
use tracing::warn;

use super::EncryptionAlgorithm;
use crate::errors::CryptoError;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Encrypts with one active key and decrypts with any key in the ring
pub struct ChaChaEncryption {
    encryption_key_id: String,
    keys: HashMap<String, [u8; KEY_LEN]>,
}

impl ChaChaEncryption {
    pub const ALGORITHM: &'static str = "chacha20poly1305";

    pub fn new(encryption_key_id: impl Into<String>, key: [u8; KEY_LEN]) -> Self {
        let encryption_key_id = encryption_key_id.into();
        let mut keys = HashMap::new();
        keys.insert(encryption_key_id.clone(), key);
        Self {
            encryption_key_id,
            keys,
        }
    }

    /// Random key, for tests and local setups
    pub fn generate(encryption_key_id: impl Into<String>) -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(encryption_key_id, key)
    }

    /// Build from a base64 encoded 32 byte key
    pub fn from_base64(
        encryption_key_id: impl Into<String>,
        key: &str,
    ) -> Result<Self, CryptoError> {
        let encryption_key_id = encryption_key_id.into();
        let key = decode_key(&encryption_key_id, key)?;
        Ok(Self::new(encryption_key_id, key))
    }

    /// Keep an old key around for decryption after rotation
    pub fn with_decryption_key(mut self, key_id: impl Into<String>, key: [u8; KEY_LEN]) -> Self {
        self.keys.insert(key_id.into(), key);
        self
    }

    fn cipher(&self, key_id: &str) -> Result<ChaCha20Poly1305, CryptoError> {
        let key = self
            .keys
            .get(key_id)
            .ok_or_else(|| CryptoError::UnknownKey(key_id.to_string()))?;
        ChaCha20Poly1305::new_from_slice(key).map_err(|_| CryptoError::InvalidKey(key_id.to_string()))
    }
}

fn decode_key(key_id: &str, encoded: &str) -> Result<[u8; KEY_LEN], CryptoError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|_| CryptoError::InvalidKey(key_id.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidKey(key_id.to_string()))
}

impl fmt::Debug for ChaChaEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut key_ids: Vec<&String> = self.keys.keys().collect();
        key_ids.sort();
        f.debug_struct("ChaChaEncryption")
            .field("encryption_key_id", &self.encryption_key_id)
            .field("key_ids", &key_ids)
            .finish()
    }
}

impl EncryptionAlgorithm for ChaChaEncryption {
    fn algorithm(&self) -> &'static str {
        Self::ALGORITHM
    }

    fn encryption_key_id(&self) -> &str {
        &self.encryption_key_id
    }

    fn decryption_key_ids(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    fn encrypt(&self, plain: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let cipher = self.cipher(&self.encryption_key_id)?;

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), plain)
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, crypted: &[u8], key_id: &str) -> Result<Vec<u8>, CryptoError> {
        if crypted.len() <= NONCE_LEN {
            return Err(CryptoError::Decrypt);
        }
        let cipher = self.cipher(key_id)?;
        let (nonce, ciphertext) = crypted.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                warn!(key_id, "ciphertext failed authentication");
                CryptoError::Decrypt
            })
    }
}
