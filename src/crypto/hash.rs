// Copyright (c) 2025 - Cowboy AI, Inc.
//! Salted, iterated SHA-256 secret hashing
//!
//! Encoded form: `$sha256i$r=<rounds>$<salt>$<digest>` with unpadded
//! standard base64 for salt and digest.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::SecretHasher;
use crate::errors::CryptoError;

const IDENTIFIER: &str = "sha256i";
const SALT_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sha256Hasher {
    rounds: u32,
}

impl Sha256Hasher {
    pub const DEFAULT_ROUNDS: u32 = 10_000;

    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.max(1),
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ROUNDS)
    }
}

fn digest(salt: &[u8], plain: &[u8], rounds: u32) -> [u8; 32] {
    let mut out: [u8; 32] = Sha256::new()
        .chain_update(salt)
        .chain_update(plain)
        .finalize()
        .into();
    for _ in 1..rounds {
        out = Sha256::new()
            .chain_update(out)
            .chain_update(salt)
            .chain_update(plain)
            .finalize()
            .into();
    }
    out
}

struct Encoded {
    rounds: u32,
    salt: Vec<u8>,
    digest: Vec<u8>,
}

fn parse(encoded: &str) -> Result<Encoded, CryptoError> {
    let malformed = || CryptoError::MalformedHash(encoded.chars().take(12).collect());

    let parts: Vec<&str> = encoded.split('$').collect();
    let [empty, identifier, rounds, salt, digest] = parts.as_slice() else {
        return Err(malformed());
    };
    if !empty.is_empty() || *identifier != IDENTIFIER {
        return Err(malformed());
    }
    let rounds = rounds
        .strip_prefix("r=")
        .and_then(|r| r.parse::<u32>().ok())
        .filter(|r| *r > 0)
        .ok_or_else(malformed)?;

    Ok(Encoded {
        rounds,
        salt: STANDARD_NO_PAD.decode(salt).map_err(|_| malformed())?,
        digest: STANDARD_NO_PAD.decode(digest).map_err(|_| malformed())?,
    })
}

impl SecretHasher for Sha256Hasher {
    fn hash(&self, plain: &str) -> Result<String, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);

        let digest = digest(&salt, plain.as_bytes(), self.rounds);
        Ok(format!(
            "${IDENTIFIER}$r={}${}${}",
            self.rounds,
            STANDARD_NO_PAD.encode(salt),
            STANDARD_NO_PAD.encode(digest)
        ))
    }

    fn verify(&self, encoded_hash: &str, candidate: &str) -> Result<bool, CryptoError> {
        let encoded = parse(encoded_hash)?;
        let computed = digest(&encoded.salt, candidate.as_bytes(), encoded.rounds);
        Ok(bool::from(computed.as_slice().ct_eq(&encoded.digest)))
    }
}
