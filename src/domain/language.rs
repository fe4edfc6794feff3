// Copyright (c) 2025 - Cowboy AI, Inc.
//! Language Tag Value Object

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Language tag validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Language tag is empty")]
    Empty,

    #[error("Invalid primary language subtag: {0}")]
    InvalidPrimary(String),

    #[error("Invalid subtag: {0}")]
    InvalidSubtag(String),
}

/// Simplified BCP 47 language tag
///
/// - Primary subtag: 2 or 3 ASCII letters, stored lowercase
/// - Optional subtags: 2 to 8 ASCII alphanumerics, separated by `-`
///
/// # Examples
///
/// ```rust
/// use cim_iam_command::domain::Language;
///
/// let de = Language::new("de").unwrap();
/// let en_us = Language::new("en-US").unwrap();
/// assert_eq!(de.as_str(), "de");
/// assert_eq!(en_us.as_str(), "en-US");
///
/// assert!(Language::new("").is_err());
/// assert!(Language::new("english").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Language(String);

impl Language {
    pub fn new(tag: impl Into<String>) -> Result<Self, LanguageError> {
        let tag = tag.into();
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(LanguageError::Empty);
        }

        let mut parts = tag.split('-');
        let primary = parts.next().unwrap_or_default();
        if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(LanguageError::InvalidPrimary(primary.to_string()));
        }

        let mut normalized = primary.to_ascii_lowercase();
        for subtag in parts {
            if !(2..=8).contains(&subtag.len()) || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(LanguageError::InvalidSubtag(subtag.to_string()));
            }
            normalized.push('-');
            normalized.push_str(subtag);
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
