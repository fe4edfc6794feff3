// Copyright (c) 2025 - Cowboy AI, Inc.
//! Id generation for new aggregates and sub-entities

use std::collections::VecDeque;
use std::sync::Mutex;

use uuid::Uuid;

use crate::errors::{CommandError, CommandResult};

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> CommandResult<String>;
}

/// Time ordered UUID v7 ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> CommandResult<String> {
        Ok(Uuid::now_v7().to_string())
    }
}

/// Hands out a scripted sequence of ids, fails once exhausted
#[derive(Debug, Default)]
pub struct FixedIdGenerator {
    ids: Mutex<VecDeque<String>>,
}

impl FixedIdGenerator {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl IdGenerator for FixedIdGenerator {
    fn next_id(&self) -> CommandResult<String> {
        self.ids
            .lock()
            .map_err(|_| CommandError::IdGeneration("id queue poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| CommandError::IdGeneration("no more scripted ids".to_string()))
    }
}
