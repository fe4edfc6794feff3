// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-process cache backed by moka
//!
//! Entries expire after the configured time to live and the cache is
//! bounded by its maximum capacity.

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache as Moka;
use tracing::debug;

use super::{Cache, CacheEntry, CacheIndex};
use crate::config::CacheConfig;

pub struct MokaCache<V: CacheEntry> {
    entries: Moka<(V::Index, String), Arc<V>>,
}

impl<V: CacheEntry> MokaCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Moka::builder()
            .time_to_live(config.time_to_live)
            .max_capacity(config.max_capacity)
            .build();
        Self { entries }
    }

    async fn remove_value(&self, value: &V) {
        for index in V::Index::all() {
            for key in value.keys(*index) {
                self.entries.invalidate(&(*index, key)).await;
            }
        }
    }
}

impl<V: CacheEntry> std::fmt::Debug for MokaCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

#[async_trait]
impl<V: CacheEntry> Cache<V> for MokaCache<V> {
    async fn get(&self, index: V::Index, key: &str) -> Option<V> {
        let value = self.entries.get(&(index, key.to_string())).await;
        debug!(?index, key, hit = value.is_some(), "cache lookup");
        value.map(|value| value.as_ref().clone())
    }

    async fn set(&self, value: V) {
        let value = Arc::new(value);
        for index in V::Index::all() {
            for key in value.keys(*index) {
                self.entries.insert((*index, key), Arc::clone(&value)).await;
            }
        }
    }

    async fn invalidate(&self, index: V::Index, keys: &[String]) {
        for key in keys {
            if let Some(value) = self.entries.get(&(index, key.clone())).await {
                self.remove_value(&value).await;
            }
        }
    }

    async fn delete(&self, index: V::Index, keys: &[String]) {
        for key in keys {
            self.entries.invalidate(&(index, key.clone())).await;
        }
    }

    async fn truncate(&self) {
        self.entries.invalidate_all();
    }
}
