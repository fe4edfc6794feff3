// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cache that never stores anything

use std::marker::PhantomData;

use async_trait::async_trait;

use super::{Cache, CacheEntry};

pub struct NoopCache<V> {
    _value: PhantomData<fn() -> V>,
}

impl<V> NoopCache<V> {
    pub fn new() -> Self {
        Self {
            _value: PhantomData,
        }
    }
}

impl<V> Default for NoopCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for NoopCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NoopCache")
    }
}

#[async_trait]
impl<V: CacheEntry> Cache<V> for NoopCache<V> {
    async fn get(&self, _index: V::Index, _key: &str) -> Option<V> {
        None
    }

    async fn set(&self, _value: V) {}

    async fn invalidate(&self, _index: V::Index, _keys: &[String]) {}

    async fn delete(&self, _index: V::Index, _keys: &[String]) {}

    async fn truncate(&self) {}
}
