// Copyright (c) 2025 - Cowboy AI, Inc.
//! Typed Cache Connector
//!
//! Read-through/write-through cache for derived values that are expensive
//! to replay and rarely change. A cached value is never the system of
//! record: it can always be rebuilt from the event log, so a
//! [`NoopCache`] yields the same results at a higher latency.
//!
//! # Indices
//!
//! A value can be found under several indices. Each index maps the value to
//! one or more keys:
//!
//! ```text
//! value ──keys(InstanceId)──→ ["instance1"]
//!       ──keys(Domain)──────→ ["acme.com", "acme.io"]
//! ```
//!
//! - `invalidate(index, keys)` drops the whole value under every index
//! - `delete(index, keys)` drops only the given keys of one index

use std::fmt::Debug;
use std::hash::Hash;

use async_trait::async_trait;

pub mod memory;
pub mod noop;

pub use memory::MokaCache;
pub use noop::NoopCache;

/// Index a cached value can be looked up by
pub trait CacheIndex: Debug + Copy + Eq + Hash + Send + Sync + 'static {
    /// Every index values are stored under
    fn all() -> &'static [Self];
}

/// A value that knows its keys
pub trait CacheEntry: Clone + Send + Sync + 'static {
    type Index: CacheIndex;

    fn keys(&self, index: Self::Index) -> Vec<String>;
}

#[async_trait]
pub trait Cache<V: CacheEntry>: Send + Sync {
    async fn get(&self, index: V::Index, key: &str) -> Option<V>;

    /// Store the value under every key of every index
    async fn set(&self, value: V);

    async fn invalidate(&self, index: V::Index, keys: &[String]);

    async fn delete(&self, index: V::Index, keys: &[String]);

    async fn truncate(&self);
}
