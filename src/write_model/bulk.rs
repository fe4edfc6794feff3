// Copyright (c) 2025 - Cowboy AI, Inc.
//! Bulk Write Model
//!
//! One broad query spanning many aggregates, each event routed to the
//! sub-model that owns it.
//!
//! ```text
//!                 ┌→ target A: WriteModel ─→ commands A ┐
//! filter(broad) ──┼→ target B: WriteModel ─→ commands B ┼→ one push
//!                 └→ target C: WriteModel ─→ (none)     ┘
//! ```

use std::collections::BTreeMap;

use crate::errors::CommandResult;
use crate::events::Event;
use crate::query::SearchQueryBuilder;

use super::QueryReducer;

/// A write model that can live inside a [`BulkWriteModel`]
pub trait BulkTarget: QueryReducer + Sized {
    /// Fresh model for one target
    fn for_target(target_id: &str) -> Self;

    /// Target an event belongs to
    fn routing_key(event: &Event) -> Option<&str>;
}

#[derive(Debug, Clone)]
pub struct BulkWriteModel<M> {
    query: SearchQueryBuilder,
    models: BTreeMap<String, M>,
}

impl<M: BulkTarget> BulkWriteModel<M> {
    /// Pre-create one model per target; events for unknown targets are dropped
    pub fn new<I, S>(query: SearchQueryBuilder, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models = targets
            .into_iter()
            .map(Into::into)
            .map(|id: String| {
                let model = M::for_target(&id);
                (id, model)
            })
            .collect();
        Self { query, models }
    }

    pub fn get(&self, target_id: &str) -> Option<&M> {
        self.models.get(target_id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Hand out the per-target models in target order
    pub fn into_models(self) -> BTreeMap<String, M> {
        self.models
    }
}

impl<M: BulkTarget> QueryReducer for BulkWriteModel<M> {
    fn query(&self) -> SearchQueryBuilder {
        self.query.clone()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            let Some(key) = M::routing_key(event) else {
                continue;
            };
            if let Some(model) = self.models.get_mut(key) {
                model.append_events(std::slice::from_ref(event));
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        for model in self.models.values_mut() {
            model.reduce()?;
        }
        Ok(())
    }
}
