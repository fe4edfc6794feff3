// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource owner lookup
//!
//! Resolves the owning organization of an aggregate from its most recent
//! event: descending order, limit 1.

use crate::aggregate::AggregateType;
use crate::context::CommandContext;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::{filter_to_query_reducer, Filter};
use crate::events::Event;
use crate::query::SearchQueryBuilder;

use super::QueryReducer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOwnerModel {
    instance_id: String,
    aggregate_type: AggregateType,
    aggregate_id: String,
    pending: Option<Event>,
    pub resource_owner: Option<String>,
}

impl ResourceOwnerModel {
    pub fn new(
        instance_id: impl Into<String>,
        aggregate_type: AggregateType,
        aggregate_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            aggregate_type,
            aggregate_id: aggregate_id.into(),
            pending: None,
            resource_owner: None,
        }
    }
}

impl QueryReducer for ResourceOwnerModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.instance_id)
            .order_desc()
            .limit(1)
            .add_query()
            .aggregate_types([self.aggregate_type])
            .aggregate_ids([self.aggregate_id.as_str()])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        if let Some(event) = events.first() {
            self.pending = Some(event.clone());
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        if let Some(event) = self.pending.take() {
            self.resource_owner = Some(event.resource_owner().to_string());
        }
        Ok(())
    }
}

/// Owner of the aggregate, `NotFound` if it has no events
pub async fn resource_owner_of<F>(
    ctx: &CommandContext,
    filter: &F,
    aggregate_type: AggregateType,
    aggregate_id: &str,
) -> CommandResult<String>
where
    F: Filter + ?Sized,
{
    let mut model = ResourceOwnerModel::new(ctx.instance_id(), aggregate_type, aggregate_id);
    filter_to_query_reducer(ctx, filter, &mut model).await?;
    model
        .resource_owner
        .ok_or_else(|| CommandError::not_found(format!("{aggregate_type} {aggregate_id} not found")))
}
