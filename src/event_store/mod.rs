// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Log Client
//!
//! The event log is an external collaborator. This module defines the
//! contract the command side consumes and ships an in-memory reference
//! implementation.
//!
//! # Architecture
//!
//! ```text
//! Command → Write Model ──filter──→ EventStore
//!               ↑                      │
//!               └──append + reduce─────┘
//! Command → Commands ───push───→ EventStore → committed events
//! ```
//!
//! # Guarantees
//!
//! 1. **Ordered**: events of one aggregate are totally ordered by sequence
//! 2. **Atomic**: all commands of one push are committed or none
//! 3. **Unique**: declared unique constraints are checked in the same commit
//! 4. **Optimistic**: an expected sequence that moved on fails the push

use async_trait::async_trait;

use crate::context::CommandContext;
use crate::errors::{CommandResult, EventStoreError};
use crate::events::{Command, Event};
use crate::query::SearchQueryBuilder;
use crate::write_model::QueryReducer;

pub mod memory;

pub use memory::InMemoryEventStore;

/// Event log client
///
/// Implementations must honour the cancellation context of every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events matching `query`, ordered by commit position
    async fn filter(
        &self,
        ctx: &CommandContext,
        query: &SearchQueryBuilder,
    ) -> Result<Vec<Event>, EventStoreError>;

    /// Commit all commands atomically and return the committed events
    async fn push(
        &self,
        ctx: &CommandContext,
        commands: Vec<Command>,
    ) -> Result<Vec<Event>, EventStoreError>;
}

/// Read side of the log, the only capability preparations get
#[async_trait]
pub trait Filter: Send + Sync {
    async fn filter(
        &self,
        ctx: &CommandContext,
        query: &SearchQueryBuilder,
    ) -> Result<Vec<Event>, EventStoreError>;
}

#[async_trait]
impl<T: EventStore + ?Sized> Filter for T {
    async fn filter(
        &self,
        ctx: &CommandContext,
        query: &SearchQueryBuilder,
    ) -> Result<Vec<Event>, EventStoreError> {
        ctx.guard(EventStore::filter(self, ctx, query)).await
    }
}

/// Filter + append + reduce in one step
pub async fn filter_to_query_reducer<F, R>(
    ctx: &CommandContext,
    filter: &F,
    reducer: &mut R,
) -> CommandResult<()>
where
    F: Filter + ?Sized,
    R: QueryReducer + ?Sized,
{
    let events = filter.filter(ctx, &reducer.query()).await?;
    reducer.append_events(&events);
    reducer.reduce()
}
