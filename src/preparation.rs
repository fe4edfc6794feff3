// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Preparation Pipeline
//!
//! Commands that span several aggregates are split into preparations.
//! Each preparation runs in two phases:
//!
//! ```text
//! validate()          no I/O, shape checks only      → InvalidArgument
//! create_commands()   reads state through a Filter   → Vec<Command>
//! ```
//!
//! [`prepare_commands`] runs every validation before the first
//! `create_commands`. Step *n* reads through a [`TransactionFilter`] that
//! sees the committed log plus the commands of steps `1..n-1`:
//!
//! ```text
//! step 1 ──commands──┐
//!                    ↓ pending
//! step 2 ──filter──→ committed ∪ pending ──commands──┐
//!                                                    ↓
//!                                              one push
//! ```

use async_trait::async_trait;
use chrono::Utc;

use crate::context::CommandContext;
use crate::errors::{CommandResult, EventStoreError};
use crate::event_store::Filter;
use crate::events::{Command, Event};
use crate::query::{Order, SearchQueryBuilder};

/// One step of a multi-aggregate command
#[async_trait]
pub trait Preparation: Send + Sync {
    /// Structural checks, must not perform I/O
    fn validate(&mut self) -> CommandResult<()>;

    /// Load state through `filter` and decide the commands to push
    async fn create_commands(
        &self,
        ctx: &CommandContext,
        filter: &dyn Filter,
    ) -> CommandResult<Vec<Command>>;
}

/// Validate all preparations, then collect their commands in order
pub async fn prepare_commands<'a, F>(
    ctx: &CommandContext,
    filter: &F,
    mut preparations: Vec<Box<dyn Preparation + 'a>>,
) -> CommandResult<Vec<Command>>
where
    F: Filter + ?Sized,
{
    for preparation in preparations.iter_mut() {
        preparation.validate()?;
    }

    let mut commands: Vec<Command> = Vec::new();
    for preparation in &preparations {
        let view = TransactionFilter::new(filter, &commands);
        let created = preparation.create_commands(ctx, &view).await?;
        commands.extend(created);
    }
    Ok(commands)
}

/// Committed events plus not yet pushed commands
pub struct TransactionFilter<'a, F: ?Sized> {
    inner: &'a F,
    pending: &'a [Command],
}

impl<'a, F: Filter + ?Sized> TransactionFilter<'a, F> {
    pub fn new(inner: &'a F, pending: &'a [Command]) -> Self {
        Self { inner, pending }
    }

    /// Pending commands as events following the committed ones
    fn pending_events(&self, ctx: &CommandContext, committed: &[Event]) -> Vec<Event> {
        let created_at = Utc::now();
        let mut position = committed.iter().map(|e| e.position).max().unwrap_or(0);
        let mut events: Vec<Event> = Vec::with_capacity(self.pending.len());

        for command in self.pending {
            let sequence = committed
                .iter()
                .chain(events.iter())
                .filter(|e| e.aggregate == command.aggregate)
                .map(|e| e.sequence)
                .max()
                .or(command.expected_sequence)
                .unwrap_or(0)
                + 1;
            position += 1;
            events.push(Event {
                aggregate: command.aggregate.clone(),
                payload: command.payload.clone(),
                creator: ctx.user_id().to_string(),
                created_at,
                sequence,
                position,
            });
        }
        events
    }
}

#[async_trait]
impl<F: Filter + ?Sized> Filter for TransactionFilter<'_, F> {
    async fn filter(
        &self,
        ctx: &CommandContext,
        query: &SearchQueryBuilder,
    ) -> Result<Vec<Event>, EventStoreError> {
        let mut events = self.inner.filter(ctx, query).await?;
        if self.pending.is_empty() {
            return Ok(events);
        }

        if query.order() == Order::Descending {
            events.reverse();
        }
        let pending = self.pending_events(ctx, &events);
        events.extend(pending.into_iter().filter(|event| query.matches(event)));
        Ok(query.apply_order_and_limit(events))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::aggregate::{Aggregate, AggregateType};
    use crate::errors::CommandError;
    use crate::event_store::{filter_to_query_reducer, InMemoryEventStore, MockEventStore};
    use crate::events::group::GroupAdded;
    use crate::events::org::OrgAdded;
    use crate::events::{GroupEvent, OrgEvent};
    use crate::write_model::org::OrgWriteModel;

    struct AddOrg {
        name: String,
    }

    #[async_trait]
    impl Preparation for AddOrg {
        fn validate(&mut self) -> CommandResult<()> {
            self.name = self.name.trim().to_string();
            if self.name.is_empty() {
                return Err(CommandError::invalid_argument("org name is empty"));
            }
            Ok(())
        }

        async fn create_commands(
            &self,
            _ctx: &CommandContext,
            _filter: &dyn Filter,
        ) -> CommandResult<Vec<Command>> {
            Ok(vec![Command::new(
                Aggregate::org("org1", "i1"),
                OrgEvent::Added(OrgAdded {
                    name: self.name.clone(),
                }),
            )])
        }
    }

    /// Adds a group, requires its org to exist
    struct AddGroupToOrg {
        validated: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Preparation for AddGroupToOrg {
        fn validate(&mut self) -> CommandResult<()> {
            self.validated.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn create_commands(
            &self,
            ctx: &CommandContext,
            filter: &dyn Filter,
        ) -> CommandResult<Vec<Command>> {
            let mut org = OrgWriteModel::new("org1", "i1");
            filter_to_query_reducer(ctx, filter, &mut org).await?;
            if !org.state.is_active() {
                return Err(CommandError::precondition_failed("org not active"));
            }
            Ok(vec![Command::new(
                Aggregate::group("g1", "org1", "i1"),
                GroupEvent::Added(GroupAdded {
                    name: "group".into(),
                    description: String::new(),
                }),
            )])
        }
    }

    #[tokio::test]
    async fn test_later_step_sees_pending_commands() {
        let store = InMemoryEventStore::new();
        let ctx = CommandContext::new("i1").with_user("user1");
        let validated = Arc::new(AtomicUsize::new(0));

        let commands = prepare_commands(
            &ctx,
            &store,
            vec![
                Box::new(AddOrg {
                    name: " acme ".into(),
                }),
                Box::new(AddGroupToOrg {
                    validated: Arc::clone(&validated),
                }),
            ],
        )
        .await
        .unwrap();

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].aggregate.aggregate_type, AggregateType::Org);
        assert_eq!(commands[1].aggregate.aggregate_type, AggregateType::Group);
        assert_eq!(validated.load(Ordering::SeqCst), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_without_pending_org_step_fails() {
        let store = InMemoryEventStore::new();
        let ctx = CommandContext::new("i1");

        let err = prepare_commands(
            &ctx,
            &store,
            vec![Box::new(AddGroupToOrg {
                validated: Arc::new(AtomicUsize::new(0)),
            })],
        )
        .await
        .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_validation_runs_before_any_read() {
        let mut store = MockEventStore::new();
        store.expect_filter().never();
        store.expect_push().never();
        let ctx = CommandContext::new("i1");
        let validated = Arc::new(AtomicUsize::new(0));

        let err = prepare_commands(
            &ctx,
            &store,
            vec![
                Box::new(AddGroupToOrg {
                    validated: Arc::clone(&validated),
                }),
                Box::new(AddOrg { name: "  ".into() }),
            ],
        )
        .await
        .unwrap_err();

        assert!(err.is_invalid_argument());
        assert_eq!(validated.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pending_events_continue_sequence() {
        let store = InMemoryEventStore::new();
        let ctx = CommandContext::new("i1");
        let org = Aggregate::org("org1", "i1");
        crate::event_store::EventStore::push(
            &store,
            &ctx,
            vec![Command::new(
                org.clone(),
                OrgEvent::Added(OrgAdded {
                    name: "acme".into(),
                }),
            )],
        )
        .await
        .unwrap();

        let pending = vec![Command::new(org.clone(), OrgEvent::Deactivated)];
        let view = TransactionFilter::new(&store, &pending);
        let mut model = OrgWriteModel::new("org1", "i1");
        filter_to_query_reducer(&ctx, &view, &mut model).await.unwrap();

        assert_eq!(model.base.processed_sequence, 2);
        assert_eq!(model.state, crate::domain::ObjectState::Inactive);
    }
}
