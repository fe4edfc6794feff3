// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Event Log
//!
//! Reference implementation of [`EventStore`] for tests and embedding. It
//! keeps the whole log in one `RwLock` and commits a push inside a single
//! write critical section, which makes every push atomic.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::EventStore;
use crate::aggregate::{Aggregate, AggregateType};
use crate::context::CommandContext;
use crate::errors::EventStoreError;
use crate::events::{Command, Event, UniqueConstraintAction};
use crate::query::SearchQueryBuilder;

type AggregateKey = (String, AggregateType, String);
type UniqueKey = (String, String, String);

fn aggregate_key(aggregate: &Aggregate) -> AggregateKey {
    (
        aggregate.instance_id.clone(),
        aggregate.aggregate_type,
        aggregate.id.clone(),
    )
}

#[derive(Debug, Default)]
struct Log {
    events: Vec<Event>,
    sequences: HashMap<AggregateKey, u64>,
    unique_constraints: HashSet<UniqueKey>,
}

/// Event log held in process memory
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    log: RwLock<Log>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every committed event
    pub async fn events(&self) -> Vec<Event> {
        self.log.read().await.events.clone()
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current sequence of an aggregate, zero if it has no events
    pub async fn sequence(&self, aggregate: &Aggregate) -> u64 {
        self.log
            .read()
            .await
            .sequences
            .get(&aggregate_key(aggregate))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn filter(
        &self,
        ctx: &CommandContext,
        query: &SearchQueryBuilder,
    ) -> Result<Vec<Event>, EventStoreError> {
        ctx.check()?;

        let log = self.log.read().await;
        let matching: Vec<Event> = log
            .events
            .iter()
            .filter(|event| query.matches(event))
            .cloned()
            .collect();
        Ok(query.apply_order_and_limit(matching))
    }

    async fn push(
        &self,
        ctx: &CommandContext,
        commands: Vec<Command>,
    ) -> Result<Vec<Event>, EventStoreError> {
        ctx.check()?;
        if commands.is_empty() {
            return Ok(Vec::new());
        }

        let mut log = self.log.write().await;

        for command in &commands {
            if let Some(expected) = command.expected_sequence {
                let actual = log
                    .sequences
                    .get(&aggregate_key(&command.aggregate))
                    .copied()
                    .unwrap_or(0);
                if actual != expected {
                    return Err(EventStoreError::Conflict {
                        aggregate_id: command.aggregate.id.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }

        let mut unique_constraints = log.unique_constraints.clone();
        for command in &commands {
            let instance_id = &command.aggregate.instance_id;
            for constraint in &command.unique_constraints {
                match constraint.action {
                    UniqueConstraintAction::Add => {
                        let key = (
                            instance_id.clone(),
                            constraint.unique_type.clone(),
                            constraint.unique_field.clone(),
                        );
                        if !unique_constraints.insert(key) {
                            return Err(EventStoreError::UniqueConstraint {
                                unique_type: constraint.unique_type.clone(),
                                message: constraint.error_message.clone(),
                            });
                        }
                    }
                    UniqueConstraintAction::Remove => {
                        unique_constraints.remove(&(
                            instance_id.clone(),
                            constraint.unique_type.clone(),
                            constraint.unique_field.clone(),
                        ));
                    }
                    UniqueConstraintAction::InstanceRemove => {
                        unique_constraints.retain(|(instance, _, _)| instance != instance_id);
                    }
                }
            }
        }

        let created_at = Utc::now();
        let mut pushed = Vec::with_capacity(commands.len());
        for command in commands {
            let sequence = log
                .sequences
                .entry(aggregate_key(&command.aggregate))
                .or_insert(0);
            *sequence += 1;
            let sequence = *sequence;
            let position = (log.events.len() + pushed.len()) as u64 + 1;

            pushed.push(Event {
                aggregate: command.aggregate,
                payload: command.payload,
                creator: ctx.user_id().to_string(),
                created_at,
                sequence,
                position,
            });
        }

        log.unique_constraints = unique_constraints;
        log.events.extend(pushed.iter().cloned());

        debug!(
            instance_id = ctx.instance_id(),
            count = pushed.len(),
            last_position = log.events.len(),
            "pushed events"
        );

        Ok(pushed)
    }
}
