// Copyright (c) 2025 - Cowboy AI, Inc.
//! Write Models
//!
//! A write model is an ephemeral projection of an aggregate's history,
//! built fresh for one command invocation and dropped afterwards.
//!
//! # Reduce Pipeline
//!
//! ```text
//! filter(query) → append_events (discriminator filter) → reduce (fold)
//!                                                          ↓
//!                                        base fold: sequence, change date
//! ```
//!
//! # Composition
//!
//! Domain models own a [`WriteModel`] (or a generic intermediate model that
//! owns one) and forward to it explicitly:
//!
//! ```text
//! OrgMemberWriteModel ─owns→ MemberWriteModel ─owns→ WriteModel
//! ```
//!
//! # Invariants
//!
//! 1. `reduce` is deterministic: the same ordered events give the same state
//! 2. Later events supersede earlier ones field by field
//! 3. Ancestor removals are always accepted and void dependent state
//! 4. Only events of the model's own aggregate move `processed_sequence`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, AggregateType};
use crate::errors::CommandResult;
use crate::events::Event;
use crate::query::SearchQueryBuilder;

pub mod bulk;
pub mod custom_text;
pub mod group;
pub mod idp;
pub mod instance;
pub mod limits;
pub mod lockout_policy;
pub mod member;
pub mod milestone;
pub mod org;
pub mod project;
pub mod resource_owner;
pub mod secret_generator;
pub mod user;

pub use bulk::{BulkTarget, BulkWriteModel};
pub use resource_owner::ResourceOwnerModel;

/// Caller-visible result of a command
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectDetails {
    pub resource_owner: String,
    pub sequence: u64,
    pub change_date: Option<DateTime<Utc>>,
}

/// A model that knows its query and how to fold the results
pub trait QueryReducer: Send {
    /// Filter criteria, possibly broader than the model's own aggregate
    fn query(&self) -> SearchQueryBuilder;

    /// Accept events, applying the discriminator filter
    fn append_events(&mut self, events: &[Event]);

    /// Fold accepted events into state
    fn reduce(&mut self) -> CommandResult<()>;
}

/// Base fold shared by every write model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteModel {
    pub aggregate_type: AggregateType,
    pub aggregate_id: String,
    pub resource_owner: String,
    pub instance_id: String,
    pub processed_sequence: u64,
    pub change_date: Option<DateTime<Utc>>,
    events: Vec<Event>,
}

impl WriteModel {
    pub fn new(
        aggregate_type: AggregateType,
        aggregate_id: impl Into<String>,
        resource_owner: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_type,
            aggregate_id: aggregate_id.into(),
            resource_owner: resource_owner.into(),
            instance_id: instance_id.into(),
            processed_sequence: 0,
            change_date: None,
            events: Vec::new(),
        }
    }

    pub fn append(&mut self, event: &Event) {
        self.events.push(event.clone());
    }

    pub fn append_events(&mut self, events: &[Event]) {
        self.events.extend_from_slice(events);
    }

    /// Events appended but not yet reduced
    pub fn pending(&self) -> &[Event] {
        &self.events
    }

    /// Hand pending events to a domain fold
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    fn is_own(&self, event: &Event) -> bool {
        event.aggregate.aggregate_type == self.aggregate_type
            && (self.aggregate_id.is_empty() || event.aggregate_id() == self.aggregate_id)
    }

    /// Advance identity, sequence and change date over `events`
    pub fn reduce_events(&mut self, events: &[Event]) -> CommandResult<()> {
        for event in events {
            if !self.is_own(event) {
                continue;
            }
            if self.aggregate_id.is_empty() {
                self.aggregate_id = event.aggregate_id().to_string();
            }
            if self.resource_owner.is_empty() {
                self.resource_owner = event.resource_owner().to_string();
            }
            if self.instance_id.is_empty() {
                self.instance_id = event.instance_id().to_string();
            }
            self.processed_sequence = event.sequence;
            self.change_date = Some(event.created_at);
        }
        Ok(())
    }

    /// Fold pending events with no domain state of its own
    pub fn reduce(&mut self) -> CommandResult<()> {
        let events = self.take_events();
        self.reduce_events(&events)
    }

    pub fn aggregate(&self) -> Aggregate {
        Aggregate::new(
            self.aggregate_type,
            self.aggregate_id.clone(),
            self.resource_owner.clone(),
            self.instance_id.clone(),
        )
    }

    pub fn object_details(&self) -> ObjectDetails {
        ObjectDetails {
            resource_owner: self.resource_owner.clone(),
            sequence: self.processed_sequence,
            change_date: self.change_date,
        }
    }
}

/// Fold events that were just pushed back into the model
pub fn append_and_reduce<R>(model: &mut R, events: &[Event]) -> CommandResult<()>
where
    R: QueryReducer + ?Sized,
{
    model.append_events(events);
    model.reduce()
}

/// Details of the last pushed event
pub fn pushed_events_to_object_details(events: &[Event]) -> Option<ObjectDetails> {
    events.last().map(|event| ObjectDetails {
        resource_owner: event.resource_owner().to_string(),
        sequence: event.sequence,
        change_date: Some(event.created_at),
    })
}
