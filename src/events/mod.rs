// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Domain Events
//!
//! Events are immutable facts. Every payload lives in one closed sum type,
//! [`IamEvent`], with one enum per aggregate type. Write models dispatch on it
//! with `match`; there is no dynamic type switching.
//!
//! # Event Flow
//!
//! ```text
//! Command (candidate) → Push → Event (committed) → AppendEvents → Reduce
//!   payload + constraints     aggregate, sequence, position, created_at
//! ```
//!
//! # Envelope
//!
//! - `aggregate`: identity tuple of the aggregate the event belongs to
//! - `sequence`: per aggregate, strictly increasing, starts at 1
//! - `position`: global commit order across aggregates
//! - `created_at`: commit instant, shared by all events of one push
//! - `creator`: acting user of the command
//!
//! # Module Organization
//!
//! - [`instance`] - instance lifecycle, secret generators, default policies
//! - [`org`] - organization lifecycle, org policies, identity providers
//! - [`group`], [`project`], [`user`], [`limits`], [`milestone`]
//! - [`policy`], [`member`], [`text`] - payload families shared between
//!   instance and org aggregates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, AggregateType};

pub mod group;
pub mod instance;
pub mod limits;
pub mod member;
pub mod milestone;
pub mod org;
pub mod policy;
pub mod project;
pub mod text;
pub mod user;

pub use group::GroupEvent;
pub use instance::InstanceEvent;
pub use limits::LimitsEvent;
pub use member::MemberEvent;
pub use milestone::MilestoneEvent;
pub use org::OrgEvent;
pub use policy::LockoutPolicyEvent;
pub use project::ProjectEvent;
pub use text::CustomTextEvent;
pub use user::UserEvent;

/// Every event payload of the IAM write side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "aggregate_type", content = "event", rename_all = "snake_case")]
pub enum IamEvent {
    Instance(InstanceEvent),
    Org(OrgEvent),
    Group(GroupEvent),
    Project(ProjectEvent),
    User(UserEvent),
    Limits(LimitsEvent),
    Milestone(MilestoneEvent),
}

impl IamEvent {
    /// Stable, dotted event type name used in queries
    pub fn event_type(&self) -> &'static str {
        match self {
            IamEvent::Instance(e) => e.event_type(),
            IamEvent::Org(e) => e.event_type(),
            IamEvent::Group(e) => e.event_type(),
            IamEvent::Project(e) => e.event_type(),
            IamEvent::User(e) => e.event_type(),
            IamEvent::Limits(e) => e.event_type(),
            IamEvent::Milestone(e) => e.event_type(),
        }
    }

    /// Aggregate type this payload belongs to
    pub fn aggregate_type(&self) -> AggregateType {
        match self {
            IamEvent::Instance(_) => AggregateType::Instance,
            IamEvent::Org(_) => AggregateType::Org,
            IamEvent::Group(_) => AggregateType::Group,
            IamEvent::Project(_) => AggregateType::Project,
            IamEvent::User(_) => AggregateType::User,
            IamEvent::Limits(_) => AggregateType::Limits,
            IamEvent::Milestone(_) => AggregateType::Milestone,
        }
    }

    /// Lockout policy payload on either the instance or an org
    pub fn lockout_policy(&self) -> Option<&LockoutPolicyEvent> {
        match self {
            IamEvent::Instance(InstanceEvent::LockoutPolicy(e)) => Some(e),
            IamEvent::Org(OrgEvent::LockoutPolicy(e)) => Some(e),
            _ => None,
        }
    }

    /// Member payload on either the instance or an org
    pub fn member(&self) -> Option<&MemberEvent> {
        match self {
            IamEvent::Instance(InstanceEvent::Member(e)) => Some(e),
            IamEvent::Org(OrgEvent::Member(e)) => Some(e),
            _ => None,
        }
    }

    /// Custom text payload on either the instance or an org
    pub fn custom_text(&self) -> Option<&CustomTextEvent> {
        match self {
            IamEvent::Instance(InstanceEvent::CustomText(e)) => Some(e),
            IamEvent::Org(OrgEvent::CustomText(e)) => Some(e),
            _ => None,
        }
    }

    /// Ancestor removals that void every dependent object
    pub fn is_instance_removed(&self) -> bool {
        matches!(self, IamEvent::Instance(InstanceEvent::Removed(_)))
    }

    pub fn is_org_removed(&self) -> bool {
        matches!(self, IamEvent::Org(OrgEvent::Removed(_)))
    }

    pub fn is_project_removed(&self) -> bool {
        matches!(self, IamEvent::Project(ProjectEvent::Removed(_)))
    }

    pub fn is_user_removed(&self) -> bool {
        matches!(self, IamEvent::User(UserEvent::Removed(_)))
    }
}

macro_rules! impl_from_aggregate_event {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for IamEvent {
                fn from(event: $ty) -> Self {
                    IamEvent::$variant(event)
                }
            }
        )*
    };
}

impl_from_aggregate_event!(
    Instance(InstanceEvent),
    Org(OrgEvent),
    Group(GroupEvent),
    Project(ProjectEvent),
    User(UserEvent),
    Limits(LimitsEvent),
    Milestone(MilestoneEvent),
);

/// A committed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub aggregate: Aggregate,
    pub payload: IamEvent,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub sequence: u64,
    pub position: u64,
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate.id
    }

    pub fn resource_owner(&self) -> &str {
        &self.aggregate.resource_owner
    }

    pub fn instance_id(&self) -> &str {
        &self.aggregate.instance_id
    }
}

/// What a unique constraint does at commit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniqueConstraintAction {
    /// Reserve the value, fail if taken
    Add,
    /// Release the value
    Remove,
    /// Release every value of the instance
    InstanceRemove,
}

/// Uniqueness declared by a command, checked atomically with the push
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniqueConstraint {
    pub unique_type: String,
    pub unique_field: String,
    pub action: UniqueConstraintAction,
    /// Reported when an `Add` collides
    pub error_message: String,
}

impl UniqueConstraint {
    pub fn add(
        unique_type: impl Into<String>,
        unique_field: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            unique_type: unique_type.into(),
            unique_field: unique_field.into(),
            action: UniqueConstraintAction::Add,
            error_message: error_message.into(),
        }
    }

    pub fn remove(unique_type: impl Into<String>, unique_field: impl Into<String>) -> Self {
        Self {
            unique_type: unique_type.into(),
            unique_field: unique_field.into(),
            action: UniqueConstraintAction::Remove,
            error_message: String::new(),
        }
    }

    pub fn instance_remove() -> Self {
        Self {
            unique_type: String::new(),
            unique_field: String::new(),
            action: UniqueConstraintAction::InstanceRemove,
            error_message: String::new(),
        }
    }
}

/// A candidate event, not yet committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub aggregate: Aggregate,
    pub payload: IamEvent,
    pub unique_constraints: Vec<UniqueConstraint>,
    /// Aggregate sequence the decision was based on; `None` skips the check
    pub expected_sequence: Option<u64>,
}

impl Command {
    pub fn new(aggregate: Aggregate, payload: impl Into<IamEvent>) -> Self {
        Self {
            aggregate,
            payload: payload.into(),
            unique_constraints: Vec::new(),
            expected_sequence: None,
        }
    }

    pub fn with_unique_constraint(mut self, constraint: UniqueConstraint) -> Self {
        self.unique_constraints.push(constraint);
        self
    }

    pub fn with_expected_sequence(mut self, sequence: u64) -> Self {
        self.expected_sequence = Some(sequence);
        self
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
