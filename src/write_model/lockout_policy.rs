// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lockout policy write models
//!
//! ```text
//! InstanceLockoutPolicyWriteModel ─┐
//!                                  ├─owns→ LockoutPolicyWriteModel ─owns→ WriteModel
//! OrgLockoutPolicyWriteModel ──────┘
//! ```
//!
//! The wrappers decide which events reach the shared fold: the policy
//! payloads of their own aggregate plus the ancestor removal that voids the
//! policy.

use crate::aggregate::AggregateType;
use crate::domain::{LockoutPolicy, ObjectState};
use crate::errors::CommandResult;
use crate::events::policy::LockoutPolicyChanged;
use crate::events::{instance, org, Event, LockoutPolicyEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

/// Policy fold shared by the instance default and org policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockoutPolicyWriteModel {
    pub base: WriteModel,
    pub policy: LockoutPolicy,
    pub state: ObjectState,
}

impl LockoutPolicyWriteModel {
    pub fn new(
        aggregate_type: AggregateType,
        aggregate_id: impl Into<String>,
        resource_owner: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(aggregate_type, aggregate_id, resource_owner, instance_id),
            policy: LockoutPolicy::default(),
            state: ObjectState::Unspecified,
        }
    }

    /// Accept the event if it is a policy event of this aggregate or `ancestor_removed`
    fn append_filtered(&mut self, events: &[Event], ancestor_removed: impl Fn(&Event) -> bool) {
        for event in events {
            let own = event.aggregate.aggregate_type == self.base.aggregate_type
                && event.aggregate_id() == self.base.aggregate_id;
            if (own && event.payload.lockout_policy().is_some()) || ancestor_removed(event) {
                self.base.append(event);
            }
        }
    }

    fn apply(&mut self, event: &LockoutPolicyEvent) {
        match event {
            LockoutPolicyEvent::Added(e) => {
                self.policy = LockoutPolicy {
                    max_password_attempts: e.max_password_attempts,
                    max_otp_attempts: e.max_otp_attempts,
                    show_lockout_failures: e.show_lockout_failures,
                };
                self.state = ObjectState::Active;
            }
            LockoutPolicyEvent::Changed(e) => {
                if let Some(v) = e.max_password_attempts {
                    self.policy.max_password_attempts = v;
                }
                if let Some(v) = e.max_otp_attempts {
                    self.policy.max_otp_attempts = v;
                }
                if let Some(v) = e.show_lockout_failures {
                    self.policy.show_lockout_failures = v;
                }
            }
            LockoutPolicyEvent::Removed => self.void(),
        }
    }

    fn void(&mut self) {
        self.policy = LockoutPolicy::default();
        self.state = ObjectState::Removed;
    }

    /// Diff against the desired policy, `None` when nothing changes
    pub fn changes(&self, desired: &LockoutPolicy) -> Option<LockoutPolicyChanged> {
        LockoutPolicyChanged::diff(&self.policy, desired)
    }
}

impl QueryReducer for LockoutPolicyWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([self.base.aggregate_type])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        self.append_filtered(events, |_| false);
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match event.payload.lockout_policy() {
                Some(policy_event) => self.apply(policy_event),
                // only ancestor removals pass the wrapper filters
                None => self.void(),
            }
        }
        self.base.reduce_events(&events)
    }
}

/// Default lockout policy of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceLockoutPolicyWriteModel {
    pub policy: LockoutPolicyWriteModel,
}

impl InstanceLockoutPolicyWriteModel {
    pub fn new(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self {
            policy: LockoutPolicyWriteModel::new(
                AggregateType::Instance,
                instance_id.clone(),
                instance_id.clone(),
                instance_id,
            ),
        }
    }
}

impl QueryReducer for InstanceLockoutPolicyWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.policy.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Instance])
            .aggregate_ids([self.policy.base.aggregate_id.as_str()])
            .event_types([
                instance::LOCKOUT_POLICY_ADDED,
                instance::LOCKOUT_POLICY_CHANGED,
                instance::LOCKOUT_POLICY_REMOVED,
                instance::REMOVED,
            ])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        self.policy
            .append_filtered(events, |event| event.payload.is_instance_removed());
    }

    fn reduce(&mut self) -> CommandResult<()> {
        self.policy.reduce()
    }
}

/// Lockout policy of one organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgLockoutPolicyWriteModel {
    pub policy: LockoutPolicyWriteModel,
}

impl OrgLockoutPolicyWriteModel {
    pub fn new(org_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let org_id = org_id.into();
        Self {
            policy: LockoutPolicyWriteModel::new(
                AggregateType::Org,
                org_id.clone(),
                org_id,
                instance_id,
            ),
        }
    }
}

impl QueryReducer for OrgLockoutPolicyWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.policy.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Org])
            .aggregate_ids([self.policy.base.aggregate_id.as_str()])
            .event_types([
                org::LOCKOUT_POLICY_ADDED,
                org::LOCKOUT_POLICY_CHANGED,
                org::LOCKOUT_POLICY_REMOVED,
                org::REMOVED,
            ])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        let org_id = self.policy.base.aggregate_id.clone();
        self.policy.append_filtered(events, |event| {
            event.payload.is_org_removed() && event.aggregate_id() == org_id
        });
    }

    fn reduce(&mut self) -> CommandResult<()> {
        self.policy.reduce()
    }
}
