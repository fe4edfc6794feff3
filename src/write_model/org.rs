// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization lifecycle write model
//!
//! Reacts to `instance.removed`: an organization of a removed instance is
//! removed as well.

use crate::aggregate::AggregateType;
use crate::domain::ObjectState;
use crate::errors::CommandResult;
use crate::events::{instance, org, Event, IamEvent, InstanceEvent, OrgEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgWriteModel {
    pub base: WriteModel,
    pub name: String,
    pub state: ObjectState,
}

impl OrgWriteModel {
    pub fn new(org_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let org_id = org_id.into();
        Self {
            base: WriteModel::new(AggregateType::Org, org_id.clone(), org_id, instance_id),
            name: String::new(),
            state: ObjectState::Unspecified,
        }
    }
}

impl QueryReducer for OrgWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Org])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([
                org::ADDED,
                org::CHANGED,
                org::DEACTIVATED,
                org::REACTIVATED,
                org::REMOVED,
            ])
            .or()
            .aggregate_types([AggregateType::Instance])
            .event_types([instance::REMOVED])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            match &event.payload {
                IamEvent::Org(
                    OrgEvent::Added(_)
                    | OrgEvent::Changed(_)
                    | OrgEvent::Deactivated
                    | OrgEvent::Reactivated
                    | OrgEvent::Removed(_),
                ) if event.aggregate_id() == self.base.aggregate_id => self.base.append(event),
                IamEvent::Instance(InstanceEvent::Removed(_)) => self.base.append(event),
                _ => {}
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Org(OrgEvent::Added(e)) => {
                    self.name = e.name.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::Org(OrgEvent::Changed(e)) => self.name = e.name.clone(),
                IamEvent::Org(OrgEvent::Deactivated) => self.state = ObjectState::Inactive,
                IamEvent::Org(OrgEvent::Reactivated) => self.state = ObjectState::Active,
                IamEvent::Org(OrgEvent::Removed(_))
                | IamEvent::Instance(InstanceEvent::Removed(_)) => {
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}
