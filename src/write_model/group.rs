// Copyright (c) 2025 - Cowboy AI, Inc.
//! Group write model
//!
//! Reacts to removal of the owning organization.

use crate::aggregate::AggregateType;
use crate::domain::ObjectState;
use crate::errors::CommandResult;
use crate::events::group::GroupChanged;
use crate::events::{group, org, Event, GroupEvent, IamEvent, OrgEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupWriteModel {
    pub base: WriteModel,
    pub name: String,
    pub description: String,
    pub state: ObjectState,
}

impl GroupWriteModel {
    /// `org_id` may be empty when the owner is not known yet
    pub fn new(
        group_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(AggregateType::Group, group_id, org_id, instance_id),
            name: String::new(),
            description: String::new(),
            state: ObjectState::Unspecified,
        }
    }

    /// Diff against the desired values, `None` when nothing changes
    pub fn changes(&self, name: Option<&str>, description: Option<&str>) -> Option<GroupChanged> {
        let changed = GroupChanged {
            name: name.filter(|n| *n != self.name).map(str::to_string),
            description: description
                .filter(|d| *d != self.description)
                .map(str::to_string),
        };
        (changed != GroupChanged::default()).then_some(changed)
    }
}

impl QueryReducer for GroupWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        let query = SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Group])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([group::ADDED, group::CHANGED, group::REMOVED]);
        if self.base.resource_owner.is_empty() {
            return query.builder();
        }
        query
            .or()
            .aggregate_types([AggregateType::Org])
            .aggregate_ids([self.base.resource_owner.as_str()])
            .event_types([org::REMOVED])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            match &event.payload {
                IamEvent::Group(_) if event.aggregate_id() == self.base.aggregate_id => {
                    self.base.append(event)
                }
                IamEvent::Org(OrgEvent::Removed(_))
                    if event.aggregate_id() == self.base.resource_owner =>
                {
                    self.base.append(event)
                }
                _ => {}
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Group(GroupEvent::Added(e)) => {
                    self.name = e.name.clone();
                    self.description = e.description.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::Group(GroupEvent::Changed(e)) => {
                    if let Some(name) = &e.name {
                        self.name = name.clone();
                    }
                    if let Some(description) = &e.description {
                        self.description = description.clone();
                    }
                }
                IamEvent::Group(GroupEvent::Removed(_)) | IamEvent::Org(OrgEvent::Removed(_)) => {
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}
