// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance lifecycle write model

use crate::aggregate::AggregateType;
use crate::domain::ObjectState;
use crate::errors::CommandResult;
use crate::events::{instance, Event, IamEvent, InstanceEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceWriteModel {
    pub base: WriteModel,
    pub name: String,
    pub state: ObjectState,
}

impl InstanceWriteModel {
    pub fn new(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self {
            base: WriteModel::new(
                AggregateType::Instance,
                instance_id.clone(),
                instance_id.clone(),
                instance_id,
            ),
            name: String::new(),
            state: ObjectState::Unspecified,
        }
    }
}

impl QueryReducer for InstanceWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Instance])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([instance::ADDED, instance::REMOVED])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if event.aggregate_id() != self.base.aggregate_id {
                continue;
            }
            if let IamEvent::Instance(InstanceEvent::Added(_) | InstanceEvent::Removed(_)) =
                &event.payload
            {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Instance(InstanceEvent::Added(e)) => {
                    self.name = e.name.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::Instance(InstanceEvent::Removed(_)) => {
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}
