// Copyright (c) 2025 - Cowboy AI, Inc.
//! Milestones write model
//!
//! Each milestone of an instance is reached at most once. The folded flags
//! are cached per instance by the milestone commands.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateType;
use crate::cache::{CacheEntry, CacheIndex};
use crate::domain::MilestoneType;
use crate::errors::CommandResult;
use crate::events::{milestone, Event, IamEvent, MilestoneEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

/// Reached flags of one instance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MilestonesReached {
    pub instance_id: String,
    pub instance_created: bool,
    pub authentication_succeeded_on_instance: bool,
    pub project_created: bool,
    pub application_created: bool,
    pub authentication_succeeded_on_application: bool,
    pub instance_deleted: bool,
}

impl MilestonesReached {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    pub fn is_reached(&self, milestone_type: MilestoneType) -> bool {
        match milestone_type {
            MilestoneType::InstanceCreated => self.instance_created,
            MilestoneType::AuthenticationSucceededOnInstance => {
                self.authentication_succeeded_on_instance
            }
            MilestoneType::ProjectCreated => self.project_created,
            MilestoneType::ApplicationCreated => self.application_created,
            MilestoneType::AuthenticationSucceededOnApplication => {
                self.authentication_succeeded_on_application
            }
            MilestoneType::InstanceDeleted => self.instance_deleted,
        }
    }

    pub fn reach(&mut self, milestone_type: MilestoneType) {
        let flag = match milestone_type {
            MilestoneType::InstanceCreated => &mut self.instance_created,
            MilestoneType::AuthenticationSucceededOnInstance => {
                &mut self.authentication_succeeded_on_instance
            }
            MilestoneType::ProjectCreated => &mut self.project_created,
            MilestoneType::ApplicationCreated => &mut self.application_created,
            MilestoneType::AuthenticationSucceededOnApplication => {
                &mut self.authentication_succeeded_on_application
            }
            MilestoneType::InstanceDeleted => &mut self.instance_deleted,
        };
        *flag = true;
    }
}

/// Lookup index of cached milestones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MilestoneIndex {
    InstanceId,
}

impl CacheIndex for MilestoneIndex {
    fn all() -> &'static [Self] {
        &[MilestoneIndex::InstanceId]
    }
}

impl CacheEntry for MilestonesReached {
    type Index = MilestoneIndex;

    fn keys(&self, index: MilestoneIndex) -> Vec<String> {
        match index {
            MilestoneIndex::InstanceId => vec![self.instance_id.clone()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestonesWriteModel {
    pub base: WriteModel,
    pub reached: MilestonesReached,
}

impl MilestonesWriteModel {
    pub fn new(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self {
            base: WriteModel::new(
                AggregateType::Milestone,
                instance_id.clone(),
                instance_id.clone(),
                instance_id.clone(),
            ),
            reached: MilestonesReached::new(instance_id),
        }
    }
}

impl QueryReducer for MilestonesWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Milestone])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([milestone::REACHED])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if event.aggregate_id() == self.base.aggregate_id
                && matches!(event.payload, IamEvent::Milestone(_))
            {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            if let IamEvent::Milestone(MilestoneEvent::Reached(e)) = &event.payload {
                self.reached.reach(e.milestone_type);
            }
        }
        self.base.reduce_events(&events)
    }
}
