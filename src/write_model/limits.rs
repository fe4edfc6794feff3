// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance limits write models
//!
//! The limits aggregate id is generated on the first `set` and adopted from
//! the log afterwards, so a fresh model starts with an empty aggregate id.

use std::time::Duration;

use crate::aggregate::AggregateType;
use crate::errors::CommandResult;
use crate::events::limits::LimitsSet;
use crate::events::{instance, limits, Event, IamEvent, InstanceEvent, LimitsEvent};
use crate::query::SearchQueryBuilder;

use super::bulk::{BulkTarget, BulkWriteModel};
use super::{QueryReducer, WriteModel};

/// Limits of every targeted instance, read with one query
pub type LimitsBulkWriteModel = BulkWriteModel<LimitsWriteModel>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitsWriteModel {
    pub base: WriteModel,
    pub audit_log_retention: Option<Duration>,
    pub block: Option<bool>,
}

impl LimitsWriteModel {
    pub fn new(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self {
            base: WriteModel::new(AggregateType::Limits, "", instance_id.clone(), instance_id),
            audit_log_retention: None,
            block: None,
        }
    }

    /// Bulk model over `instance_ids`
    pub fn bulk<I, S>(instance_ids: I) -> LimitsBulkWriteModel
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let instance_ids: Vec<String> = instance_ids.into_iter().map(Into::into).collect();
        let query = Self::event_query(SearchQueryBuilder::new().instance_ids(instance_ids.clone()));
        BulkWriteModel::new(query, instance_ids)
    }

    fn event_query(builder: SearchQueryBuilder) -> SearchQueryBuilder {
        builder
            .add_query()
            .aggregate_types([AggregateType::Limits])
            .event_types([limits::SET, limits::RESET])
            .or()
            .aggregate_types([AggregateType::Instance])
            .event_types([instance::REMOVED])
            .builder()
    }

    /// Requested values that differ, `None` when nothing changes
    pub fn changes(&self, desired: &LimitsSet) -> Option<LimitsSet> {
        let changed = LimitsSet {
            audit_log_retention: desired
                .audit_log_retention
                .filter(|v| self.audit_log_retention != Some(*v)),
            block: desired.block.filter(|v| self.block != Some(*v)),
        };
        (changed != LimitsSet::default()).then_some(changed)
    }

    /// Any limit is currently set
    pub fn is_set(&self) -> bool {
        self.audit_log_retention.is_some() || self.block.is_some()
    }
}

impl QueryReducer for LimitsWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        Self::event_query(SearchQueryBuilder::new().instance_id(&self.base.instance_id))
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if event.instance_id() != self.base.instance_id {
                continue;
            }
            match &event.payload {
                IamEvent::Limits(_) | IamEvent::Instance(InstanceEvent::Removed(_)) => {
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
                IamEvent::Limits(LimitsEvent::Set(e)) => {
                    if let Some(retention) = e.audit_log_retention {
                        self.audit_log_retention = Some(retention);
                    }
                    if let Some(block) = e.block {
                        self.block = Some(block);
                    }
                }
                IamEvent::Limits(LimitsEvent::Reset) | IamEvent::Instance(_) => {
                    self.audit_log_retention = None;
                    self.block = None;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}

impl BulkTarget for LimitsWriteModel {
    fn for_target(target_id: &str) -> Self {
        Self::new(target_id)
    }

    fn routing_key(event: &Event) -> Option<&str> {
        Some(event.instance_id())
    }
}
