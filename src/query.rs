// Copyright (c) 2025 - Cowboy AI, Inc.
//! Search Query Builder
//!
//! Composes the filter a write model hands to the event log.
//!
//! ```text
//! builder-level filters (instance, resource owner, sequence)
//!   AND ( group 1: types AND ids AND event types
//!         OR
//!         group 2: ... )
//! ```
//!
//! Groups are started with [`SearchQueryBuilder::add_query`] and
//! [`SearchQuery::or`]; [`SearchQuery::builder`] closes the last group.
//!
//! # Example
//!
//! ```rust
//! use cim_iam_command::aggregate::AggregateType;
//! use cim_iam_command::events::{group, org};
//! use cim_iam_command::query::SearchQueryBuilder;
//!
//! let query = SearchQueryBuilder::new()
//!     .instance_id("instance1")
//!     .add_query()
//!     .aggregate_types([AggregateType::Group])
//!     .aggregate_ids(["group1"])
//!     .event_types([group::ADDED, group::CHANGED, group::REMOVED])
//!     .or()
//!     .aggregate_types([AggregateType::Org])
//!     .aggregate_ids(["org1"])
//!     .event_types([org::REMOVED])
//!     .builder();
//!
//! assert_eq!(query.queries().len(), 2);
//! ```

use crate::aggregate::AggregateType;
use crate::events::Event;

/// Result ordering by commit position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Ascending,
    Descending,
}

/// Top-level filter plus OR-ed query groups
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQueryBuilder {
    instance_ids: Vec<String>,
    resource_owner: Option<String>,
    sequence_greater: Option<u64>,
    order: Order,
    limit: Option<usize>,
    queries: Vec<SearchQuery>,
}

/// One AND-ed query group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchQuery {
    aggregate_types: Vec<AggregateType>,
    aggregate_ids: Vec<String>,
    event_types: Vec<String>,
    builder: Option<Box<SearchQueryBuilder>>,
}

impl SearchQueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one instance
    pub fn instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.instance_ids = vec![instance_id.into()];
        self
    }

    /// Restrict to a set of instances, used by cross-instance bulk queries
    pub fn instance_ids<I, S>(mut self, instance_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instance_ids = instance_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn resource_owner(mut self, resource_owner: impl Into<String>) -> Self {
        self.resource_owner = Some(resource_owner.into());
        self
    }

    /// Only events with a sequence strictly above `sequence`
    pub fn sequence_greater(mut self, sequence: u64) -> Self {
        self.sequence_greater = Some(sequence);
        self
    }

    pub fn order_desc(mut self) -> Self {
        self.order = Order::Descending;
        self
    }

    pub fn order_asc(mut self) -> Self {
        self.order = Order::Ascending;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Start a new query group
    pub fn add_query(self) -> SearchQuery {
        SearchQuery {
            builder: Some(Box::new(self)),
            ..SearchQuery::default()
        }
    }

    pub fn instance_filter(&self) -> &[String] {
        &self.instance_ids
    }

    pub fn resource_owner_filter(&self) -> Option<&str> {
        self.resource_owner.as_deref()
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    pub fn queries(&self) -> &[SearchQuery] {
        &self.queries
    }

    /// Whether `event` satisfies this filter, ignoring order and limit
    pub fn matches(&self, event: &Event) -> bool {
        if !self.instance_ids.is_empty()
            && !self.instance_ids.iter().any(|id| id == event.instance_id())
        {
            return false;
        }
        if let Some(owner) = &self.resource_owner {
            if owner != event.resource_owner() {
                return false;
            }
        }
        if let Some(sequence) = self.sequence_greater {
            if event.sequence <= sequence {
                return false;
            }
        }
        self.queries.is_empty() || self.queries.iter().any(|query| query.matches(event))
    }

    /// Apply order and limit to events already sorted by position
    pub fn apply_order_and_limit(&self, mut events: Vec<Event>) -> Vec<Event> {
        if self.order == Order::Descending {
            events.reverse();
        }
        if let Some(limit) = self.limit {
            events.truncate(limit);
        }
        events
    }
}

impl SearchQuery {
    pub fn aggregate_types<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = AggregateType>,
    {
        self.aggregate_types = types.into_iter().collect();
        self
    }

    pub fn aggregate_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aggregate_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn event_types<I, S>(mut self, event_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.event_types = event_types.into_iter().map(Into::into).collect();
        self
    }

    /// Close this group and start another one
    pub fn or(self) -> SearchQuery {
        self.builder().add_query()
    }

    /// Close this group and return to the builder
    pub fn builder(mut self) -> SearchQueryBuilder {
        let mut builder = self.builder.take().map(|b| *b).unwrap_or_default();
        builder.queries.push(self);
        builder
    }

    pub fn matches(&self, event: &Event) -> bool {
        (self.aggregate_types.is_empty()
            || self.aggregate_types.contains(&event.aggregate.aggregate_type))
            && (self.aggregate_ids.is_empty()
                || self.aggregate_ids.iter().any(|id| id == event.aggregate_id()))
            && (self.event_types.is_empty()
                || self.event_types.iter().any(|t| t == event.event_type()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::events::group::{GroupAdded, GroupRemoved};
    use crate::events::org::OrgRemoved;
    use crate::events::{group, org, GroupEvent, IamEvent, OrgEvent};
    use chrono::Utc;

    fn event(aggregate: Aggregate, payload: IamEvent, sequence: u64) -> Event {
        Event {
            aggregate,
            payload,
            creator: "user1".into(),
            created_at: Utc::now(),
            sequence,
            position: sequence,
        }
    }

    fn group_added(id: &str, org: &str, instance: &str) -> Event {
        event(
            Aggregate::group(id, org, instance),
            GroupEvent::Added(GroupAdded {
                name: id.into(),
                description: String::new(),
            })
            .into(),
            1,
        )
    }

    #[test]
    fn test_group_is_and() {
        let query = SearchQueryBuilder::new()
            .add_query()
            .aggregate_types([AggregateType::Group])
            .aggregate_ids(["g1"])
            .event_types([group::REMOVED])
            .builder();

        assert!(!query.matches(&group_added("g1", "org1", "i1")));

        let removed = event(
            Aggregate::group("g1", "org1", "i1"),
            GroupEvent::Removed(GroupRemoved { name: "g1".into() }).into(),
            2,
        );
        assert!(query.matches(&removed));
    }

    #[test]
    fn test_or_unions_groups() {
        let query = SearchQueryBuilder::new()
            .add_query()
            .aggregate_types([AggregateType::Group])
            .aggregate_ids(["g1"])
            .or()
            .aggregate_types([AggregateType::Org])
            .event_types([org::REMOVED])
            .builder();

        let org_removed = event(
            Aggregate::org("org1", "i1"),
            OrgEvent::Removed(OrgRemoved { name: "o".into() }).into(),
            5,
        );
        assert_eq!(query.queries().len(), 2);
        assert!(query.matches(&group_added("g1", "org1", "i1")));
        assert!(!query.matches(&group_added("g2", "org1", "i1")));
        assert!(query.matches(&org_removed));
    }

    #[test]
    fn test_builder_level_filters_apply_to_every_group() {
        let query = SearchQueryBuilder::new()
            .instance_id("i1")
            .resource_owner("org1")
            .add_query()
            .aggregate_types([AggregateType::Group])
            .builder();

        assert!(query.matches(&group_added("g1", "org1", "i1")));
        assert!(!query.matches(&group_added("g1", "org2", "i1")));
        assert!(!query.matches(&group_added("g1", "org1", "i2")));
    }

    #[test]
    fn test_instance_ids_and_sequence_filter() {
        let query = SearchQueryBuilder::new()
            .instance_ids(["i1", "i2"])
            .sequence_greater(0);

        assert!(query.matches(&group_added("g1", "org1", "i2")));
        assert!(!query.matches(&group_added("g1", "org1", "i3")));

        let query = SearchQueryBuilder::new().sequence_greater(1);
        assert!(!query.matches(&group_added("g1", "org1", "i1")));
    }

    #[test]
    fn test_order_and_limit() {
        let events: Vec<Event> = (1..=5)
            .map(|seq| {
                let mut e = group_added("g1", "org1", "i1");
                e.sequence = seq;
                e.position = seq;
                e
            })
            .collect();

        let latest = SearchQueryBuilder::new()
            .order_desc()
            .limit(2)
            .apply_order_and_limit(events.clone());
        assert_eq!(
            latest.iter().map(|e| e.sequence).collect::<Vec<_>>(),
            vec![5, 4]
        );

        let all = SearchQueryBuilder::new().apply_order_and_limit(events);
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].sequence, 1);
    }
}
