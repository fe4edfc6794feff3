// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Write Model Folds
//!
//! A write model is a pure fold over its events: replaying the same events
//! gives the same model no matter how they are batched, and the latest
//! value of each field wins.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use cim_iam_command::events::group::{GroupAdded, GroupChanged, GroupRemoved};
use cim_iam_command::events::limits::LimitsSet;
use cim_iam_command::events::{Event, GroupEvent, IamEvent, LimitsEvent};
use cim_iam_command::domain::ObjectState;
use cim_iam_command::write_model::append_and_reduce;
use cim_iam_command::write_model::group::GroupWriteModel;
use cim_iam_command::write_model::limits::LimitsWriteModel;
use cim_iam_command::Aggregate;
use proptest::prelude::*;

const INSTANCE: &str = "instance-1";
const ORG: &str = "org-1";
const GROUP: &str = "group-1";

fn created_at(sequence: u64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 19, 12, 0, 0)
        .single()
        .unwrap_or_default()
        + chrono::Duration::seconds(sequence as i64)
}

fn committed(aggregate: &Aggregate, payload: impl Into<IamEvent>, sequence: u64) -> Event {
    Event {
        aggregate: aggregate.clone(),
        payload: payload.into(),
        creator: "fixture".to_string(),
        created_at: created_at(sequence),
        sequence,
        position: sequence,
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}"
}

fn group_change() -> impl Strategy<Value = GroupEvent> {
    prop_oneof![
        (proptest::option::of(name()), proptest::option::of(name()))
            .prop_map(|(name, description)| GroupEvent::Changed(GroupChanged { name, description })),
        name().prop_map(|name| GroupEvent::Removed(GroupRemoved { name })),
    ]
}

/// Group events as the log would hold them: an add, then changes
fn group_history() -> impl Strategy<Value = Vec<Event>> {
    (name(), prop::collection::vec(group_change(), 0..20)).prop_map(|(first, changes)| {
        let aggregate = Aggregate::group(GROUP, ORG, INSTANCE);
        std::iter::once(GroupEvent::Added(GroupAdded {
            name: first,
            description: String::new(),
        }))
        .chain(changes)
        .enumerate()
        .map(|(index, payload)| committed(&aggregate, payload, index as u64 + 1))
        .collect()
    })
}

fn limits_set() -> impl Strategy<Value = LimitsSet> {
    (
        proptest::option::of((1u64..1_000).prop_map(Duration::from_secs)),
        proptest::option::of(any::<bool>()),
    )
        .prop_map(|(audit_log_retention, block)| LimitsSet {
            audit_log_retention,
            block,
        })
}

fn limits_event() -> impl Strategy<Value = LimitsEvent> {
    prop_oneof![
        4 => limits_set().prop_map(LimitsEvent::Set),
        1 => Just(LimitsEvent::Reset),
    ]
}

fn limits_history() -> impl Strategy<Value = Vec<LimitsEvent>> {
    prop::collection::vec(limits_event(), 0..30)
}

fn limits_events(history: &[LimitsEvent]) -> Vec<Event> {
    let aggregate = Aggregate::limits("limits-1", INSTANCE);
    history
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, payload)| committed(&aggregate, payload, index as u64 + 1))
        .collect()
}

fn fold_limits(events: &[Event]) -> LimitsWriteModel {
    let mut model = LimitsWriteModel::new(INSTANCE);
    append_and_reduce(&mut model, events).unwrap();
    model
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Replay is deterministic
    ///
    /// Folding the same history twice gives identical models.
    #[test]
    fn prop_group_replay_is_deterministic(events in group_history()) {
        let mut first = GroupWriteModel::new(GROUP, ORG, INSTANCE);
        let mut second = GroupWriteModel::new(GROUP, ORG, INSTANCE);
        append_and_reduce(&mut first, &events).unwrap();
        append_and_reduce(&mut second, &events).unwrap();

        prop_assert_eq!(first, second);
    }

    /// Property: Batching does not matter
    ///
    /// Folding event by event equals folding the whole history at once.
    #[test]
    fn prop_group_incremental_fold_matches_full_fold(events in group_history()) {
        let mut full = GroupWriteModel::new(GROUP, ORG, INSTANCE);
        append_and_reduce(&mut full, &events).unwrap();

        let mut incremental = GroupWriteModel::new(GROUP, ORG, INSTANCE);
        for event in &events {
            append_and_reduce(&mut incremental, std::slice::from_ref(event)).unwrap();
        }

        prop_assert_eq!(&full, &incremental);
        prop_assert_eq!(full.base.processed_sequence, events.len() as u64);
    }

    /// Property: A removed group stays removed
    #[test]
    fn prop_group_removal_is_terminal(events in group_history()) {
        let mut model = GroupWriteModel::new(GROUP, ORG, INSTANCE);
        append_and_reduce(&mut model, &events).unwrap();

        let removed = events.iter().any(|event| {
            matches!(event.payload, IamEvent::Group(GroupEvent::Removed(_)))
        });
        let expected = if removed { ObjectState::Removed } else { ObjectState::Active };
        prop_assert_eq!(model.state, expected);
    }

    /// Property: Last writer wins
    ///
    /// Each limit holds the value of the latest event that set it, unless
    /// a reset came after.
    #[test]
    fn prop_limits_last_writer_wins(history in limits_history()) {
        let model = fold_limits(&limits_events(&history));

        let mut retention = None;
        let mut block = None;
        for event in &history {
            match event {
                LimitsEvent::Set(set) => {
                    retention = set.audit_log_retention.or(retention);
                    block = set.block.or(block);
                }
                LimitsEvent::Reset => {
                    retention = None;
                    block = None;
                }
            }
        }

        prop_assert_eq!(model.audit_log_retention, retention);
        prop_assert_eq!(model.block, block);
        prop_assert_eq!(model.base.processed_sequence, history.len() as u64);
    }

    /// Property: Applying the diff reaches the desired values
    ///
    /// After folding the computed changes, asking again yields no change.
    #[test]
    fn prop_limits_changes_are_idempotent(history in limits_history(), desired in limits_set()) {
        let mut events = limits_events(&history);
        let mut model = fold_limits(&events);

        if let Some(changed) = model.changes(&desired) {
            let aggregate = Aggregate::limits("limits-1", INSTANCE);
            let next = committed(&aggregate, LimitsEvent::Set(changed), events.len() as u64 + 1);
            events.push(next.clone());
            append_and_reduce(&mut model, &[next]).unwrap();
        }

        prop_assert!(model.changes(&desired).is_none());
        if let Some(retention) = desired.audit_log_retention {
            prop_assert_eq!(model.audit_log_retention, Some(retention));
        }
        if let Some(block) = desired.block {
            prop_assert_eq!(model.block, Some(block));
        }
        prop_assert_eq!(fold_limits(&events), model);
    }
}
