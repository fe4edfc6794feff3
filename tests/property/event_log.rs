// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the In-Memory Event Log
//!
//! Sequences, positions and atomic commits must hold for any batching of
//! commands.

use std::collections::HashMap;

use cim_iam_command::events::group::{add_group_name_unique_constraint, GroupAdded};
use cim_iam_command::events::limits::LimitsSet;
use cim_iam_command::events::{Command, GroupEvent, LimitsEvent};
use cim_iam_command::{Aggregate, CommandContext, EventStore, InMemoryEventStore};
use proptest::prelude::*;

fn ctx() -> CommandContext {
    CommandContext::new("instance-1").with_user("property")
}

fn set_block(limits_id: usize, block: bool) -> Command {
    Command::new(
        Aggregate::limits(format!("limits-{limits_id}"), format!("instance-{limits_id}")),
        LimitsEvent::Set(LimitsSet {
            audit_log_retention: None,
            block: Some(block),
        }),
    )
}

fn add_group(group: usize, name: &str) -> Command {
    Command::new(
        Aggregate::group(format!("group-{group}"), "org-1", "instance-1"),
        GroupEvent::Added(GroupAdded {
            name: name.to_string(),
            description: String::new(),
        }),
    )
    .with_unique_constraint(add_group_name_unique_constraint("org-1", name))
}

/// Batches of (target, value) pairs, each batch one push
fn batches() -> impl Strategy<Value = Vec<Vec<(usize, bool)>>> {
    prop::collection::vec(
        prop::collection::vec((0usize..4, any::<bool>()), 1..6),
        1..10,
    )
}

proptest! {
    /// Property: Sequences are gapless per aggregate
    ///
    /// Whatever the batching, the n-th event of an aggregate carries
    /// sequence n and positions count up across the whole log.
    #[test]
    fn prop_sequences_are_gapless_per_aggregate(batches in batches()) {
        let store = InMemoryEventStore::new();
        let total: usize = batches.iter().map(Vec::len).sum();

        for batch in &batches {
            let commands = batch.iter().map(|(target, block)| set_block(*target, *block)).collect();
            let pushed = tokio_test::block_on(store.push(&ctx(), commands)).unwrap();
            prop_assert_eq!(pushed.len(), batch.len());
            let created_at = pushed[0].created_at;
            prop_assert!(pushed.iter().all(|event| event.created_at == created_at));
        }

        let events = tokio_test::block_on(store.events());
        prop_assert_eq!(events.len(), total);

        let mut seen: HashMap<String, u64> = HashMap::new();
        for (index, event) in events.iter().enumerate() {
            prop_assert_eq!(event.position, index as u64 + 1);
            let count = seen.entry(event.aggregate_id().to_string()).or_insert(0);
            *count += 1;
            prop_assert_eq!(event.sequence, *count);
        }
        for (limits_id, count) in &seen {
            let instance_id = limits_id.replace("limits", "instance");
            let aggregate = Aggregate::limits(limits_id.as_str(), instance_id);
            prop_assert_eq!(tokio_test::block_on(store.sequence(&aggregate)), *count);
        }
    }

    /// Property: A rejected push commits nothing
    ///
    /// A batch that takes a group name twice fails as a whole, and the log
    /// is left exactly as it was.
    #[test]
    fn prop_rejected_push_is_atomic(batch in prop::collection::vec((0usize..4, any::<bool>()), 0..6), name in "[a-z]{1,8}") {
        let store = InMemoryEventStore::new();
        tokio_test::block_on(store.push(&ctx(), vec![set_block(9, true)])).unwrap();

        let mut commands: Vec<Command> =
            batch.iter().map(|(target, block)| set_block(*target, *block)).collect();
        commands.push(add_group(1, &name));
        commands.push(add_group(2, &name.to_uppercase()));

        let err = tokio_test::block_on(store.push(&ctx(), commands)).unwrap_err();
        let is_unique_violation = matches!(
            err,
            cim_iam_command::errors::EventStoreError::UniqueConstraint { .. }
        );
        prop_assert!(is_unique_violation);
        prop_assert_eq!(tokio_test::block_on(store.len()), 1);

        // the name was not reserved by the failed push
        let pushed = tokio_test::block_on(store.push(&ctx(), vec![add_group(3, &name)]));
        prop_assert!(pushed.is_ok());
    }
}
