// Copyright (c) 2025 - Cowboy AI, Inc.
//! Group Aggregate Events

use serde::{Deserialize, Serialize};

use super::UniqueConstraint;

pub const ADDED: &str = "group.added";
pub const CHANGED: &str = "group.changed";
pub const REMOVED: &str = "group.removed";

pub const UNIQUE_GROUP_NAME_TYPE: &str = "group_name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupEvent {
    Added(GroupAdded),
    Changed(GroupChanged),
    Removed(GroupRemoved),
}

impl GroupEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            GroupEvent::Added(_) => ADDED,
            GroupEvent::Changed(_) => CHANGED,
            GroupEvent::Removed(_) => REMOVED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAdded {
    pub name: String,
    pub description: String,
}

/// Only fields that changed are set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupChanged {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRemoved {
    pub name: String,
}

fn group_name_field(org_id: &str, name: &str) -> String {
    format!("{org_id}:{}", name.to_lowercase())
}

pub fn add_group_name_unique_constraint(org_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_GROUP_NAME_TYPE,
        group_name_field(org_id, name),
        "group name already taken",
    )
}

pub fn remove_group_name_unique_constraint(org_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_GROUP_NAME_TYPE, group_name_field(org_id, name))
}
