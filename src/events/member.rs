// Copyright (c) 2025 - Cowboy AI, Inc.
//! Membership payloads, shared by instance and org members

use serde::{Deserialize, Serialize};

use super::UniqueConstraint;

pub const UNIQUE_MEMBER_TYPE: &str = "member";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberEvent {
    Added(MemberAdded),
    Changed(MemberChanged),
    Removed(MemberRemoved),
    /// Membership dropped because the user was removed
    CascadeRemoved(MemberRemoved),
}

impl MemberEvent {
    pub fn user_id(&self) -> &str {
        match self {
            MemberEvent::Added(e) => &e.user_id,
            MemberEvent::Changed(e) => &e.user_id,
            MemberEvent::Removed(e) | MemberEvent::CascadeRemoved(e) => &e.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAdded {
    pub user_id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberChanged {
    pub user_id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRemoved {
    pub user_id: String,
}

fn member_field(aggregate_id: &str, user_id: &str) -> String {
    format!("{aggregate_id}:{user_id}")
}

pub fn add_member_unique_constraint(aggregate_id: &str, user_id: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_MEMBER_TYPE,
        member_field(aggregate_id, user_id),
        "member already exists",
    )
}

pub fn remove_member_unique_constraint(aggregate_id: &str, user_id: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_MEMBER_TYPE, member_field(aggregate_id, user_id))
}
