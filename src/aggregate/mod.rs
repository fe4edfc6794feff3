// Copyright (c) 2025 - Cowboy AI, Inc.
//! Aggregate References
//!
//! An aggregate is the identity and consistency unit of the event log. All
//! events under one aggregate id are totally ordered by their sequence.
//!
//! ```text
//! Instance ── Org ── Group
//!    │         ├──── Project ── Application
//!    │         └──── User
//!    ├──── Limits
//!    └──── Milestone
//! ```
//!
//! The resource owner partitions aggregates by organization. Instance level
//! aggregates are owned by the instance itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current schema version of every aggregate type
pub const AGGREGATE_VERSION: u32 = 1;

/// Kinds of aggregates in the IAM write side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateType {
    Instance,
    Org,
    Group,
    Project,
    User,
    Limits,
    Milestone,
}

impl AggregateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateType::Instance => "instance",
            AggregateType::Org => "org",
            AggregateType::Group => "group",
            AggregateType::Project => "project",
            AggregateType::User => "user",
            AggregateType::Limits => "limits",
            AggregateType::Milestone => "milestone",
        }
    }
}

impl fmt::Display for AggregateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity tuple of an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregate {
    /// Aggregate type
    pub aggregate_type: AggregateType,

    /// Aggregate id, permanent
    pub id: String,

    /// Owning organization (or instance for instance level aggregates)
    pub resource_owner: String,

    /// Owning instance
    pub instance_id: String,

    /// Schema version of the aggregate type
    pub version: u32,
}

impl Aggregate {
    pub fn new(
        aggregate_type: AggregateType,
        id: impl Into<String>,
        resource_owner: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_type,
            id: id.into(),
            resource_owner: resource_owner.into(),
            instance_id: instance_id.into(),
            version: AGGREGATE_VERSION,
        }
    }

    /// The instance aggregate owns itself
    pub fn instance(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self::new(
            AggregateType::Instance,
            instance_id.clone(),
            instance_id.clone(),
            instance_id,
        )
    }

    /// An organization owns itself
    pub fn org(org_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let org_id = org_id.into();
        Self::new(AggregateType::Org, org_id.clone(), org_id, instance_id)
    }

    pub fn group(
        group_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self::new(AggregateType::Group, group_id, org_id, instance_id)
    }

    pub fn project(
        project_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self::new(AggregateType::Project, project_id, org_id, instance_id)
    }

    pub fn user(
        user_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self::new(AggregateType::User, user_id, org_id, instance_id)
    }

    /// Limits are owned by the instance they restrict
    pub fn limits(limits_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self::new(
            AggregateType::Limits,
            limits_id,
            instance_id.clone(),
            instance_id,
        )
    }

    /// One milestone aggregate per instance, keyed by the instance id
    pub fn milestone(instance_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self::new(
            AggregateType::Milestone,
            instance_id.clone(),
            instance_id.clone(),
            instance_id,
        )
    }
}
