// Copyright (c) 2025 - Cowboy AI, Inc.
//! Project Aggregate Events
//!
//! Applications live inside the project aggregate and are discriminated by
//! `app_id`. `project.removed` voids every application of the project.

use serde::{Deserialize, Serialize};

use super::UniqueConstraint;
use crate::domain::ApiAuthMethod;

pub const ADDED: &str = "project.added";
pub const REMOVED: &str = "project.removed";
pub const APPLICATION_ADDED: &str = "project.application.added";
pub const APPLICATION_REMOVED: &str = "project.application.removed";
pub const API_CONFIG_ADDED: &str = "project.application.config.api.added";
pub const API_CONFIG_SECRET_CHANGED: &str = "project.application.config.api.secret.changed";
pub const API_SECRET_CHECK_SUCCEEDED: &str = "project.application.config.api.secret.check.succeeded";
pub const API_SECRET_CHECK_FAILED: &str = "project.application.config.api.secret.check.failed";

pub const UNIQUE_PROJECT_NAME_TYPE: &str = "project_name";
pub const UNIQUE_CLIENT_ID_TYPE: &str = "client_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectEvent {
    Added(ProjectAdded),
    Removed(ProjectRemoved),
    ApplicationAdded(ApplicationAdded),
    ApplicationRemoved(ApplicationRemoved),
    ApiConfigAdded(ApiConfigAdded),
    ApiConfigSecretChanged(ApiConfigSecretChanged),
    ApiSecretCheckSucceeded(ApiSecretCheck),
    ApiSecretCheckFailed(ApiSecretCheck),
}

impl ProjectEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ProjectEvent::Added(_) => ADDED,
            ProjectEvent::Removed(_) => REMOVED,
            ProjectEvent::ApplicationAdded(_) => APPLICATION_ADDED,
            ProjectEvent::ApplicationRemoved(_) => APPLICATION_REMOVED,
            ProjectEvent::ApiConfigAdded(_) => API_CONFIG_ADDED,
            ProjectEvent::ApiConfigSecretChanged(_) => API_CONFIG_SECRET_CHANGED,
            ProjectEvent::ApiSecretCheckSucceeded(_) => API_SECRET_CHECK_SUCCEEDED,
            ProjectEvent::ApiSecretCheckFailed(_) => API_SECRET_CHECK_FAILED,
        }
    }

    /// Application the event is scoped to, if any
    pub fn app_id(&self) -> Option<&str> {
        match self {
            ProjectEvent::Added(_) | ProjectEvent::Removed(_) => None,
            ProjectEvent::ApplicationAdded(e) => Some(&e.app_id),
            ProjectEvent::ApplicationRemoved(e) => Some(&e.app_id),
            ProjectEvent::ApiConfigAdded(e) => Some(&e.app_id),
            ProjectEvent::ApiConfigSecretChanged(e) => Some(&e.app_id),
            ProjectEvent::ApiSecretCheckSucceeded(e) | ProjectEvent::ApiSecretCheckFailed(e) => {
                Some(&e.app_id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAdded {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRemoved {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationAdded {
    pub app_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRemoved {
    pub app_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfigAdded {
    pub app_id: String,
    pub client_id: String,
    /// Absent for key based authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashed_secret: Option<String>,
    pub auth_method: ApiAuthMethod,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfigSecretChanged {
    pub app_id: String,
    pub hashed_secret: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSecretCheck {
    pub app_id: String,
}

fn project_name_field(org_id: &str, name: &str) -> String {
    format!("{org_id}:{}", name.to_lowercase())
}

pub fn add_project_name_unique_constraint(org_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_PROJECT_NAME_TYPE,
        project_name_field(org_id, name),
        "project name already taken",
    )
}

pub fn remove_project_name_unique_constraint(org_id: &str, name: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_PROJECT_NAME_TYPE, project_name_field(org_id, name))
}

pub fn add_client_id_unique_constraint(client_id: &str) -> UniqueConstraint {
    UniqueConstraint::add(UNIQUE_CLIENT_ID_TYPE, client_id, "client id already taken")
}
