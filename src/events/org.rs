// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization Aggregate Events
//!
//! `org.removed` is the ancestor removal for everything the organization
//! owns: groups, projects, users, policies, members and identity providers.

use serde::{Deserialize, Serialize};

use super::{CustomTextEvent, LockoutPolicyEvent, MemberEvent, UniqueConstraint};
use crate::crypto::CryptoValue;

pub const ADDED: &str = "org.added";
pub const CHANGED: &str = "org.changed";
pub const DEACTIVATED: &str = "org.deactivated";
pub const REACTIVATED: &str = "org.reactivated";
pub const REMOVED: &str = "org.removed";
pub const LOCKOUT_POLICY_ADDED: &str = "org.policy.lockout.added";
pub const LOCKOUT_POLICY_CHANGED: &str = "org.policy.lockout.changed";
pub const LOCKOUT_POLICY_REMOVED: &str = "org.policy.lockout.removed";
pub const MEMBER_ADDED: &str = "org.member.added";
pub const MEMBER_CHANGED: &str = "org.member.changed";
pub const MEMBER_REMOVED: &str = "org.member.removed";
pub const MEMBER_CASCADE_REMOVED: &str = "org.member.cascade.removed";
pub const CUSTOM_TEXT_SET: &str = "org.customtext.set";
pub const CUSTOM_TEXT_REMOVED: &str = "org.customtext.removed";
pub const CUSTOM_TEXT_TEMPLATE_REMOVED: &str = "org.customtext.template.removed";
pub const OAUTH_IDP_ADDED: &str = "org.idp.oauth.added";
pub const OAUTH_IDP_CHANGED: &str = "org.idp.oauth.changed";
pub const IDP_REMOVED: &str = "org.idp.removed";

pub const UNIQUE_ORG_NAME_TYPE: &str = "org_name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrgEvent {
    Added(OrgAdded),
    Changed(OrgChanged),
    Deactivated,
    Reactivated,
    Removed(OrgRemoved),
    LockoutPolicy(LockoutPolicyEvent),
    Member(MemberEvent),
    CustomText(CustomTextEvent),
    #[serde(rename = "oauth_idp_added")]
    OAuthIdpAdded(OAuthIdpAdded),
    #[serde(rename = "oauth_idp_changed")]
    OAuthIdpChanged(OAuthIdpChanged),
    IdpRemoved(IdpRemoved),
}

impl OrgEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrgEvent::Added(_) => ADDED,
            OrgEvent::Changed(_) => CHANGED,
            OrgEvent::Deactivated => DEACTIVATED,
            OrgEvent::Reactivated => REACTIVATED,
            OrgEvent::Removed(_) => REMOVED,
            OrgEvent::LockoutPolicy(e) => match e {
                LockoutPolicyEvent::Added(_) => LOCKOUT_POLICY_ADDED,
                LockoutPolicyEvent::Changed(_) => LOCKOUT_POLICY_CHANGED,
                LockoutPolicyEvent::Removed => LOCKOUT_POLICY_REMOVED,
            },
            OrgEvent::Member(e) => match e {
                MemberEvent::Added(_) => MEMBER_ADDED,
                MemberEvent::Changed(_) => MEMBER_CHANGED,
                MemberEvent::Removed(_) => MEMBER_REMOVED,
                MemberEvent::CascadeRemoved(_) => MEMBER_CASCADE_REMOVED,
            },
            OrgEvent::CustomText(e) => match e {
                CustomTextEvent::Set(_) => CUSTOM_TEXT_SET,
                CustomTextEvent::Removed(_) => CUSTOM_TEXT_REMOVED,
                CustomTextEvent::TemplateRemoved(_) => CUSTOM_TEXT_TEMPLATE_REMOVED,
            },
            OrgEvent::OAuthIdpAdded(_) => OAUTH_IDP_ADDED,
            OrgEvent::OAuthIdpChanged(_) => OAUTH_IDP_CHANGED,
            OrgEvent::IdpRemoved(_) => IDP_REMOVED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAdded {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgChanged {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRemoved {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthIdpAdded {
    pub idp_id: String,
    pub name: String,
    pub client_id: String,
    pub client_secret: CryptoValue,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_endpoint: String,
    pub scopes: Vec<String>,
    pub id_attribute: String,
}

/// Only fields that changed are set
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OAuthIdpChanged {
    pub idp_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<CryptoValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_attribute: Option<String>,
}

impl OAuthIdpChanged {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.client_id.is_none()
            && self.client_secret.is_none()
            && self.authorization_endpoint.is_none()
            && self.token_endpoint.is_none()
            && self.user_endpoint.is_none()
            && self.scopes.is_none()
            && self.id_attribute.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdpRemoved {
    pub idp_id: String,
}

pub fn add_org_name_unique_constraint(name: &str) -> UniqueConstraint {
    UniqueConstraint::add(
        UNIQUE_ORG_NAME_TYPE,
        name.to_lowercase(),
        "organization name already taken",
    )
}

pub fn remove_org_name_unique_constraint(name: &str) -> UniqueConstraint {
    UniqueConstraint::remove(UNIQUE_ORG_NAME_TYPE, name.to_lowercase())
}
