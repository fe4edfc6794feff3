// Copyright (c) 2025 - Cowboy AI, Inc.
//! Permission Check
//!
//! Authorization policies are evaluated elsewhere; commands only call back
//! with what they are about to touch.

use std::future::Future;

use async_trait::async_trait;

use crate::context::CommandContext;
use crate::errors::CommandResult;

pub const PERMISSION_ORG_WRITE: &str = "org.write";
pub const PERMISSION_ORG_DELETE: &str = "org.delete";
pub const PERMISSION_GROUP_WRITE: &str = "group.write";
pub const PERMISSION_GROUP_DELETE: &str = "group.delete";
pub const PERMISSION_POLICY_WRITE: &str = "policy.write";
pub const PERMISSION_POLICY_DELETE: &str = "policy.delete";
pub const PERMISSION_MEMBER_WRITE: &str = "member.write";
pub const PERMISSION_MEMBER_DELETE: &str = "member.delete";
pub const PERMISSION_IDP_WRITE: &str = "idp.write";
pub const PERMISSION_IDP_DELETE: &str = "idp.delete";
pub const PERMISSION_PROJECT_WRITE: &str = "project.write";
pub const PERMISSION_PROJECT_DELETE: &str = "project.delete";
pub const PERMISSION_USER_WRITE: &str = "user.write";
pub const PERMISSION_USER_DELETE: &str = "user.delete";
pub const PERMISSION_INSTANCE_WRITE: &str = "iam.write";

/// Authorization callback, `PermissionDenied` when the caller may not act
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionCheck: Send + Sync {
    async fn check(
        &self,
        ctx: &CommandContext,
        permission: &str,
        resource_owner: &str,
        aggregate_id: &str,
    ) -> CommandResult<()>;
}

/// Grants everything
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl PermissionCheck for AllowAll {
    async fn check(
        &self,
        _ctx: &CommandContext,
        _permission: &str,
        _resource_owner: &str,
        _aggregate_id: &str,
    ) -> CommandResult<()> {
        Ok(())
    }
}

/// Permission check backed by an async closure
pub struct PermissionCheckFn<F>(pub F);

#[async_trait]
impl<F, Fut> PermissionCheck for PermissionCheckFn<F>
where
    F: Fn(String, String, String) -> Fut + Send + Sync,
    Fut: Future<Output = CommandResult<()>> + Send,
{
    async fn check(
        &self,
        _ctx: &CommandContext,
        permission: &str,
        resource_owner: &str,
        aggregate_id: &str,
    ) -> CommandResult<()> {
        (self.0)(
            permission.to_string(),
            resource_owner.to_string(),
            aggregate_id.to_string(),
        )
        .await
    }
}
