// Copyright (c) 2025 - Cowboy AI, Inc.
//! Lockout policies: the instance default and per organization overrides

use tracing::{info, instrument};

use super::Commands;
use crate::context::CommandContext;
use crate::domain::LockoutPolicy;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::{Command, InstanceEvent, LockoutPolicyEvent, OrgEvent};
use crate::permission::{PERMISSION_POLICY_DELETE, PERMISSION_POLICY_WRITE};
use crate::write_model::lockout_policy::{
    InstanceLockoutPolicyWriteModel, OrgLockoutPolicyWriteModel,
};
use crate::write_model::{append_and_reduce, ObjectDetails};

fn require_org_id(org_id: &str) -> CommandResult<()> {
    if org_id.trim().is_empty() {
        return Err(CommandError::invalid_argument("organization id is empty"));
    }
    Ok(())
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn add_default_lockout_policy(
        &self,
        ctx: &CommandContext,
        policy: LockoutPolicy,
    ) -> CommandResult<ObjectDetails> {
        let mut model = InstanceLockoutPolicyWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.policy.state.is_active() {
            return Err(CommandError::already_exists("default lockout policy already exists"));
        }

        let command = Command::new(
            model.policy.base.aggregate(),
            InstanceEvent::LockoutPolicy(LockoutPolicyEvent::Added(policy.into())),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("default lockout policy added");
        Ok(model.policy.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn change_default_lockout_policy(
        &self,
        ctx: &CommandContext,
        policy: LockoutPolicy,
    ) -> CommandResult<ObjectDetails> {
        let mut model = InstanceLockoutPolicyWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.policy.state.is_active() {
            return Err(CommandError::not_found("default lockout policy not found"));
        }
        let changed = model
            .policy
            .changes(&policy)
            .ok_or_else(|| CommandError::precondition_failed("lockout policy not changed"))?;

        let command = Command::new(
            model.policy.base.aggregate(),
            InstanceEvent::LockoutPolicy(LockoutPolicyEvent::Changed(changed)),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("default lockout policy changed");
        Ok(model.policy.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn add_org_lockout_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        policy: LockoutPolicy,
    ) -> CommandResult<ObjectDetails> {
        require_org_id(org_id)?;

        let mut model = OrgLockoutPolicyWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.policy.state.is_active() {
            return Err(CommandError::already_exists("lockout policy already exists"));
        }
        self.check_permission(ctx, PERMISSION_POLICY_WRITE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.policy.base.aggregate(),
            OrgEvent::LockoutPolicy(LockoutPolicyEvent::Added(policy.into())),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("org lockout policy added");
        Ok(model.policy.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn change_org_lockout_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        policy: LockoutPolicy,
    ) -> CommandResult<ObjectDetails> {
        require_org_id(org_id)?;

        let mut model = OrgLockoutPolicyWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.policy.state.is_active() {
            return Err(CommandError::not_found("lockout policy not found"));
        }
        let changed = model
            .policy
            .changes(&policy)
            .ok_or_else(|| CommandError::precondition_failed("lockout policy not changed"))?;
        self.check_permission(ctx, PERMISSION_POLICY_WRITE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.policy.base.aggregate(),
            OrgEvent::LockoutPolicy(LockoutPolicyEvent::Changed(changed)),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("org lockout policy changed");
        Ok(model.policy.base.object_details())
    }

    /// Drop the override, the organization falls back to the default
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn remove_org_lockout_policy(
        &self,
        ctx: &CommandContext,
        org_id: &str,
    ) -> CommandResult<ObjectDetails> {
        require_org_id(org_id)?;

        let mut model = OrgLockoutPolicyWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.policy.state.is_active() {
            return Err(CommandError::not_found("lockout policy not found"));
        }
        self.check_permission(ctx, PERMISSION_POLICY_DELETE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.policy.base.aggregate(),
            OrgEvent::LockoutPolicy(LockoutPolicyEvent::Removed),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("org lockout policy removed");
        Ok(model.policy.base.object_details())
    }
}
