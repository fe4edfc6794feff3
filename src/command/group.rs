// Copyright (c) 2025 - Cowboy AI, Inc.
//! Groups of an organization

use tracing::{info, instrument};

use super::Commands;
use crate::aggregate::AggregateType;
use crate::context::CommandContext;
use crate::domain::normalize_name;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::group::{
    add_group_name_unique_constraint, remove_group_name_unique_constraint, GroupAdded,
    GroupRemoved,
};
use crate::events::{Command, GroupEvent};
use crate::permission::{PERMISSION_GROUP_DELETE, PERMISSION_GROUP_WRITE};
use crate::write_model::group::GroupWriteModel;
use crate::write_model::org::OrgWriteModel;
use crate::write_model::resource_owner::resource_owner_of;
use crate::write_model::{append_and_reduce, ObjectDetails};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedGroup {
    pub id: String,
    pub details: ObjectDetails,
}

impl Commands {
    /// Add a group to an active organization
    ///
    /// `group_id` is generated when not given.
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn add_group(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        group_id: Option<&str>,
        name: &str,
        description: &str,
    ) -> CommandResult<AddedGroup> {
        let name =
            normalize_name(name).ok_or_else(|| CommandError::invalid_argument("group name is empty"))?;
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }

        let mut org = OrgWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut org).await?;
        if !org.state.is_active() {
            return Err(CommandError::precondition_failed("organization not found"));
        }

        let id = self.id_or_next(group_id)?;
        let mut model = GroupWriteModel::new(id.as_str(), org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists("group already exists"));
        }
        self.check_permission(ctx, PERMISSION_GROUP_WRITE, org_id, &id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            GroupEvent::Added(GroupAdded {
                name: name.clone(),
                description: description.trim().to_string(),
            }),
        )
        .with_unique_constraint(add_group_name_unique_constraint(org_id, &name));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!(group_id = %id, "group added");
        Ok(AddedGroup {
            id,
            details: model.base.object_details(),
        })
    }

    /// Change name and/or description
    ///
    /// `None` leaves a field untouched. Identical values are a
    /// `PreconditionFailed` and push nothing.
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), group_id = group_id))]
    pub async fn change_group(
        &self,
        ctx: &CommandContext,
        group_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> CommandResult<ObjectDetails> {
        if group_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("group id is empty"));
        }
        let name = match name {
            Some(name) => Some(
                normalize_name(name)
                    .ok_or_else(|| CommandError::invalid_argument("group name is empty"))?,
            ),
            None => None,
        };

        let mut model = self.group_write_model(ctx, group_id).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("group not found"));
        }
        let org_id = model.base.resource_owner.clone();
        self.check_permission(ctx, PERMISSION_GROUP_WRITE, &org_id, group_id)
            .await?;

        let changed = model
            .changes(name.as_deref(), description.map(str::trim))
            .ok_or_else(|| CommandError::precondition_failed("group not changed"))?;

        let mut command = Command::new(model.base.aggregate(), GroupEvent::Changed(changed.clone()))
            .with_expected_sequence(model.base.processed_sequence);
        if let Some(new_name) = &changed.name {
            command = command
                .with_unique_constraint(remove_group_name_unique_constraint(&org_id, &model.name))
                .with_unique_constraint(add_group_name_unique_constraint(&org_id, new_name));
        }

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("group changed");
        Ok(model.base.object_details())
    }

    /// Remove a group, succeeding silently when it does not exist
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), group_id = group_id))]
    pub async fn remove_group(
        &self,
        ctx: &CommandContext,
        group_id: &str,
    ) -> CommandResult<ObjectDetails> {
        if group_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("group id is empty"));
        }
        let mut model = match self.group_write_model(ctx, group_id).await {
            Ok(model) => model,
            Err(err) if err.is_not_found() => return Ok(ObjectDetails::default()),
            Err(err) => return Err(err),
        };
        if !model.state.exists() {
            return Ok(model.base.object_details());
        }
        let org_id = model.base.resource_owner.clone();
        self.check_permission(ctx, PERMISSION_GROUP_DELETE, &org_id, group_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            GroupEvent::Removed(GroupRemoved {
                name: model.name.clone(),
            }),
        )
        .with_unique_constraint(remove_group_name_unique_constraint(&org_id, &model.name));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("group removed");
        Ok(model.base.object_details())
    }

    /// Group model scoped to its owning organization
    async fn group_write_model(
        &self,
        ctx: &CommandContext,
        group_id: &str,
    ) -> CommandResult<GroupWriteModel> {
        let org_id = resource_owner_of(ctx, self.store(), AggregateType::Group, group_id).await?;
        let mut model = GroupWriteModel::new(group_id, org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        Ok(model)
    }
}
