// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization lifecycle
//!
//! `add_org` composes the organization with its initial admins through the
//! preparation pipeline: every admin step reads the organization from the
//! pending commands of the same call.

use async_trait::async_trait;
use tracing::{info, instrument};

use super::member::AddOrgMember;
use super::Commands;
use crate::aggregate::Aggregate;
use crate::context::CommandContext;
use crate::domain::{normalize_name, ObjectState};
use crate::errors::{CommandError, CommandResult};
use crate::event_store::{filter_to_query_reducer, Filter};
use crate::events::org::{
    add_org_name_unique_constraint, remove_org_name_unique_constraint, OrgAdded, OrgChanged,
    OrgRemoved,
};
use crate::events::{Command, OrgEvent};
use crate::permission::{PERMISSION_ORG_DELETE, PERMISSION_ORG_WRITE};
use crate::preparation::{prepare_commands, Preparation};
use crate::write_model::org::OrgWriteModel;
use crate::write_model::{append_and_reduce, pushed_events_to_object_details, ObjectDetails};

/// Role given to admins without explicit roles
pub const ORG_OWNER_ROLE: &str = "ORG_OWNER";

/// Existing user made member of the new organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgAdmin {
    pub user_id: String,
    /// Empty means [`ORG_OWNER_ROLE`]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AddOrg {
    /// Generated when empty
    pub org_id: Option<String>,
    pub name: String,
    pub admins: Vec<OrgAdmin>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedOrg {
    pub id: String,
    pub details: ObjectDetails,
}

struct AddOrgStep {
    org_id: String,
    name: String,
}

#[async_trait]
impl Preparation for AddOrgStep {
    fn validate(&mut self) -> CommandResult<()> {
        self.name = normalize_name(&self.name)
            .ok_or_else(|| CommandError::invalid_argument("organization name is empty"))?;
        Ok(())
    }

    async fn create_commands(
        &self,
        ctx: &CommandContext,
        filter: &dyn Filter,
    ) -> CommandResult<Vec<Command>> {
        let mut model = OrgWriteModel::new(self.org_id.as_str(), ctx.instance_id());
        filter_to_query_reducer(ctx, filter, &mut model).await?;
        if model.state != ObjectState::Unspecified {
            return Err(CommandError::already_exists("organization already exists"));
        }
        Ok(vec![Command::new(
            Aggregate::org(self.org_id.as_str(), ctx.instance_id()),
            OrgEvent::Added(OrgAdded {
                name: self.name.clone(),
            }),
        )
        .with_unique_constraint(add_org_name_unique_constraint(&self.name))])
    }
}

impl Commands {
    /// Add an organization together with its initial admins
    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn add_org(&self, ctx: &CommandContext, org: AddOrg) -> CommandResult<AddedOrg> {
        let id = self.id_or_next(org.org_id.as_deref())?;

        let mut steps: Vec<Box<dyn Preparation>> = vec![Box::new(AddOrgStep {
            org_id: id.clone(),
            name: org.name,
        })];
        for admin in org.admins {
            let roles = if admin.roles.is_empty() {
                vec![ORG_OWNER_ROLE.to_string()]
            } else {
                admin.roles
            };
            steps.push(Box::new(AddOrgMember {
                org_id: id.clone(),
                user_id: admin.user_id,
                roles,
            }));
        }

        let commands = prepare_commands(ctx, self.store(), steps).await?;
        self.check_permission(ctx, PERMISSION_ORG_WRITE, &id, &id)
            .await?;

        let events = self.push(ctx, commands).await?;
        let details = pushed_events_to_object_details(&events)
            .ok_or_else(|| CommandError::Internal("log returned no events".to_string()))?;
        info!(org_id = %id, admins = events.len().saturating_sub(1), "organization added");
        Ok(AddedOrg { id, details })
    }

    /// Rename an organization, `PreconditionFailed` for the same name
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn change_org(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        name: &str,
    ) -> CommandResult<ObjectDetails> {
        let name = normalize_name(name)
            .ok_or_else(|| CommandError::invalid_argument("organization name is empty"))?;

        let mut model = self.existing_org(ctx, org_id).await?;
        if model.name == name {
            return Err(CommandError::precondition_failed("organization not changed"));
        }
        self.check_permission(ctx, PERMISSION_ORG_WRITE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            OrgEvent::Changed(OrgChanged { name: name.clone() }),
        )
        .with_unique_constraint(remove_org_name_unique_constraint(&model.name))
        .with_unique_constraint(add_org_name_unique_constraint(&name));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("organization changed");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn deactivate_org(
        &self,
        ctx: &CommandContext,
        org_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_org(ctx, org_id).await?;
        if model.state == ObjectState::Inactive {
            return Err(CommandError::precondition_failed("organization already inactive"));
        }
        self.check_permission(ctx, PERMISSION_ORG_WRITE, org_id, org_id)
            .await?;

        let events = self
            .push(ctx, vec![Command::new(model.base.aggregate(), OrgEvent::Deactivated)])
            .await?;
        append_and_reduce(&mut model, &events)?;
        info!("organization deactivated");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn reactivate_org(
        &self,
        ctx: &CommandContext,
        org_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_org(ctx, org_id).await?;
        if model.state == ObjectState::Active {
            return Err(CommandError::precondition_failed("organization already active"));
        }
        self.check_permission(ctx, PERMISSION_ORG_WRITE, org_id, org_id)
            .await?;

        let events = self
            .push(ctx, vec![Command::new(model.base.aggregate(), OrgEvent::Reactivated)])
            .await?;
        append_and_reduce(&mut model, &events)?;
        info!("organization reactivated");
        Ok(model.base.object_details())
    }

    /// Remove an organization; everything it owns reacts to `org.removed`
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn remove_org(
        &self,
        ctx: &CommandContext,
        org_id: &str,
    ) -> CommandResult<ObjectDetails> {
        let mut model = self.existing_org(ctx, org_id).await?;
        self.check_permission(ctx, PERMISSION_ORG_DELETE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            OrgEvent::Removed(OrgRemoved {
                name: model.name.clone(),
            }),
        )
        .with_unique_constraint(remove_org_name_unique_constraint(&model.name));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("organization removed");
        Ok(model.base.object_details())
    }

    /// Organization model, `NotFound` unless it exists
    async fn existing_org(&self, ctx: &CommandContext, org_id: &str) -> CommandResult<OrgWriteModel> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        let mut model = OrgWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("organization not found"));
        }
        Ok(model)
    }
}
