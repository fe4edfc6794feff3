// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance setup and removal

use tracing::{info, instrument};

use super::Commands;
use crate::aggregate::Aggregate;
use crate::context::CommandContext;
use crate::domain::{normalize_name, LockoutPolicy, MilestoneType, ObjectState};
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::instance::{InstanceAdded, InstanceRemoved};
use crate::events::{Command, InstanceEvent, LockoutPolicyEvent, UniqueConstraint};
use crate::permission::PERMISSION_INSTANCE_WRITE;
use crate::write_model::instance::InstanceWriteModel;
use crate::write_model::{append_and_reduce, ObjectDetails};

/// Initial state of a new instance
#[derive(Debug, Clone, Default)]
pub struct SetupInstance {
    pub name: String,
    /// Default lockout policy added together with the instance
    pub lockout_policy: Option<LockoutPolicy>,
}

impl Commands {
    /// Create the context's instance
    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn setup_instance(
        &self,
        ctx: &CommandContext,
        setup: SetupInstance,
    ) -> CommandResult<ObjectDetails> {
        let name = normalize_name(&setup.name)
            .ok_or_else(|| CommandError::invalid_argument("instance name is empty"))?;

        let mut model = InstanceWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists("instance already exists"));
        }
        if model.state == ObjectState::Removed {
            return Err(CommandError::precondition_failed("instance was removed"));
        }

        let aggregate = Aggregate::instance(ctx.instance_id());
        let mut commands = vec![Command::new(
            aggregate.clone(),
            InstanceEvent::Added(InstanceAdded { name }),
        )];
        if let Some(policy) = setup.lockout_policy {
            commands.push(Command::new(
                aggregate,
                InstanceEvent::LockoutPolicy(LockoutPolicyEvent::Added(policy.into())),
            ));
        }
        let milestone = self
            .pending_milestone(ctx, MilestoneType::InstanceCreated)
            .await?;
        if let Some(pending) = &milestone {
            commands.push(pending.command.clone());
        }

        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        if let Some(pending) = milestone {
            self.milestones_pushed(pending.reached).await;
        }
        info!(sequence = model.base.processed_sequence, "instance set up");
        Ok(model.base.object_details())
    }

    /// Remove the context's instance and release all its unique values
    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn remove_instance(&self, ctx: &CommandContext) -> CommandResult<ObjectDetails> {
        let mut model = InstanceWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("instance not found"));
        }
        self.check_permission(
            ctx,
            PERMISSION_INSTANCE_WRITE,
            ctx.instance_id(),
            ctx.instance_id(),
        )
        .await?;

        let mut commands = vec![Command::new(
            Aggregate::instance(ctx.instance_id()),
            InstanceEvent::Removed(InstanceRemoved {
                name: model.name.clone(),
            }),
        )
        .with_unique_constraint(UniqueConstraint::instance_remove())];
        let milestone = self
            .pending_milestone(ctx, MilestoneType::InstanceDeleted)
            .await?;
        if let Some(pending) = &milestone {
            commands.push(pending.command.clone());
        }

        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        if let Some(pending) = milestone {
            self.milestones_pushed(pending.reached).await;
        }
        info!("instance removed");
        Ok(model.base.object_details())
    }
}
