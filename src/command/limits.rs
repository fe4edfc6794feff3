// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance limits
//!
//! Setting limits is idempotent: values that already hold push nothing.
//! The bulk variant reads every targeted instance with one query and
//! commits all resulting commands with one push.
//!
//! ```text
//! requests ─validate─→ LimitsBulkWriteModel ─per target─→ changes? ─→ commands
//!                                                                        │
//!                 per target results ←── fold pushed events ←── one push ┘
//! ```

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{info, instrument};

use super::Commands;
use crate::aggregate::Aggregate;
use crate::context::CommandContext;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::limits::LimitsSet;
use crate::events::{Command, LimitsEvent};
use crate::write_model::limits::LimitsWriteModel;
use crate::write_model::{append_and_reduce, pushed_events_to_object_details, ObjectDetails};

/// Limits to apply, `None` leaves a limit untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetLimits {
    pub audit_log_retention: Option<Duration>,
    pub block: Option<bool>,
}

impl SetLimits {
    fn validate(&self) -> CommandResult<()> {
        if self.audit_log_retention.is_none() && self.block.is_none() {
            return Err(CommandError::invalid_argument("no limits specified"));
        }
        Ok(())
    }

    fn as_event(&self) -> LimitsSet {
        LimitsSet {
            audit_log_retention: self.audit_log_retention,
            block: self.block,
        }
    }
}

/// Outcome of a bulk set
#[derive(Debug)]
pub struct BulkLimitsResult {
    /// Details of the last pushed event, `None` when nothing was pushed
    pub details: Option<ObjectDetails>,
    /// One entry per request, in request order
    pub targets: Vec<(String, CommandResult<ObjectDetails>)>,
}

impl Commands {
    /// Set limits of the context's instance
    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn set_limits(
        &self,
        ctx: &CommandContext,
        limits: SetLimits,
    ) -> CommandResult<ObjectDetails> {
        limits.validate()?;

        let mut model = LimitsWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        let Some(command) = self.set_limits_command(&model, &limits)? else {
            return Ok(model.base.object_details());
        };

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("limits set");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn reset_limits(&self, ctx: &CommandContext) -> CommandResult<ObjectDetails> {
        let mut model = LimitsWriteModel::new(ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.is_set() {
            return Err(CommandError::not_found("limits not found"));
        }

        let command = Command::new(model.base.aggregate(), LimitsEvent::Reset);
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("limits reset");
        Ok(model.base.object_details())
    }

    /// Set limits of many instances at once
    ///
    /// Invalid requests fail on their own without blocking the others. The
    /// push itself is all or nothing: a rejected push fails the whole call.
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), targets = requests.len()))]
    pub async fn set_instance_limits_bulk(
        &self,
        ctx: &CommandContext,
        requests: Vec<(String, SetLimits)>,
    ) -> CommandResult<BulkLimitsResult> {
        let mut seen = BTreeSet::new();
        let checked: Vec<(String, CommandResult<SetLimits>)> = requests
            .into_iter()
            .map(|(instance_id, limits)| {
                let instance_id = instance_id.trim().to_string();
                let valid = if instance_id.is_empty() {
                    Err(CommandError::invalid_argument("instance id is empty"))
                } else if !seen.insert(instance_id.clone()) {
                    Err(CommandError::invalid_argument("instance requested twice"))
                } else {
                    limits.validate().map(|()| limits)
                };
                (instance_id, valid)
            })
            .collect();

        let mut bulk = LimitsWriteModel::bulk(
            checked
                .iter()
                .filter(|(_, valid)| valid.is_ok())
                .map(|(instance_id, _)| instance_id.clone()),
        );
        if !bulk.is_empty() {
            filter_to_query_reducer(ctx, self.store(), &mut bulk).await?;
        }
        let mut models = bulk.into_models();

        let mut commands = Vec::new();
        // target index → index of its command
        let mut command_of = Vec::with_capacity(checked.len());
        for (instance_id, valid) in &checked {
            let slot = match (valid, models.get(instance_id)) {
                (Ok(limits), Some(model)) => self
                    .set_limits_command(model, limits)?
                    .map(|command| {
                        commands.push(command);
                        commands.len() - 1
                    }),
                _ => None,
            };
            command_of.push(slot);
        }

        let events = self.push(ctx, commands).await?;

        let mut targets = Vec::with_capacity(checked.len());
        for ((instance_id, valid), slot) in checked.into_iter().zip(command_of) {
            let result = match valid {
                Err(err) => Err(err),
                Ok(_) => match models.get_mut(&instance_id) {
                    Some(model) => {
                        if let Some(event) = slot.and_then(|index| events.get(index)) {
                            append_and_reduce(model, std::slice::from_ref(event))?;
                        }
                        Ok(model.base.object_details())
                    }
                    None => Err(CommandError::Internal(format!(
                        "no limits model for instance {instance_id}"
                    ))),
                },
            };
            targets.push((instance_id, result));
        }

        info!(pushed = events.len(), "bulk limits set");
        Ok(BulkLimitsResult {
            details: pushed_events_to_object_details(&events),
            targets,
        })
    }

    /// Command for the changed values, adopting or generating the limits id
    fn set_limits_command(
        &self,
        model: &LimitsWriteModel,
        limits: &SetLimits,
    ) -> CommandResult<Option<Command>> {
        let Some(changed) = model.changes(&limits.as_event()) else {
            return Ok(None);
        };
        let limits_id = if model.base.aggregate_id.is_empty() {
            self.next_id()?
        } else {
            model.base.aggregate_id.clone()
        };
        Ok(Some(Command::new(
            Aggregate::limits(limits_id, model.base.instance_id.as_str()),
            LimitsEvent::Set(changed),
        )))
    }
}
