// Copyright (c) 2025 - Cowboy AI, Inc.
//! Custom message texts
//!
//! Texts are set per template and language. Setting a text only pushes the
//! fields that differ, one event per field, and an identical text is a
//! silent success.

use tracing::{info, instrument};

use super::Commands;
use crate::aggregate::Aggregate;
use crate::context::CommandContext;
use crate::domain::{Language, MessageTemplate, MessageText};
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::text::CustomTextTemplateRemoved;
use crate::events::{Command, CustomTextEvent, IamEvent, InstanceEvent, OrgEvent};
use crate::permission::{PERMISSION_POLICY_DELETE, PERMISSION_POLICY_WRITE};
use crate::write_model::custom_text::CustomMessageTextWriteModel;
use crate::write_model::{append_and_reduce, ObjectDetails};

/// Desired texts of one template in one language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetMessageText {
    pub template: MessageTemplate,
    /// Language tag such as `de` or `en-US`
    pub language: String,
    pub text: MessageText,
}

fn parse_language(tag: &str) -> CommandResult<Language> {
    Language::new(tag).map_err(|err| CommandError::invalid_argument(err.to_string()))
}

fn text_commands(
    aggregate: &Aggregate,
    events: Vec<CustomTextEvent>,
    wrap: fn(CustomTextEvent) -> IamEvent,
) -> Vec<Command> {
    events
        .into_iter()
        .map(|event| Command::new(aggregate.clone(), wrap(event)))
        .collect()
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn set_org_message_text(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        text: SetMessageText,
    ) -> CommandResult<ObjectDetails> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        let language = parse_language(&text.language)?;

        let mut model =
            CustomMessageTextWriteModel::org(org_id, ctx.instance_id(), text.template, language);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        let changes = model.changes(&text.text);
        if changes.is_empty() {
            return Ok(model.base.object_details());
        }
        self.check_permission(ctx, PERMISSION_POLICY_WRITE, org_id, org_id)
            .await?;

        let commands = text_commands(&model.base.aggregate(), changes, |event| {
            OrgEvent::CustomText(event).into()
        });
        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        info!(template = ?text.template, fields = events.len(), "org message text set");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id()))]
    pub async fn set_default_message_text(
        &self,
        ctx: &CommandContext,
        text: SetMessageText,
    ) -> CommandResult<ObjectDetails> {
        let language = parse_language(&text.language)?;

        let mut model =
            CustomMessageTextWriteModel::instance(ctx.instance_id(), text.template, language);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        let changes = model.changes(&text.text);
        if changes.is_empty() {
            return Ok(model.base.object_details());
        }

        let commands = text_commands(&model.base.aggregate(), changes, |event| {
            InstanceEvent::CustomText(event).into()
        });
        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        info!(template = ?text.template, fields = events.len(), "default message text set");
        Ok(model.base.object_details())
    }

    /// Remove every custom text of one template and language
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn remove_org_message_texts(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        template: MessageTemplate,
        language: &str,
    ) -> CommandResult<ObjectDetails> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        let language = parse_language(language)?;

        let mut model =
            CustomMessageTextWriteModel::org(org_id, ctx.instance_id(), template, language.clone());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("custom message text not found"));
        }
        self.check_permission(ctx, PERMISSION_POLICY_DELETE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            OrgEvent::CustomText(CustomTextEvent::TemplateRemoved(CustomTextTemplateRemoved {
                template,
                language,
            })),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!(template = ?template, "org message texts removed");
        Ok(model.base.object_details())
    }
}
