// Copyright (c) 2025 - Cowboy AI, Inc.
//! Custom message text write model
//!
//! Scoped to one template in one language. The query is broad on purpose:
//! every custom text event of the aggregate is returned and sibling
//! templates or languages are skipped in `append_events`.

use crate::aggregate::AggregateType;
use crate::domain::{Language, MessageTemplate, MessageText, MessageTextKey, ObjectState};
use crate::errors::CommandResult;
use crate::events::text::{CustomTextRemoved, CustomTextSet};
use crate::events::{instance, org, CustomTextEvent, Event};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomMessageTextWriteModel {
    pub base: WriteModel,
    pub template: MessageTemplate,
    pub language: Language,
    pub text: MessageText,
    pub state: ObjectState,
}

impl CustomMessageTextWriteModel {
    /// Texts of an organization
    pub fn org(
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
        template: MessageTemplate,
        language: Language,
    ) -> Self {
        let org_id = org_id.into();
        Self::new(AggregateType::Org, org_id.clone(), org_id, instance_id, template, language)
    }

    /// Default texts of an instance
    pub fn instance(
        instance_id: impl Into<String>,
        template: MessageTemplate,
        language: Language,
    ) -> Self {
        let instance_id = instance_id.into();
        Self::new(
            AggregateType::Instance,
            instance_id.clone(),
            instance_id.clone(),
            instance_id,
            template,
            language,
        )
    }

    fn new(
        aggregate_type: AggregateType,
        aggregate_id: String,
        resource_owner: String,
        instance_id: impl Into<String>,
        template: MessageTemplate,
        language: Language,
    ) -> Self {
        Self {
            base: WriteModel::new(aggregate_type, aggregate_id, resource_owner, instance_id),
            template,
            language,
            text: MessageText::default(),
            state: ObjectState::Unspecified,
        }
    }

    fn holder_removed(&self, event: &Event) -> bool {
        let removed = match self.base.aggregate_type {
            AggregateType::Org => event.payload.is_org_removed(),
            _ => event.payload.is_instance_removed(),
        };
        removed && event.aggregate_id() == self.base.aggregate_id
    }

    /// One set or removed event per field that differs from `desired`
    pub fn changes(&self, desired: &MessageText) -> Vec<CustomTextEvent> {
        MessageTextKey::ALL
            .iter()
            .filter(|key| self.text.get(**key) != desired.get(**key))
            .map(|key| {
                let value = desired.get(*key);
                if value.is_empty() {
                    CustomTextEvent::Removed(CustomTextRemoved {
                        template: self.template,
                        key: *key,
                        language: self.language.clone(),
                    })
                } else {
                    CustomTextEvent::Set(CustomTextSet {
                        template: self.template,
                        key: *key,
                        language: self.language.clone(),
                        text: value.to_string(),
                    })
                }
            })
            .collect()
    }

    fn void(&mut self) {
        self.text = MessageText::default();
        self.state = ObjectState::Removed;
    }
}

impl QueryReducer for CustomMessageTextWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        let event_types = match self.base.aggregate_type {
            AggregateType::Org => [
                org::CUSTOM_TEXT_SET,
                org::CUSTOM_TEXT_REMOVED,
                org::CUSTOM_TEXT_TEMPLATE_REMOVED,
                org::REMOVED,
            ],
            _ => [
                instance::CUSTOM_TEXT_SET,
                instance::CUSTOM_TEXT_REMOVED,
                instance::CUSTOM_TEXT_TEMPLATE_REMOVED,
                instance::REMOVED,
            ],
        };
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([self.base.aggregate_type])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types(event_types)
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if self.holder_removed(event) {
                self.base.append(event);
                continue;
            }
            let Some(text) = event.payload.custom_text() else {
                continue;
            };
            if event.aggregate_id() == self.base.aggregate_id
                && text.template() == self.template
                && *text.language() == self.language
            {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match event.payload.custom_text() {
                Some(CustomTextEvent::Set(e)) => self.text.set(e.key, e.text.clone()),
                Some(CustomTextEvent::Removed(e)) => self.text.set(e.key, ""),
                Some(CustomTextEvent::TemplateRemoved(_)) | None => {
                    self.void();
                    continue;
                }
            }
            self.state = if self.text.is_empty() {
                ObjectState::Removed
            } else {
                ObjectState::Active
            };
        }
        self.base.reduce_events(&events)
    }
}
