// Copyright (c) 2025 - Cowboy AI, Inc.
//! Custom message text payloads
//!
//! One event per text field. A template/language pair is the discriminator:
//! events for other templates or languages share the aggregate id but must
//! be ignored by a model scoped to one pair.

use serde::{Deserialize, Serialize};

use crate::domain::{Language, MessageTemplate, MessageTextKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomTextEvent {
    Set(CustomTextSet),
    Removed(CustomTextRemoved),
    /// All texts of one template in one language removed
    TemplateRemoved(CustomTextTemplateRemoved),
}

impl CustomTextEvent {
    pub fn template(&self) -> MessageTemplate {
        match self {
            CustomTextEvent::Set(e) => e.template,
            CustomTextEvent::Removed(e) => e.template,
            CustomTextEvent::TemplateRemoved(e) => e.template,
        }
    }

    pub fn language(&self) -> &Language {
        match self {
            CustomTextEvent::Set(e) => &e.language,
            CustomTextEvent::Removed(e) => &e.language,
            CustomTextEvent::TemplateRemoved(e) => &e.language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTextSet {
    pub template: MessageTemplate,
    pub key: MessageTextKey,
    pub language: Language,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTextRemoved {
    pub template: MessageTemplate,
    pub key: MessageTextKey,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTextTemplateRemoved {
    pub template: MessageTemplate,
    pub language: Language,
}
