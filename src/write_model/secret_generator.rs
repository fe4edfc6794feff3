// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret generator configuration write model
//!
//! One config per purpose on the instance aggregate. Lookups fall back to a
//! caller-supplied default whenever no active config exists.

use crate::aggregate::AggregateType;
use crate::context::CommandContext;
use crate::crypto::GeneratorConfig;
use crate::domain::{ObjectState, SecretGeneratorType};
use crate::errors::CommandResult;
use crate::event_store::{filter_to_query_reducer, Filter};
use crate::events::{instance, Event, IamEvent, InstanceEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretGeneratorWriteModel {
    pub base: WriteModel,
    pub generator_type: SecretGeneratorType,
    pub config: Option<GeneratorConfig>,
    pub state: ObjectState,
}

impl SecretGeneratorWriteModel {
    pub fn new(instance_id: impl Into<String>, generator_type: SecretGeneratorType) -> Self {
        let instance_id = instance_id.into();
        Self {
            base: WriteModel::new(
                AggregateType::Instance,
                instance_id.clone(),
                instance_id.clone(),
                instance_id,
            ),
            generator_type,
            config: None,
            state: ObjectState::Unspecified,
        }
    }

    /// Active config, or `default` when none is set
    pub fn config_or(&self, default: &GeneratorConfig) -> GeneratorConfig {
        match (&self.config, self.state) {
            (Some(config), ObjectState::Active) => config.clone(),
            _ => default.clone(),
        }
    }
}

impl QueryReducer for SecretGeneratorWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Instance])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([
                instance::SECRET_GENERATOR_ADDED,
                instance::SECRET_GENERATOR_CHANGED,
                instance::SECRET_GENERATOR_REMOVED,
                instance::REMOVED,
            ])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if event.aggregate_id() != self.base.aggregate_id {
                continue;
            }
            let generator_type = match &event.payload {
                IamEvent::Instance(InstanceEvent::SecretGeneratorAdded(e)) => e.generator_type,
                IamEvent::Instance(InstanceEvent::SecretGeneratorChanged(e)) => e.generator_type,
                IamEvent::Instance(InstanceEvent::SecretGeneratorRemoved(e)) => e.generator_type,
                IamEvent::Instance(InstanceEvent::Removed(_)) => {
                    self.base.append(event);
                    continue;
                }
                _ => continue,
            };
            if generator_type == self.generator_type {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Instance(InstanceEvent::SecretGeneratorAdded(e)) => {
                    self.config = Some(e.config.clone());
                    self.state = ObjectState::Active;
                }
                IamEvent::Instance(InstanceEvent::SecretGeneratorChanged(e)) => {
                    if let Some(config) = self.config.as_mut() {
                        e.apply(config);
                    }
                }
                IamEvent::Instance(
                    InstanceEvent::SecretGeneratorRemoved(_) | InstanceEvent::Removed(_),
                ) => {
                    self.config = None;
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}

/// Resolve the generator config of a purpose, falling back to `default`
pub async fn secret_generator_config_with_default<F>(
    ctx: &CommandContext,
    filter: &F,
    generator_type: SecretGeneratorType,
    default: &GeneratorConfig,
) -> CommandResult<GeneratorConfig>
where
    F: Filter + ?Sized,
{
    let mut model = SecretGeneratorWriteModel::new(ctx.instance_id(), generator_type);
    filter_to_query_reducer(ctx, filter, &mut model).await?;
    Ok(model.config_or(default))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::aggregate::Aggregate;
    use crate::event_store::{EventStore, InMemoryEventStore};
    use crate::events::instance::{
        InstanceRemoved, SecretGeneratorAdded, SecretGeneratorChanged, SecretGeneratorRemoved,
    };
    use crate::events::Command;
    use crate::write_model::append_and_reduce;
    use crate::write_model::testing::event;
    use pretty_assertions::assert_eq;

    fn config(length: u32) -> GeneratorConfig {
        GeneratorConfig {
            length,
            expiry: Duration::from_secs(600),
            include_lower_letters: true,
            include_upper_letters: true,
            include_digits: true,
            include_symbols: false,
        }
    }

    fn added(generator_type: SecretGeneratorType, length: u32, seq: u64) -> Event {
        event(
            Aggregate::instance("i1"),
            InstanceEvent::SecretGeneratorAdded(SecretGeneratorAdded {
                generator_type,
                config: config(length),
            }),
            seq,
        )
    }

    #[test]
    fn test_other_purposes_are_ignored() {
        let mut model = SecretGeneratorWriteModel::new("i1", SecretGeneratorType::OtpSms);
        append_and_reduce(
            &mut model,
            &[
                added(SecretGeneratorType::OtpSms, 6, 1),
                added(SecretGeneratorType::AppSecret, 64, 2),
                event(
                    Aggregate::instance("i1"),
                    InstanceEvent::SecretGeneratorRemoved(SecretGeneratorRemoved {
                        generator_type: SecretGeneratorType::AppSecret,
                    }),
                    3,
                ),
            ],
        )
        .unwrap();

        assert!(model.state.is_active());
        assert_eq!(model.config, Some(config(6)));
        assert_eq!(model.base.processed_sequence, 1);
    }

    #[test]
    fn test_change_applies_only_set_fields() {
        let mut model = SecretGeneratorWriteModel::new("i1", SecretGeneratorType::OtpSms);
        let mut desired = config(6);
        desired.length = 8;
        let changed =
            SecretGeneratorChanged::diff(SecretGeneratorType::OtpSms, &config(6), &desired);

        append_and_reduce(
            &mut model,
            &[
                added(SecretGeneratorType::OtpSms, 6, 1),
                event(
                    Aggregate::instance("i1"),
                    InstanceEvent::SecretGeneratorChanged(changed.unwrap()),
                    2,
                ),
            ],
        )
        .unwrap();

        assert_eq!(model.config, Some(desired));
    }

    #[test]
    fn test_removed_and_missing_fall_back_to_default() {
        let default = config(12);

        let missing = SecretGeneratorWriteModel::new("i1", SecretGeneratorType::InitCode);
        assert_eq!(missing.config_or(&default), default);

        let mut removed = SecretGeneratorWriteModel::new("i1", SecretGeneratorType::InitCode);
        append_and_reduce(
            &mut removed,
            &[
                added(SecretGeneratorType::InitCode, 6, 1),
                event(
                    Aggregate::instance("i1"),
                    InstanceEvent::Removed(InstanceRemoved { name: "i".into() }),
                    2,
                ),
            ],
        )
        .unwrap();
        assert_eq!(removed.state, ObjectState::Removed);
        assert_eq!(removed.config_or(&default), default);
    }

    #[tokio::test]
    async fn test_config_with_default_reads_the_log() {
        let store = InMemoryEventStore::new();
        let ctx = CommandContext::new("i1");
        let default = config(12);

        let resolved = secret_generator_config_with_default(
            &ctx,
            &store,
            SecretGeneratorType::VerifyEmailCode,
            &default,
        )
        .await
        .unwrap();
        assert_eq!(resolved, default);

        store
            .push(
                &ctx,
                vec![Command::new(
                    Aggregate::instance("i1"),
                    InstanceEvent::SecretGeneratorAdded(SecretGeneratorAdded {
                        generator_type: SecretGeneratorType::VerifyEmailCode,
                        config: config(8),
                    }),
                )],
            )
            .await
            .unwrap();

        let resolved = secret_generator_config_with_default(
            &ctx,
            &store,
            SecretGeneratorType::VerifyEmailCode,
            &default,
        )
        .await
        .unwrap();
        assert_eq!(resolved, config(8));
    }
}
