// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret generator configs of an instance

use tracing::{info, instrument};

use super::Commands;
use crate::context::CommandContext;
use crate::crypto::GeneratorConfig;
use crate::domain::SecretGeneratorType;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::instance::{
    SecretGeneratorAdded, SecretGeneratorChanged, SecretGeneratorRemoved,
};
use crate::events::{Command, InstanceEvent};
use crate::write_model::secret_generator::{
    secret_generator_config_with_default, SecretGeneratorWriteModel,
};
use crate::write_model::{append_and_reduce, ObjectDetails};

fn validate_config(config: &GeneratorConfig) -> CommandResult<()> {
    config
        .validate()
        .map_err(|err| CommandError::invalid_argument(err.to_string()))
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), generator_type = ?generator_type))]
    pub async fn add_secret_generator(
        &self,
        ctx: &CommandContext,
        generator_type: SecretGeneratorType,
        config: GeneratorConfig,
    ) -> CommandResult<ObjectDetails> {
        validate_config(&config)?;

        let mut model = SecretGeneratorWriteModel::new(ctx.instance_id(), generator_type);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.state.is_active() {
            return Err(CommandError::already_exists("secret generator already exists"));
        }

        let command = Command::new(
            model.base.aggregate(),
            InstanceEvent::SecretGeneratorAdded(SecretGeneratorAdded {
                generator_type,
                config,
            }),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("secret generator added");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), generator_type = ?generator_type))]
    pub async fn change_secret_generator(
        &self,
        ctx: &CommandContext,
        generator_type: SecretGeneratorType,
        config: GeneratorConfig,
    ) -> CommandResult<ObjectDetails> {
        validate_config(&config)?;

        let mut model = SecretGeneratorWriteModel::new(ctx.instance_id(), generator_type);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        let current = match (&model.config, model.state.is_active()) {
            (Some(current), true) => current,
            _ => return Err(CommandError::not_found("secret generator not found")),
        };
        let changed = SecretGeneratorChanged::diff(generator_type, current, &config)
            .ok_or_else(|| CommandError::precondition_failed("secret generator not changed"))?;

        let command = Command::new(
            model.base.aggregate(),
            InstanceEvent::SecretGeneratorChanged(changed),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("secret generator changed");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), generator_type = ?generator_type))]
    pub async fn remove_secret_generator(
        &self,
        ctx: &CommandContext,
        generator_type: SecretGeneratorType,
    ) -> CommandResult<ObjectDetails> {
        let mut model = SecretGeneratorWriteModel::new(ctx.instance_id(), generator_type);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("secret generator not found"));
        }

        let command = Command::new(
            model.base.aggregate(),
            InstanceEvent::SecretGeneratorRemoved(SecretGeneratorRemoved { generator_type }),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("secret generator removed");
        Ok(model.base.object_details())
    }

    /// Config in effect for a purpose
    ///
    /// Falls back to the configured default when the instance has no
    /// active config of its own.
    pub async fn secret_generator_config(
        &self,
        ctx: &CommandContext,
        generator_type: SecretGeneratorType,
    ) -> CommandResult<GeneratorConfig> {
        let default = self.config().secret_generators.get(generator_type);
        secret_generator_config_with_default(ctx, self.store(), generator_type, &default).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::event_store::{InMemoryEventStore, MockEventStore};
    use crate::command::testing::*;

    fn config(length: u32) -> GeneratorConfig {
        GeneratorConfig {
            length,
            expiry: Duration::from_secs(600),
            include_lower_letters: false,
            include_upper_letters: true,
            include_digits: true,
            include_symbols: false,
        }
    }

    #[test_case(config(0) ; "zero length")]
    #[test_case(GeneratorConfig { include_upper_letters: false, include_digits: false, ..config(8) } ; "no character class")]
    #[tokio::test]
    async fn test_invalid_config_never_reads(invalid: GeneratorConfig) {
        let mut store = MockEventStore::new();
        store.expect_filter().never();
        store.expect_push().never();
        let commands = commands_over(Arc::new(store));

        let err = commands
            .add_secret_generator(&ctx(), SecretGeneratorType::InitCode, invalid)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_generator_lifecycle() {
        let store = Arc::new(InMemoryEventStore::new());
        let commands = commands(Arc::clone(&store), &[]);
        let kind = SecretGeneratorType::VerifyEmailCode;

        commands
            .add_secret_generator(&ctx(), kind, config(8))
            .await
            .unwrap();
        let err = commands
            .add_secret_generator(&ctx(), kind, config(8))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        let err = commands
            .change_secret_generator(&ctx(), kind, config(8))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());

        commands
            .change_secret_generator(&ctx(), kind, config(10))
            .await
            .unwrap();
        assert_eq!(
            commands.secret_generator_config(&ctx(), kind).await.unwrap(),
            config(10)
        );

        commands.remove_secret_generator(&ctx(), kind).await.unwrap();
        let err = commands
            .change_secret_generator(&ctx(), kind, config(12))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_config_falls_back_to_default() {
        let store = Arc::new(InMemoryEventStore::new());
        let commands = commands(Arc::clone(&store), &[]);
        let kind = SecretGeneratorType::AppSecret;
        let default = commands.config().secret_generators.get(kind);

        assert_eq!(
            commands.secret_generator_config(&ctx(), kind).await.unwrap(),
            default
        );

        commands
            .add_secret_generator(&ctx(), kind, config(40))
            .await
            .unwrap();
        commands.remove_secret_generator(&ctx(), kind).await.unwrap();
        assert_eq!(
            commands.secret_generator_config(&ctx(), kind).await.unwrap(),
            default
        );
    }

    #[tokio::test]
    async fn test_purposes_are_independent() {
        let store = Arc::new(InMemoryEventStore::new());
        let commands = commands(Arc::clone(&store), &[]);

        commands
            .add_secret_generator(&ctx(), SecretGeneratorType::InitCode, config(6))
            .await
            .unwrap();
        commands
            .add_secret_generator(&ctx(), SecretGeneratorType::OtpSms, config(6))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }
}
