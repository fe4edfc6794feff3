// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Configuration Tests
//!
//! Tests verify:
//! - environment overrides and their validation
//! - secret generator fallback from instance config to service defaults
//! - milestone cache backends are indistinguishable to callers

mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cim_iam_command::cache::{Cache, MokaCache, NoopCache};
use cim_iam_command::command::{AddHuman, SetupInstance};
use cim_iam_command::config::{
    CacheConfig, ENV_CACHE_MAX_CAPACITY, ENV_CACHE_TTL_SECS, ENV_HASHER_ROUNDS,
};
use cim_iam_command::crypto::{GeneratorConfig, MAX_EXPIRY};
use cim_iam_command::domain::{ApiAuthMethod, SecretGeneratorType};
use cim_iam_command::write_model::milestone::MilestonesReached;
use cim_iam_command::{Commands, CommandsConfig};
use pretty_assertions::assert_eq;
use test_case::test_case;

use fixtures::*;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn digits(length: u32) -> GeneratorConfig {
    GeneratorConfig {
        length,
        expiry: Duration::from_secs(600),
        include_lower_letters: false,
        include_upper_letters: false,
        include_digits: true,
        include_symbols: false,
    }
}

async fn email_code_length(commands: &Commands, username: &str) -> usize {
    let user = commands
        .add_human_user(
            &admin_ctx(),
            ORG_ID,
            AddHuman {
                username: username.into(),
                email: format!("{username}@acme.example"),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    user.email_code.unwrap().len()
}

#[test]
fn test_environment_overrides_defaults() {
    let config = CommandsConfig::from_vars(env(&[
        (ENV_CACHE_MAX_CAPACITY, "42"),
        (ENV_CACHE_TTL_SECS, " 60 "),
        (ENV_HASHER_ROUNDS, "3"),
    ]))
    .unwrap();

    assert_eq!(config.cache.max_capacity, 42);
    assert_eq!(config.cache.time_to_live, Duration::from_secs(60));
    assert_eq!(config.hasher.rounds, 3);
    assert_eq!(config.secret_generators, CommandsConfig::default().secret_generators);
}

#[test_case(ENV_CACHE_MAX_CAPACITY, "lots" ; "capacity not a number")]
#[test_case(ENV_CACHE_TTL_SECS, "-1" ; "negative ttl")]
#[test_case(ENV_HASHER_ROUNDS, "0" ; "zero hasher rounds")]
fn test_invalid_environment_is_a_configuration_error(key: &str, value: &str) {
    let err = CommandsConfig::from_vars(env(&[(key, value)])).unwrap_err();

    assert!(err.is_internal());
    assert!(err.to_string().contains(key), "error does not name {key}: {err}");
}

#[tokio::test]
async fn test_generator_config_falls_back_to_service_default() {
    let config = CommandsConfig {
        secret_generators: CommandsConfig::default()
            .secret_generators
            .with(SecretGeneratorType::VerifyEmailCode, digits(10)),
        ..CommandsConfig::default()
    };
    let commands = commands_with_config(
        store(),
        &["user-1", "user-2", "user-3"],
        Arc::new(NoopCache::<MilestonesReached>::new()),
        config,
    );
    given_org(&commands).await;

    assert_eq!(email_code_length(&commands, "first").await, 10);

    commands
        .add_secret_generator(&admin_ctx(), SecretGeneratorType::VerifyEmailCode, digits(8))
        .await
        .unwrap();
    assert_eq!(email_code_length(&commands, "second").await, 8);

    commands
        .remove_secret_generator(&admin_ctx(), SecretGeneratorType::VerifyEmailCode)
        .await
        .unwrap();
    assert_eq!(email_code_length(&commands, "third").await, 10);
}

#[tokio::test]
async fn test_instance_generator_config_is_per_instance() {
    let commands = commands(store(), &[]);
    commands
        .add_secret_generator(&admin_ctx(), SecretGeneratorType::AppSecret, digits(20))
        .await
        .unwrap();

    let own = commands
        .secret_generator_config(&admin_ctx(), SecretGeneratorType::AppSecret)
        .await
        .unwrap();
    let other = commands
        .secret_generator_config(&system_ctx("instance-2"), SecretGeneratorType::AppSecret)
        .await
        .unwrap();

    assert_eq!(own, digits(20));
    assert_eq!(
        other,
        CommandsConfig::default()
            .secret_generators
            .get(SecretGeneratorType::AppSecret)
    );
}

#[tokio::test]
async fn test_generator_expiry_is_bounded() {
    let store = store();
    let commands = commands(Arc::clone(&store), &["user-1"]);
    given_org(&commands).await;
    let seeded = store.len().await;

    let err = commands
        .add_secret_generator(
            &admin_ctx(),
            SecretGeneratorType::VerifyEmailCode,
            GeneratorConfig {
                expiry: Duration::from_secs(10_000_000_000_000),
                ..digits(6)
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(store.len().await, seeded);

    commands
        .add_secret_generator(
            &admin_ctx(),
            SecretGeneratorType::VerifyEmailCode,
            GeneratorConfig {
                expiry: MAX_EXPIRY,
                ..digits(6)
            },
        )
        .await
        .unwrap();
    let user = commands
        .add_human_user(
            &admin_ctx(),
            ORG_ID,
            AddHuman {
                username: "patient".into(),
                email: "patient@acme.example".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let code = user.email_code.unwrap();

    let err = commands
        .verify_user_email(&admin_ctx(), &user.id, "000000x")
        .await
        .unwrap_err();
    assert!(err.is_invalid_argument());
    commands
        .verify_user_email(&admin_ctx(), &user.id, &code)
        .await
        .unwrap();
}

#[derive(Debug, Clone, Copy)]
enum Backend {
    Noop,
    Moka,
}

impl Backend {
    fn cache(self) -> Arc<dyn Cache<MilestonesReached>> {
        match self {
            Backend::Noop => Arc::new(NoopCache::<MilestonesReached>::new()),
            Backend::Moka => {
                Arc::new(MokaCache::<MilestonesReached>::new(&CacheConfig::default()))
            }
        }
    }
}

#[test_case(Backend::Noop ; "without cache")]
#[test_case(Backend::Moka ; "with moka cache")]
#[tokio::test]
async fn test_milestones_do_not_depend_on_cache_backend(backend: Backend) {
    let store = store();
    let commands = commands_with_cache(
        Arc::clone(&store),
        &["app-1", "client-1", "app-2", "client-2"],
        backend.cache(),
    );

    commands
        .setup_instance(
            &admin_ctx(),
            SetupInstance {
                name: "Tenant".into(),
                lockout_policy: None,
            },
        )
        .await
        .unwrap();
    given_org(&commands).await;
    let project = commands
        .add_project(&admin_ctx(), ORG_ID, Some("project-1"), "Portal")
        .await
        .unwrap();
    for name in ["backend", "worker"] {
        commands
            .add_api_application(&admin_ctx(), &project.id, name, ApiAuthMethod::PrivateKeyJwt)
            .await
            .unwrap();
    }

    let reached = commands.milestones_reached(&admin_ctx()).await.unwrap();
    assert!(reached.instance_created);
    assert!(reached.project_created);
    assert!(reached.application_created);
    assert!(!reached.authentication_succeeded_on_application);

    // instance, milestone, org, project, milestone, two apps with configs, milestone
    assert_eq!(store.len().await, 10);
}
