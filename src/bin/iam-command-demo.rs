// Copyright (c) 2025 - Cowboy AI, Inc.
//! IAM Command Demo
//!
//! Runs a scripted tenant setup against the in-memory event log and logs
//! every step:
//! - instance with default lockout policy
//! - organization, human user and group
//! - project with an API application and a client secret check
//! - limits for several instances in one bulk push
//!
//! Run with: cargo run --bin iam-command-demo
//!
//! Configuration is read from `IAM_CACHE_MAX_CAPACITY`, `IAM_CACHE_TTL_SECS`
//! and `IAM_HASHER_ROUNDS`; log output is controlled by `RUST_LOG`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cim_iam_command::command::org::ORG_OWNER_ROLE;
use cim_iam_command::command::{AddHuman, AddOrg, SetLimits, SetupInstance};
use cim_iam_command::domain::{ApiAuthMethod, LockoutPolicy};
use cim_iam_command::{CommandContext, Commands, CommandsConfig, InMemoryEventStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("🚀 Starting IAM command demo");

    let config = CommandsConfig::from_env().context("invalid IAM_* configuration")?;
    info!(
        cache_capacity = config.cache.max_capacity,
        hasher_rounds = config.hasher.rounds,
        "Configuration loaded"
    );

    let store = Arc::new(InMemoryEventStore::new());
    let commands = Commands::builder(store.clone()).with_config(config).build();
    let ctx = CommandContext::new("demo-instance").with_user("demo-admin");

    commands
        .setup_instance(
            &ctx,
            SetupInstance {
                name: "Demo".into(),
                lockout_policy: Some(LockoutPolicy {
                    max_password_attempts: 10,
                    max_otp_attempts: 5,
                    show_lockout_failures: true,
                }),
            },
        )
        .await
        .context("instance setup failed")?;

    let org = commands
        .add_org(
            &ctx,
            AddOrg {
                name: "ACME".into(),
                ..Default::default()
            },
        )
        .await
        .context("adding organization failed")?;
    info!(org_id = %org.id, "✅ Organization ready");

    let user = commands
        .add_human_user(
            &ctx,
            &org.id,
            AddHuman {
                username: "alice".into(),
                email: "alice@acme.example".into(),
                ..Default::default()
            },
        )
        .await
        .context("adding user failed")?;
    if let Some(code) = &user.email_code {
        commands
            .verify_user_email(&ctx, &user.id, code)
            .await
            .context("email verification failed")?;
    }
    commands
        .add_org_member(&ctx, &org.id, &user.id, &[ORG_OWNER_ROLE.to_string()])
        .await
        .context("adding org member failed")?;

    let group = commands
        .add_group(&ctx, &org.id, None, "admins", "Organization administrators")
        .await
        .context("adding group failed")?;
    info!(group_id = %group.id, "✅ Group ready");

    let project = commands
        .add_project(&ctx, &org.id, None, "Portal")
        .await
        .context("adding project failed")?;
    let app = commands
        .add_api_application(&ctx, &project.id, "backend", ApiAuthMethod::Basic)
        .await
        .context("adding api application failed")?;
    if let Some(secret) = &app.client_secret {
        if commands
            .verify_api_client_secret(&ctx, &project.id, &app.app_id, "not-the-secret")
            .await
            .is_err()
        {
            warn!("⚠️  Wrong client secret rejected as expected");
        }
        commands
            .verify_api_client_secret(&ctx, &project.id, &app.app_id, secret)
            .await
            .context("client secret check failed")?;
    }
    info!(client_id = %app.client_id, "✅ API application ready");

    let bulk = commands
        .set_instance_limits_bulk(
            &ctx,
            ["demo-instance", "tenant-a", "tenant-b"]
                .into_iter()
                .map(|id| {
                    (
                        id.to_string(),
                        SetLimits {
                            audit_log_retention: Some(Duration::from_secs(30 * 24 * 60 * 60)),
                            block: None,
                        },
                    )
                })
                .collect(),
        )
        .await
        .context("bulk limits failed")?;
    for (instance_id, result) in &bulk.targets {
        match result {
            Ok(details) => info!(%instance_id, sequence = details.sequence, "Limits set"),
            Err(err) => warn!(%instance_id, error = %err, "Limits rejected"),
        }
    }

    let milestones = commands.milestones_reached(&ctx).await?;
    info!(?milestones, "Milestones");
    info!(events = store.len().await, "🏁 Demo finished");

    Ok(())
}
