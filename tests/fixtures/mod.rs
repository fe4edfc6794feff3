// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-iam-command
//!
//! Fixed ids and service wiring for the integration suites. Ids are handed
//! out by a scripted generator and the encryption key is constant, so every
//! run produces the same log.

#![allow(dead_code)]

use std::sync::Arc;

use cim_iam_command::cache::{Cache, NoopCache};
use cim_iam_command::command::AddOrg;
use cim_iam_command::crypto::{ChaChaEncryption, Sha256Hasher};
use cim_iam_command::id::FixedIdGenerator;
use cim_iam_command::write_model::milestone::MilestonesReached;
use cim_iam_command::{CommandContext, Commands, CommandsConfig, InMemoryEventStore};

pub const INSTANCE_ID: &str = "instance-1";
pub const ORG_ID: &str = "org-1";
pub const ADMIN_ID: &str = "admin-1";

/// Context of the instance admin acting in [`ORG_ID`]
pub fn admin_ctx() -> CommandContext {
    CommandContext::new(INSTANCE_ID)
        .with_user(ADMIN_ID)
        .with_org(ORG_ID)
}

/// Context of a system job acting on another instance
pub fn system_ctx(instance_id: &str) -> CommandContext {
    CommandContext::new(instance_id).with_user("system")
}

pub fn store() -> Arc<InMemoryEventStore> {
    Arc::new(InMemoryEventStore::new())
}

/// Service over `store` with scripted ids and no milestone caching
pub fn commands(store: Arc<InMemoryEventStore>, ids: &[&str]) -> Commands {
    commands_with_cache(store, ids, Arc::new(NoopCache::<MilestonesReached>::new()))
}

pub fn commands_with_cache(
    store: Arc<InMemoryEventStore>,
    ids: &[&str],
    cache: Arc<dyn Cache<MilestonesReached>>,
) -> Commands {
    commands_with_config(store, ids, cache, CommandsConfig::default())
}

pub fn commands_with_config(
    store: Arc<InMemoryEventStore>,
    ids: &[&str],
    cache: Arc<dyn Cache<MilestonesReached>>,
    config: CommandsConfig,
) -> Commands {
    Commands::builder(store)
        .with_id_generator(Arc::new(FixedIdGenerator::new(ids.iter().copied())))
        .with_encryption(Arc::new(ChaChaEncryption::new("fixture-key", [7u8; 32])))
        .with_hasher(Arc::new(Sha256Hasher::new(2)))
        .with_milestone_cache(cache)
        .with_config(config)
        .build()
}

/// Add [`ORG_ID`] named "ACME"
pub async fn given_org(commands: &Commands) {
    let added = commands
        .add_org(
            &admin_ctx(),
            AddOrg {
                org_id: Some(ORG_ID.to_string()),
                name: "ACME".to_string(),
                admins: Vec::new(),
            },
        )
        .await;
    assert!(added.is_ok(), "adding the fixture org failed: {added:?}");
}
