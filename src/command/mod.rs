// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Service
//!
//! Every public command follows the same transaction:
//!
//! ```text
//! validate input ──→ filter + reduce write model ──→ decide ──→ push ──→ fold back
//!   InvalidArgument      NotFound / AlreadyExists      0..n       ObjectDetails
//!                        PreconditionFailed            commands
//! ```
//!
//! 1. Validation failures never touch the log
//! 2. State checks happen after one read round trip and before any write
//! 3. Push failures propagate unmodified
//!
//! Collaborators are injected once through [`CommandsBuilder`] and shared
//! by reference across invocations; write models are built per call.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cim_iam_command::command::{AddOrg, Commands};
//! use cim_iam_command::context::CommandContext;
//! use cim_iam_command::event_store::InMemoryEventStore;
//!
//! # async fn run() -> Result<(), cim_iam_command::errors::CommandError> {
//! let commands = Commands::builder(Arc::new(InMemoryEventStore::new())).build();
//! let ctx = CommandContext::new("instance1").with_user("admin");
//!
//! let org = commands
//!     .add_org(&ctx, AddOrg { name: "ACME".into(), ..Default::default() })
//!     .await?;
//! let group = commands.add_group(&ctx, &org.id, None, "admins", "").await?;
//! assert_eq!(group.details.resource_owner, org.id);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::debug;

use crate::cache::{Cache, MokaCache};
use crate::config::CommandsConfig;
use crate::context::CommandContext;
use crate::crypto::{ChaChaEncryption, EncryptionAlgorithm, SecretHasher, Sha256Hasher};
use crate::errors::CommandResult;
use crate::event_store::EventStore;
use crate::events::{Command, Event};
use crate::id::{IdGenerator, UuidIdGenerator};
use crate::permission::{AllowAll, PermissionCheck};
use crate::write_model::milestone::MilestonesReached;

pub mod custom_text;
pub mod group;
pub mod idp;
pub mod instance;
pub mod limits;
pub mod lockout_policy;
pub mod member;
pub mod milestone;
pub mod org;
pub mod project;
pub mod secret_generator;
pub mod user_email;

pub use custom_text::SetMessageText;
pub use group::AddedGroup;
pub use idp::AddedIdp;
pub use instance::SetupInstance;
pub use limits::{BulkLimitsResult, SetLimits};
pub use org::{AddOrg, AddedOrg, OrgAdmin};
pub use project::{AddedApiApp, AddedProject};
pub use user_email::{AddHuman, AddedHuman, EmailCode};

/// Key id of the encryption key generated when none is configured
pub const DEFAULT_ENCRYPTION_KEY_ID: &str = "default";

/// Command side of the IAM platform
pub struct Commands {
    store: Arc<dyn EventStore>,
    id_generator: Arc<dyn IdGenerator>,
    permission_check: Arc<dyn PermissionCheck>,
    encryption: Arc<dyn EncryptionAlgorithm>,
    hasher: Arc<dyn SecretHasher>,
    milestones: Arc<dyn Cache<MilestonesReached>>,
    config: CommandsConfig,
}

impl std::fmt::Debug for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commands")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Commands {
    pub fn builder(store: Arc<dyn EventStore>) -> CommandsBuilder {
        CommandsBuilder::new(store)
    }

    pub fn config(&self) -> &CommandsConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &dyn EventStore {
        self.store.as_ref()
    }

    pub(crate) fn next_id(&self) -> CommandResult<String> {
        self.id_generator.next_id()
    }

    /// Caller supplied id, or a generated one when blank
    pub(crate) fn id_or_next(&self, id: Option<&str>) -> CommandResult<String> {
        match id.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => Ok(id.to_string()),
            None => self.next_id(),
        }
    }

    pub(crate) async fn check_permission(
        &self,
        ctx: &CommandContext,
        permission: &str,
        resource_owner: &str,
        aggregate_id: &str,
    ) -> CommandResult<()> {
        self.permission_check
            .check(ctx, permission, resource_owner, aggregate_id)
            .await
    }

    pub(crate) fn encryption(&self) -> &dyn EncryptionAlgorithm {
        self.encryption.as_ref()
    }

    pub(crate) fn hasher(&self) -> &dyn SecretHasher {
        self.hasher.as_ref()
    }

    pub(crate) fn milestone_cache(&self) -> &dyn Cache<MilestonesReached> {
        self.milestones.as_ref()
    }

    /// Push through the log, honouring the context
    pub(crate) async fn push(
        &self,
        ctx: &CommandContext,
        commands: Vec<Command>,
    ) -> CommandResult<Vec<Event>> {
        if commands.is_empty() {
            return Ok(Vec::new());
        }
        let count = commands.len();
        let events = ctx.guard(self.store.push(ctx, commands)).await?;
        debug!(
            instance_id = ctx.instance_id(),
            correlation_id = %ctx.correlation_id(),
            commands = count,
            "pushed commands"
        );
        Ok(events)
    }
}

/// Wires the collaborators of [`Commands`]
pub struct CommandsBuilder {
    store: Arc<dyn EventStore>,
    id_generator: Option<Arc<dyn IdGenerator>>,
    permission_check: Option<Arc<dyn PermissionCheck>>,
    encryption: Option<Arc<dyn EncryptionAlgorithm>>,
    hasher: Option<Arc<dyn SecretHasher>>,
    milestones: Option<Arc<dyn Cache<MilestonesReached>>>,
    config: CommandsConfig,
}

impl CommandsBuilder {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            id_generator: None,
            permission_check: None,
            encryption: None,
            hasher: None,
            milestones: None,
            config: CommandsConfig::default(),
        }
    }

    pub fn with_id_generator(mut self, id_generator: Arc<dyn IdGenerator>) -> Self {
        self.id_generator = Some(id_generator);
        self
    }

    pub fn with_permission_check(mut self, permission_check: Arc<dyn PermissionCheck>) -> Self {
        self.permission_check = Some(permission_check);
        self
    }

    pub fn with_encryption(mut self, encryption: Arc<dyn EncryptionAlgorithm>) -> Self {
        self.encryption = Some(encryption);
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn SecretHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    pub fn with_milestone_cache(mut self, cache: Arc<dyn Cache<MilestonesReached>>) -> Self {
        self.milestones = Some(cache);
        self
    }

    pub fn with_config(mut self, config: CommandsConfig) -> Self {
        self.config = config;
        self
    }

    /// Fill unset collaborators with defaults
    ///
    /// Without an explicit encryption algorithm a random key is generated,
    /// so codes do not survive a restart.
    pub fn build(self) -> Commands {
        let config = self.config;
        Commands {
            store: self.store,
            id_generator: self
                .id_generator
                .unwrap_or_else(|| Arc::new(UuidIdGenerator)),
            permission_check: self.permission_check.unwrap_or_else(|| Arc::new(AllowAll)),
            encryption: self
                .encryption
                .unwrap_or_else(|| Arc::new(ChaChaEncryption::generate(DEFAULT_ENCRYPTION_KEY_ID))),
            hasher: self
                .hasher
                .unwrap_or_else(|| Arc::new(Sha256Hasher::new(config.hasher.rounds))),
            milestones: self.milestones.unwrap_or_else(|| {
                Arc::new(MokaCache::<MilestonesReached>::new(&config.cache))
            }),
            config,
        }
    }
}
