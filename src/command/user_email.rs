// Copyright (c) 2025 - Cowboy AI, Inc.
//! Human users and their email verification
//!
//! ```text
//! add / change email ── EmailCodeAdded(encrypted code) ── plaintext to caller
//! verify ──match──→ EmailVerified
//!        └─miss──→ EmailVerificationFailed + error
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use super::Commands;
use crate::aggregate::AggregateType;
use crate::context::CommandContext;
use crate::crypto::{new_encrypted_code, verify_encrypted_code, EncryptedCode};
use crate::domain::{normalize_name, ObjectState, SecretGeneratorType};
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::user::{
    add_username_unique_constraint, remove_username_unique_constraint, EmailChanged,
    EmailCodeAdded, HumanAdded, UserRemoved,
};
use crate::events::{Command, UserEvent};
use crate::permission::{PERMISSION_USER_DELETE, PERMISSION_USER_WRITE};
use crate::write_model::org::OrgWriteModel;
use crate::write_model::resource_owner::resource_owner_of;
use crate::write_model::user::{HumanEmailWriteModel, UserStateWriteModel};
use crate::write_model::{append_and_reduce, ObjectDetails};

/// A new human user
#[derive(Debug, Clone, Default)]
pub struct AddHuman {
    /// Generated when `None`
    pub user_id: Option<String>,
    pub username: String,
    pub email: String,
    /// Skip the verification code
    pub email_verified: bool,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AddedHuman {
    pub id: String,
    /// Plaintext verification code, unless the email was verified
    pub email_code: Option<String>,
    pub details: ObjectDetails,
}

impl fmt::Debug for AddedHuman {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddedHuman")
            .field("id", &self.id)
            .field("email_code", &self.email_code.as_ref().map(|_| "<redacted>"))
            .field("details", &self.details)
            .finish()
    }
}

/// Plaintext verification code, handed out once
#[derive(Clone, PartialEq, Eq)]
pub struct EmailCode {
    pub code: String,
    pub details: ObjectDetails,
}

impl fmt::Debug for EmailCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailCode")
            .field("code", &"<redacted>")
            .field("details", &self.details)
            .finish()
    }
}

fn normalize_email(email: &str) -> CommandResult<String> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {
            Ok(email.to_string())
        }
        _ => Err(CommandError::invalid_argument("email address invalid")),
    }
}

fn require_user_id(user_id: &str) -> CommandResult<()> {
    if user_id.trim().is_empty() {
        return Err(CommandError::invalid_argument("user id is empty"));
    }
    Ok(())
}

fn email_code_command(model: &HumanEmailWriteModel, code: &EncryptedCode) -> Command {
    Command::new(
        model.base.aggregate(),
        UserEvent::EmailCodeAdded(EmailCodeAdded {
            code: code.crypted.clone(),
            expiry: code.expiry,
        }),
    )
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn add_human_user(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        human: AddHuman,
    ) -> CommandResult<AddedHuman> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        let username = normalize_name(&human.username)
            .ok_or_else(|| CommandError::invalid_argument("username is empty"))?;
        let email = normalize_email(&human.email)?;

        let mut org = OrgWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut org).await?;
        if !org.state.is_active() {
            return Err(CommandError::precondition_failed("organization not found"));
        }

        let id = self.id_or_next(human.user_id.as_deref())?;
        let mut model = HumanEmailWriteModel::new(id.as_str(), org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.state != ObjectState::Unspecified {
            return Err(CommandError::already_exists("user already exists"));
        }
        self.check_permission(ctx, PERMISSION_USER_WRITE, org_id, &id)
            .await?;

        let mut commands = vec![Command::new(
            model.base.aggregate(),
            UserEvent::HumanAdded(HumanAdded {
                username: username.clone(),
                email,
                email_verified: human.email_verified,
            }),
        )
        .with_unique_constraint(add_username_unique_constraint(org_id, &username))];
        let code = if human.email_verified {
            None
        } else {
            let code = self.new_email_code(ctx).await?;
            commands.push(email_code_command(&model, &code));
            Some(code.plain)
        };

        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        info!(user_id = %id, "human user added");
        Ok(AddedHuman {
            id,
            email_code: code,
            details: model.base.object_details(),
        })
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub async fn remove_user(
        &self,
        ctx: &CommandContext,
        user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        require_user_id(user_id)?;

        let org_id = resource_owner_of(ctx, self.store(), AggregateType::User, user_id).await?;
        let mut model = UserStateWriteModel::new(user_id, org_id.as_str(), ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("user not found"));
        }
        self.check_permission(ctx, PERMISSION_USER_DELETE, &org_id, user_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            UserEvent::Removed(UserRemoved {
                username: model.username.clone(),
            }),
        )
        .with_unique_constraint(remove_username_unique_constraint(&org_id, &model.username));
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("user removed");
        Ok(model.base.object_details())
    }

    /// Change the email address and send a new verification code
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub async fn change_user_email(
        &self,
        ctx: &CommandContext,
        user_id: &str,
        email: &str,
    ) -> CommandResult<EmailCode> {
        require_user_id(user_id)?;
        let email = normalize_email(email)?;

        let mut model = self.human_email_write_model(ctx, user_id).await?;
        if model.email == email {
            return Err(CommandError::precondition_failed("email not changed"));
        }
        self.check_user_write(ctx, &model).await?;

        let code = self.new_email_code(ctx).await?;
        let commands = vec![
            Command::new(
                model.base.aggregate(),
                UserEvent::EmailChanged(EmailChanged { email }),
            ),
            email_code_command(&model, &code),
        ];
        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        info!("email changed");
        Ok(EmailCode {
            code: code.plain,
            details: model.base.object_details(),
        })
    }

    /// Replace the pending verification code with a fresh one
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub async fn resend_user_email_code(
        &self,
        ctx: &CommandContext,
        user_id: &str,
    ) -> CommandResult<EmailCode> {
        require_user_id(user_id)?;

        let mut model = self.human_email_write_model(ctx, user_id).await?;
        if model.is_verified {
            return Err(CommandError::precondition_failed("email already verified"));
        }
        if model.code.is_none() {
            return Err(CommandError::precondition_failed("no email code pending"));
        }
        self.check_user_write(ctx, &model).await?;

        let code = self.new_email_code(ctx).await?;
        let events = self
            .push(ctx, vec![email_code_command(&model, &code)])
            .await?;
        append_and_reduce(&mut model, &events)?;
        info!("email code resent");
        Ok(EmailCode {
            code: code.plain,
            details: model.base.object_details(),
        })
    }

    /// Check a verification code
    ///
    /// Every failed attempt is recorded before the error is returned. An
    /// expired code is `PreconditionFailed`, a wrong one `InvalidArgument`.
    pub async fn verify_user_email(
        &self,
        ctx: &CommandContext,
        user_id: &str,
        code: &str,
    ) -> CommandResult<ObjectDetails> {
        self.verify_user_email_at(ctx, user_id, code, Utc::now())
            .await
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub(crate) async fn verify_user_email_at(
        &self,
        ctx: &CommandContext,
        user_id: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> CommandResult<ObjectDetails> {
        require_user_id(user_id)?;
        if code.trim().is_empty() {
            return Err(CommandError::invalid_argument("code is empty"));
        }

        let mut model = self.human_email_write_model(ctx, user_id).await?;
        let (Some(crypted), Some(created_at)) = (&model.code, model.code_creation) else {
            return Err(CommandError::precondition_failed("no email code pending"));
        };

        let verified = verify_encrypted_code(
            created_at,
            model.code_expiry,
            crypted,
            code.trim(),
            self.encryption(),
            now,
        );
        if let Err(err) = verified {
            warn!(reason = %err, "email verification failed");
            let command = Command::new(model.base.aggregate(), UserEvent::EmailVerificationFailed);
            self.push(ctx, vec![command]).await?;
            return Err(err.into());
        }

        let events = self
            .push(
                ctx,
                vec![Command::new(model.base.aggregate(), UserEvent::EmailVerified)],
            )
            .await?;
        append_and_reduce(&mut model, &events)?;
        info!("email verified");
        Ok(model.base.object_details())
    }

    /// Active human's email model, scoped to the user's organization
    async fn human_email_write_model(
        &self,
        ctx: &CommandContext,
        user_id: &str,
    ) -> CommandResult<HumanEmailWriteModel> {
        let org_id = resource_owner_of(ctx, self.store(), AggregateType::User, user_id).await?;
        let mut model = HumanEmailWriteModel::new(user_id, org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("user not found"));
        }
        Ok(model)
    }

    /// Users may always manage their own email
    async fn check_user_write(
        &self,
        ctx: &CommandContext,
        model: &HumanEmailWriteModel,
    ) -> CommandResult<()> {
        if ctx.user_id() == model.base.aggregate_id {
            return Ok(());
        }
        self.check_permission(
            ctx,
            PERMISSION_USER_WRITE,
            &model.base.resource_owner,
            &model.base.aggregate_id,
        )
        .await
    }

    async fn new_email_code(&self, ctx: &CommandContext) -> CommandResult<EncryptedCode> {
        let config = self
            .secret_generator_config(ctx, SecretGeneratorType::VerifyEmailCode)
            .await?;
        Ok(new_encrypted_code(&config, self.encryption())?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::aggregate::Aggregate;
    use crate::command::testing::*;
    use crate::event_store::{InMemoryEventStore, MockEventStore};
    use crate::events::org::OrgAdded;
    use crate::events::{IamEvent, OrgEvent};

    async fn store_with_org() -> Arc<InMemoryEventStore> {
        let store = Arc::new(InMemoryEventStore::new());
        given(
            &store,
            vec![Command::new(
                Aggregate::org(ORG, INSTANCE),
                OrgEvent::Added(OrgAdded { name: "org".into() }),
            )],
        )
        .await;
        store
    }

    fn human(username: &str) -> AddHuman {
        AddHuman {
            user_id: None,
            username: username.into(),
            email: format!("{username}@example.com"),
            email_verified: false,
        }
    }

    async fn email_model(store: &InMemoryEventStore, user_id: &str) -> HumanEmailWriteModel {
        let mut model = HumanEmailWriteModel::new(user_id, ORG, INSTANCE);
        filter_to_query_reducer(&ctx(), store, &mut model)
            .await
            .unwrap();
        model
    }

    fn failed_attempts(events: &[crate::events::Event]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e.payload, IamEvent::User(UserEvent::EmailVerificationFailed)))
            .count()
    }

    #[test_case(AddHuman { username: " ".into(), ..human("a") } ; "blank username")]
    #[test_case(AddHuman { email: "no-at-sign".into(), ..human("a") } ; "invalid email")]
    #[tokio::test]
    async fn test_add_human_invalid_input_never_reads(invalid: AddHuman) {
        let mut store = MockEventStore::new();
        store.expect_filter().never();
        store.expect_push().never();
        let commands = commands_over(Arc::new(store));

        let err = commands
            .add_human_user(&ctx(), ORG, invalid)
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_add_human_with_code() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);

        let added = commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap();

        assert_eq!(added.id, "u1");
        assert_eq!(added.details.sequence, 2);
        let code = added.email_code.unwrap();
        assert_eq!(code.len(), 6);

        let model = email_model(&store, "u1").await;
        assert!(!model.is_verified);
        assert!(model.code.is_some());
        assert_ne!(model.code.unwrap().crypted, code.as_bytes().to_vec());
    }

    #[tokio::test]
    async fn test_username_unique_per_org() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1", "u2", "u3"]);
        commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap();

        let err = commands
            .add_human_user(&ctx(), ORG, human("ALICE"))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        commands.remove_user(&ctx(), "u1").await.unwrap();
        commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verify_email_wrong_then_right() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);
        let code = commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap()
            .email_code
            .unwrap();

        let err = commands
            .verify_user_email(&ctx(), "u1", "WRONG1")
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(failed_attempts(&store.events().await), 1);

        commands
            .verify_user_email(&ctx(), "u1", &code)
            .await
            .unwrap();
        assert!(email_model(&store, "u1").await.is_verified);

        let err = commands
            .resend_user_email_code(&ctx(), "u1")
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_expired_code_fails_closed() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);
        let code = commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap()
            .email_code
            .unwrap();

        let later = Utc::now() + Duration::days(1);
        let err = commands
            .verify_user_email_at(&ctx(), "u1", &code, later)
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
        assert_eq!(failed_attempts(&store.events().await), 1);
        assert!(!email_model(&store, "u1").await.is_verified);
    }

    #[tokio::test]
    async fn test_change_email() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);
        let old_code = commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap()
            .email_code
            .unwrap();

        let err = commands
            .change_user_email(&ctx(), "u1", " alice@example.com ")
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());

        let changed = commands
            .change_user_email(&ctx(), "u1", "alice@example.org")
            .await
            .unwrap();
        assert!(!format!("{changed:?}").contains(&changed.code));
        assert_eq!(email_model(&store, "u1").await.email, "alice@example.org");

        // a fresh code replaces the old one
        if old_code != changed.code {
            assert!(commands
                .verify_user_email(&ctx(), "u1", &old_code)
                .await
                .is_err());
        }
        commands
            .verify_user_email(&ctx(), "u1", &changed.code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_resend_replaces_code() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);
        commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap();

        let resent = commands.resend_user_email_code(&ctx(), "u1").await.unwrap();
        commands
            .verify_user_email(&ctx(), "u1", &resent.code)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verified_user_has_no_code() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);
        let added = commands
            .add_human_user(
                &ctx(),
                ORG,
                AddHuman {
                    email_verified: true,
                    ..human("alice")
                },
            )
            .await
            .unwrap();
        assert_eq!(added.email_code, None);
        assert_eq!(store.len().await, 2);

        let err = commands
            .verify_user_email(&ctx(), "u1", "123456")
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_removed_user_not_found() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["u1"]);
        commands
            .add_human_user(&ctx(), ORG, human("alice"))
            .await
            .unwrap();
        commands.remove_user(&ctx(), "u1").await.unwrap();

        let err = commands.remove_user(&ctx(), "u1").await.unwrap_err();
        assert!(err.is_not_found());
        let err = commands
            .change_user_email(&ctx(), "u1", "other@example.com")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
