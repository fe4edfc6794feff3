// Copyright (c) 2025 - Cowboy AI, Inc.
//! Projects and their API applications
//!
//! API applications authenticate with a client id and a generated client
//! secret. Only the salted hash of the secret is stored; the plaintext is
//! returned once, when it is created.

use tracing::{info, instrument, warn};

use super::Commands;
use crate::aggregate::AggregateType;
use crate::context::CommandContext;
use crate::crypto::new_hashed_secret;
use crate::domain::{normalize_name, ApiAuthMethod, MilestoneType, SecretGeneratorType};
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::project::{
    add_client_id_unique_constraint, add_project_name_unique_constraint,
    remove_project_name_unique_constraint, ApiConfigAdded, ApiConfigSecretChanged,
    ApiSecretCheck, ApplicationAdded, ProjectAdded, ProjectRemoved,
};
use crate::events::{Command, ProjectEvent};
use crate::permission::{PERMISSION_PROJECT_DELETE, PERMISSION_PROJECT_WRITE};
use crate::write_model::org::OrgWriteModel;
use crate::write_model::project::{ApiAppWriteModel, ProjectWriteModel};
use crate::write_model::resource_owner::resource_owner_of;
use crate::write_model::{append_and_reduce, ObjectDetails};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedProject {
    pub id: String,
    pub details: ObjectDetails,
}

/// A new API application
///
/// `client_secret` is only set for [`ApiAuthMethod::Basic`] and cannot be
/// read again later.
#[derive(Clone, PartialEq, Eq)]
pub struct AddedApiApp {
    pub app_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub details: ObjectDetails,
}

impl std::fmt::Debug for AddedApiApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddedApiApp")
            .field("app_id", &self.app_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("details", &self.details)
            .finish()
    }
}

fn client_id(id: &str, project_name: &str) -> String {
    format!("{id}@{}", project_name.to_lowercase().replace(' ', "_"))
}

fn require(value: &str, field: &str) -> CommandResult<()> {
    if value.trim().is_empty() {
        return Err(CommandError::invalid_argument(format!("{field} is empty")));
    }
    Ok(())
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn add_project(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        project_id: Option<&str>,
        name: &str,
    ) -> CommandResult<AddedProject> {
        require(org_id, "organization id")?;
        let name = normalize_name(name)
            .ok_or_else(|| CommandError::invalid_argument("project name is empty"))?;

        let mut org = OrgWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut org).await?;
        if !org.state.is_active() {
            return Err(CommandError::precondition_failed("organization not found"));
        }

        let id = self.id_or_next(project_id)?;
        let mut model = ProjectWriteModel::new(id.as_str(), org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.state.exists() {
            return Err(CommandError::already_exists("project already exists"));
        }
        self.check_permission(ctx, PERMISSION_PROJECT_WRITE, org_id, &id)
            .await?;

        let mut commands = vec![Command::new(
            model.base.aggregate(),
            ProjectEvent::Added(ProjectAdded { name: name.clone() }),
        )
        .with_unique_constraint(add_project_name_unique_constraint(org_id, &name))];
        let milestone = self
            .pending_milestone(ctx, MilestoneType::ProjectCreated)
            .await?;
        if let Some(pending) = &milestone {
            commands.push(pending.command.clone());
        }

        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        if let Some(pending) = milestone {
            self.milestones_pushed(pending.reached).await;
        }
        info!(project_id = %id, "project added");
        Ok(AddedProject {
            id,
            details: model.base.object_details(),
        })
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), project_id = project_id))]
    pub async fn remove_project(
        &self,
        ctx: &CommandContext,
        project_id: &str,
    ) -> CommandResult<ObjectDetails> {
        require(project_id, "project id")?;

        let mut model = self.project_write_model(ctx, project_id).await?;
        if !model.state.exists() {
            return Err(CommandError::not_found("project not found"));
        }
        let org_id = model.base.resource_owner.clone();
        self.check_permission(ctx, PERMISSION_PROJECT_DELETE, &org_id, project_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            ProjectEvent::Removed(ProjectRemoved {
                name: model.name.clone(),
            }),
        )
        .with_unique_constraint(remove_project_name_unique_constraint(&org_id, &model.name));
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("project removed");
        Ok(model.base.object_details())
    }

    /// Add an API application to an active project
    ///
    /// Basic authentication gets a client secret shaped by the instance's
    /// app secret generator config.
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), project_id = project_id))]
    pub async fn add_api_application(
        &self,
        ctx: &CommandContext,
        project_id: &str,
        name: &str,
        auth_method: ApiAuthMethod,
    ) -> CommandResult<AddedApiApp> {
        require(project_id, "project id")?;
        let name = normalize_name(name)
            .ok_or_else(|| CommandError::invalid_argument("application name is empty"))?;

        let project = self.project_write_model(ctx, project_id).await?;
        if !project.state.is_active() {
            return Err(CommandError::precondition_failed("project not found"));
        }
        let org_id = project.base.resource_owner.clone();
        self.check_permission(ctx, PERMISSION_PROJECT_WRITE, &org_id, project_id)
            .await?;

        let app_id = self.next_id()?;
        let client_id = client_id(&self.next_id()?, &project.name);
        let secret = match auth_method {
            ApiAuthMethod::Basic => {
                let config = self
                    .secret_generator_config(ctx, SecretGeneratorType::AppSecret)
                    .await?;
                Some(new_hashed_secret(&config, self.hasher())?)
            }
            ApiAuthMethod::PrivateKeyJwt => None,
        };

        let mut model =
            ApiAppWriteModel::new(project_id, app_id.as_str(), org_id.as_str(), ctx.instance_id());
        let aggregate = model.base.aggregate();
        let mut commands = vec![
            Command::new(
                aggregate.clone(),
                ProjectEvent::ApplicationAdded(ApplicationAdded {
                    app_id: app_id.clone(),
                    name,
                }),
            ),
            Command::new(
                aggregate,
                ProjectEvent::ApiConfigAdded(ApiConfigAdded {
                    app_id: app_id.clone(),
                    client_id: client_id.clone(),
                    hashed_secret: secret.as_ref().map(|s| s.encoded_hash.clone()),
                    auth_method,
                }),
            )
            .with_unique_constraint(add_client_id_unique_constraint(&client_id)),
        ];
        let milestone = self
            .pending_milestone(ctx, MilestoneType::ApplicationCreated)
            .await?;
        if let Some(pending) = &milestone {
            commands.push(pending.command.clone());
        }

        let events = self.push(ctx, commands).await?;
        append_and_reduce(&mut model, &events)?;
        if let Some(pending) = milestone {
            self.milestones_pushed(pending.reached).await;
        }
        info!(app_id = %app_id, "api application added");
        Ok(AddedApiApp {
            app_id,
            client_id,
            client_secret: secret.map(|s| s.plain),
            details: model.base.object_details(),
        })
    }

    /// Replace the client secret, returning the new plaintext
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), project_id = project_id, app_id = app_id))]
    pub async fn change_api_application_secret(
        &self,
        ctx: &CommandContext,
        project_id: &str,
        app_id: &str,
    ) -> CommandResult<(String, ObjectDetails)> {
        require(project_id, "project id")?;
        require(app_id, "application id")?;

        let mut model = self.api_app_write_model(ctx, project_id, app_id).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("application not found"));
        }
        if model.auth_method != ApiAuthMethod::Basic {
            return Err(CommandError::precondition_failed(
                "application does not use a client secret",
            ));
        }
        let org_id = model.base.resource_owner.clone();
        self.check_permission(ctx, PERMISSION_PROJECT_WRITE, &org_id, project_id)
            .await?;

        let config = self
            .secret_generator_config(ctx, SecretGeneratorType::AppSecret)
            .await?;
        let secret = new_hashed_secret(&config, self.hasher())?;
        let command = Command::new(
            model.base.aggregate(),
            ProjectEvent::ApiConfigSecretChanged(ApiConfigSecretChanged {
                app_id: app_id.to_string(),
                hashed_secret: secret.encoded_hash,
            }),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("api client secret changed");
        Ok((secret.plain, model.base.object_details()))
    }

    /// Check a client secret and record the outcome
    ///
    /// A mismatch is recorded as a failed check and returned as
    /// `InvalidArgument`.
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), project_id = project_id, app_id = app_id))]
    pub async fn verify_api_client_secret(
        &self,
        ctx: &CommandContext,
        project_id: &str,
        app_id: &str,
        secret: &str,
    ) -> CommandResult<()> {
        require(project_id, "project id")?;
        require(app_id, "application id")?;

        let model = self.api_app_write_model(ctx, project_id, app_id).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("application not found"));
        }
        let Some(hashed_secret) = &model.hashed_secret else {
            return Err(CommandError::precondition_failed(
                "application has no client secret",
            ));
        };

        let check = ApiSecretCheck {
            app_id: app_id.to_string(),
        };
        if !self.hasher().verify(hashed_secret, secret)? {
            warn!("client secret check failed");
            let command = Command::new(
                model.base.aggregate(),
                ProjectEvent::ApiSecretCheckFailed(check),
            );
            self.push(ctx, vec![command]).await?;
            return Err(CommandError::invalid_argument("client secret invalid"));
        }

        let mut commands = vec![Command::new(
            model.base.aggregate(),
            ProjectEvent::ApiSecretCheckSucceeded(check),
        )];
        let milestone = self
            .pending_milestone(ctx, MilestoneType::AuthenticationSucceededOnApplication)
            .await?;
        if let Some(pending) = &milestone {
            commands.push(pending.command.clone());
        }
        self.push(ctx, commands).await?;
        if let Some(pending) = milestone {
            self.milestones_pushed(pending.reached).await;
        }
        info!("client secret check succeeded");
        Ok(())
    }

    async fn project_write_model(
        &self,
        ctx: &CommandContext,
        project_id: &str,
    ) -> CommandResult<ProjectWriteModel> {
        let org_id =
            resource_owner_of(ctx, self.store(), AggregateType::Project, project_id).await?;
        let mut model = ProjectWriteModel::new(project_id, org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        Ok(model)
    }

    async fn api_app_write_model(
        &self,
        ctx: &CommandContext,
        project_id: &str,
        app_id: &str,
    ) -> CommandResult<ApiAppWriteModel> {
        let org_id =
            resource_owner_of(ctx, self.store(), AggregateType::Project, project_id).await?;
        let mut model = ApiAppWriteModel::new(project_id, app_id, org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::aggregate::Aggregate;
    use crate::command::testing::*;
    use crate::event_store::InMemoryEventStore;
    use crate::events::org::{OrgAdded, OrgRemoved};
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

    fn secret_checks(events: &[crate::events::Event]) -> (usize, usize) {
        events.iter().fold((0, 0), |(ok, failed), event| match &event.payload {
            IamEvent::Project(ProjectEvent::ApiSecretCheckSucceeded(_)) => (ok + 1, failed),
            IamEvent::Project(ProjectEvent::ApiSecretCheckFailed(_)) => (ok, failed + 1),
            _ => (ok, failed),
        })
    }

    #[tokio::test]
    async fn test_add_project_reaches_milestone_once() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "p2"]);

        let added = commands
            .add_project(&ctx(), ORG, None, "My Project")
            .await
            .unwrap();
        assert_eq!(added.id, "p1");
        assert_eq!(added.details.sequence, 1);
        commands
            .add_project(&ctx(), ORG, None, "Other")
            .await
            .unwrap();

        // org, two projects, one milestone
        assert_eq!(store.len().await, 4);
        assert!(commands
            .milestones_reached(&ctx())
            .await
            .unwrap()
            .project_created);
    }

    #[tokio::test]
    async fn test_project_name_unique_per_org() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "p2"]);
        commands
            .add_project(&ctx(), ORG, None, "proj")
            .await
            .unwrap();

        let err = commands
            .add_project(&ctx(), ORG, None, "PROJ")
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_add_api_application_with_basic_secret() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "app1", "c1"]);
        commands
            .add_project(&ctx(), ORG, None, "My Project")
            .await
            .unwrap();

        let app = commands
            .add_api_application(&ctx(), "p1", "api", ApiAuthMethod::Basic)
            .await
            .unwrap();

        assert_eq!(app.app_id, "app1");
        assert_eq!(app.client_id, "c1@my_project");
        assert_eq!(app.details.resource_owner, ORG);
        let debug = format!("{app:?}");
        let plain = app.client_secret.unwrap();
        assert!(!plain.is_empty());
        assert!(!debug.contains(&plain));

        let model = commands
            .api_app_write_model(&ctx(), "p1", "app1")
            .await
            .unwrap();
        assert_ne!(model.hashed_secret.unwrap(), plain);
    }

    #[tokio::test]
    async fn test_private_key_app_has_no_secret() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "app1", "c1"]);
        commands
            .add_project(&ctx(), ORG, None, "proj")
            .await
            .unwrap();

        let app = commands
            .add_api_application(&ctx(), "p1", "api", ApiAuthMethod::PrivateKeyJwt)
            .await
            .unwrap();
        assert_eq!(app.client_secret, None);

        let err = commands
            .change_api_application_secret(&ctx(), "p1", "app1")
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_verify_client_secret_records_checks() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "app1", "c1"]);
        commands
            .add_project(&ctx(), ORG, None, "proj")
            .await
            .unwrap();
        let app = commands
            .add_api_application(&ctx(), "p1", "api", ApiAuthMethod::Basic)
            .await
            .unwrap();
        let plain = app.client_secret.unwrap();

        let err = commands
            .verify_api_client_secret(&ctx(), "p1", "app1", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        commands
            .verify_api_client_secret(&ctx(), "p1", "app1", &plain)
            .await
            .unwrap();

        assert_eq!(secret_checks(&store.events().await), (1, 1));
        assert!(commands
            .milestones_reached(&ctx())
            .await
            .unwrap()
            .authentication_succeeded_on_application);
    }

    #[tokio::test]
    async fn test_changed_secret_replaces_old_one() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "app1", "c1"]);
        commands
            .add_project(&ctx(), ORG, None, "proj")
            .await
            .unwrap();
        let old = commands
            .add_api_application(&ctx(), "p1", "api", ApiAuthMethod::Basic)
            .await
            .unwrap()
            .client_secret
            .unwrap();

        let (new, _) = commands
            .change_api_application_secret(&ctx(), "p1", "app1")
            .await
            .unwrap();

        assert!(commands
            .verify_api_client_secret(&ctx(), "p1", "app1", &old)
            .await
            .is_err());
        commands
            .verify_api_client_secret(&ctx(), "p1", "app1", &new)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_removed_org_voids_project_and_apps() {
        let store = store_with_org().await;
        let commands = commands(Arc::clone(&store), &["p1", "app1", "c1"]);
        commands
            .add_project(&ctx(), ORG, None, "proj")
            .await
            .unwrap();
        commands
            .add_api_application(&ctx(), "p1", "api", ApiAuthMethod::Basic)
            .await
            .unwrap();
        given(
            &store,
            vec![Command::new(
                Aggregate::org(ORG, INSTANCE),
                OrgEvent::Removed(OrgRemoved { name: "org".into() }),
            )],
        )
        .await;

        let err = commands.remove_project(&ctx(), "p1").await.unwrap_err();
        assert!(err.is_not_found());
        let err = commands
            .verify_api_client_secret(&ctx(), "p1", "app1", "anything")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
