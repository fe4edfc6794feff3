// Copyright (c) 2025 - Cowboy AI, Inc.
//! Generic OAuth identity providers of an organization
//!
//! The client secret is encrypted with the service's encryption algorithm
//! before it enters an event and is never returned to the caller.

use tracing::{info, instrument};

use super::Commands;
use crate::context::CommandContext;
use crate::crypto::encrypt;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::filter_to_query_reducer;
use crate::events::org::{IdpRemoved, OAuthIdpAdded};
use crate::events::{Command, OrgEvent};
use crate::permission::{PERMISSION_IDP_DELETE, PERMISSION_IDP_WRITE};
use crate::write_model::idp::{OAuthProvider, OrgOAuthIdpWriteModel};
use crate::write_model::org::OrgWriteModel;
use crate::write_model::{append_and_reduce, ObjectDetails};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedIdp {
    pub id: String,
    pub details: ObjectDetails,
}

fn require(value: &str, field: &str) -> CommandResult<()> {
    if value.trim().is_empty() {
        return Err(CommandError::invalid_argument(format!("{field} is empty")));
    }
    Ok(())
}

/// Shape checks shared by add and update, the secret is checked by the caller
fn validate_provider(provider: &OAuthProvider) -> CommandResult<()> {
    require(&provider.name, "name")?;
    require(&provider.client_id, "client id")?;
    require(&provider.authorization_endpoint, "authorization endpoint")?;
    require(&provider.token_endpoint, "token endpoint")?;
    require(&provider.user_endpoint, "user endpoint")?;
    require(&provider.id_attribute, "id attribute")
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id))]
    pub async fn add_org_oauth_idp(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        provider: OAuthProvider,
    ) -> CommandResult<AddedIdp> {
        require(org_id, "organization id")?;
        validate_provider(&provider)?;
        require(&provider.client_secret, "client secret")?;

        let mut org = OrgWriteModel::new(org_id, ctx.instance_id());
        filter_to_query_reducer(ctx, self.store(), &mut org).await?;
        if !org.state.is_active() {
            return Err(CommandError::precondition_failed("organization not found"));
        }

        let id = self.next_id()?;
        let mut model = OrgOAuthIdpWriteModel::new(org_id, ctx.instance_id(), id.as_str());
        self.check_permission(ctx, PERMISSION_IDP_WRITE, org_id, &id)
            .await?;

        let client_secret = encrypt(provider.client_secret.as_bytes(), self.encryption())?;
        let command = Command::new(
            model.base.aggregate(),
            OrgEvent::OAuthIdpAdded(OAuthIdpAdded {
                idp_id: id.clone(),
                name: provider.name.trim().to_string(),
                client_id: provider.client_id,
                client_secret,
                authorization_endpoint: provider.authorization_endpoint,
                token_endpoint: provider.token_endpoint,
                user_endpoint: provider.user_endpoint,
                scopes: provider.scopes,
                id_attribute: provider.id_attribute,
            }),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!(idp_id = %id, "oauth idp added");
        Ok(AddedIdp {
            id,
            details: model.base.object_details(),
        })
    }

    /// Update a provider
    ///
    /// An empty client secret keeps the stored one. Identical settings push
    /// nothing and return the current details.
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id, idp_id = idp_id))]
    pub async fn update_org_oauth_idp(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        idp_id: &str,
        provider: OAuthProvider,
    ) -> CommandResult<ObjectDetails> {
        require(org_id, "organization id")?;
        require(idp_id, "idp id")?;
        validate_provider(&provider)?;

        let mut model = OrgOAuthIdpWriteModel::new(org_id, ctx.instance_id(), idp_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("identity provider not found"));
        }
        let Some(changed) = model.changes(&provider, self.encryption())? else {
            return Ok(model.base.object_details());
        };
        self.check_permission(ctx, PERMISSION_IDP_WRITE, org_id, idp_id)
            .await?;

        let command = Command::new(model.base.aggregate(), OrgEvent::OAuthIdpChanged(changed));
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("oauth idp updated");
        Ok(model.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id, idp_id = idp_id))]
    pub async fn remove_org_idp(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        idp_id: &str,
    ) -> CommandResult<ObjectDetails> {
        require(org_id, "organization id")?;
        require(idp_id, "idp id")?;

        let mut model = OrgOAuthIdpWriteModel::new(org_id, ctx.instance_id(), idp_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.state.is_active() {
            return Err(CommandError::not_found("identity provider not found"));
        }
        self.check_permission(ctx, PERMISSION_IDP_DELETE, org_id, idp_id)
            .await?;

        let command = Command::new(
            model.base.aggregate(),
            OrgEvent::IdpRemoved(IdpRemoved {
                idp_id: idp_id.to_string(),
            }),
        );
        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("idp removed");
        Ok(model.base.object_details())
    }
}
