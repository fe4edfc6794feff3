// Copyright (c) 2025 - Cowboy AI, Inc.
//! Instance and organization members

use async_trait::async_trait;
use tracing::{info, instrument};

use super::Commands;
use crate::aggregate::Aggregate;
use crate::context::CommandContext;
use crate::errors::{CommandError, CommandResult};
use crate::event_store::{filter_to_query_reducer, Filter};
use crate::events::member::{
    add_member_unique_constraint, remove_member_unique_constraint, MemberAdded, MemberChanged,
    MemberRemoved,
};
use crate::events::{Command, InstanceEvent, MemberEvent, OrgEvent};
use crate::permission::{PERMISSION_MEMBER_DELETE, PERMISSION_MEMBER_WRITE};
use crate::preparation::{prepare_commands, Preparation};
use crate::write_model::member::{InstanceMemberWriteModel, OrgMemberWriteModel};
use crate::write_model::org::OrgWriteModel;
use crate::write_model::user::UserStateWriteModel;
use crate::write_model::{append_and_reduce, pushed_events_to_object_details, ObjectDetails};

/// Trimmed roles without blanks, `InvalidArgument` when none remain
fn normalize_roles(roles: &[String]) -> CommandResult<Vec<String>> {
    let roles: Vec<String> = roles
        .iter()
        .map(|role| role.trim().to_string())
        .filter(|role| !role.is_empty())
        .collect();
    if roles.is_empty() {
        return Err(CommandError::invalid_argument("member needs at least one role"));
    }
    Ok(roles)
}

fn require_user_id(user_id: &str) -> CommandResult<()> {
    if user_id.trim().is_empty() {
        return Err(CommandError::invalid_argument("user id is empty"));
    }
    Ok(())
}

async fn require_user(
    ctx: &CommandContext,
    filter: &(impl Filter + ?Sized),
    user_id: &str,
) -> CommandResult<()> {
    let mut user = UserStateWriteModel::new(user_id, "", ctx.instance_id());
    filter_to_query_reducer(ctx, filter, &mut user).await?;
    if !user.state.is_active() {
        return Err(CommandError::precondition_failed("user not found"));
    }
    Ok(())
}

/// Membership of a user in an organization
///
/// Reads through the transaction view, so the organization may be added
/// earlier in the same call.
pub(crate) struct AddOrgMember {
    pub org_id: String,
    pub user_id: String,
    pub roles: Vec<String>,
}

#[async_trait]
impl Preparation for AddOrgMember {
    fn validate(&mut self) -> CommandResult<()> {
        require_user_id(&self.user_id)?;
        self.roles = normalize_roles(&self.roles)?;
        Ok(())
    }

    async fn create_commands(
        &self,
        ctx: &CommandContext,
        filter: &dyn Filter,
    ) -> CommandResult<Vec<Command>> {
        let mut org = OrgWriteModel::new(self.org_id.as_str(), ctx.instance_id());
        filter_to_query_reducer(ctx, filter, &mut org).await?;
        if !org.state.is_active() {
            return Err(CommandError::precondition_failed("organization not found"));
        }
        require_user(ctx, filter, &self.user_id).await?;

        let mut member =
            OrgMemberWriteModel::new(self.org_id.as_str(), ctx.instance_id(), self.user_id.as_str());
        filter_to_query_reducer(ctx, filter, &mut member).await?;
        if member.member.state.exists() {
            return Err(CommandError::already_exists("member already exists"));
        }

        Ok(vec![Command::new(
            Aggregate::org(self.org_id.as_str(), ctx.instance_id()),
            OrgEvent::Member(MemberEvent::Added(MemberAdded {
                user_id: self.user_id.clone(),
                roles: self.roles.clone(),
            })),
        )
        .with_unique_constraint(add_member_unique_constraint(&self.org_id, &self.user_id))])
    }
}

impl Commands {
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub async fn add_instance_member(
        &self,
        ctx: &CommandContext,
        user_id: &str,
        roles: &[String],
    ) -> CommandResult<ObjectDetails> {
        require_user_id(user_id)?;
        let roles = normalize_roles(roles)?;

        require_user(ctx, self.store(), user_id).await?;
        let mut model = InstanceMemberWriteModel::new(ctx.instance_id(), user_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if model.member.state.exists() {
            return Err(CommandError::already_exists("member already exists"));
        }
        self.check_permission(ctx, PERMISSION_MEMBER_WRITE, ctx.instance_id(), ctx.instance_id())
            .await?;

        let command = Command::new(
            model.member.base.aggregate(),
            InstanceEvent::Member(MemberEvent::Added(MemberAdded {
                user_id: user_id.to_string(),
                roles,
            })),
        )
        .with_unique_constraint(add_member_unique_constraint(ctx.instance_id(), user_id));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("instance member added");
        Ok(model.member.base.object_details())
    }

    /// Replace the roles, `PreconditionFailed` when they are the same
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub async fn change_instance_member(
        &self,
        ctx: &CommandContext,
        user_id: &str,
        roles: &[String],
    ) -> CommandResult<ObjectDetails> {
        require_user_id(user_id)?;
        let roles = normalize_roles(roles)?;

        let mut model = InstanceMemberWriteModel::new(ctx.instance_id(), user_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.member.state.exists() {
            return Err(CommandError::not_found("member not found"));
        }
        if !model.member.roles_differ(&roles) {
            return Err(CommandError::precondition_failed("member not changed"));
        }
        self.check_permission(ctx, PERMISSION_MEMBER_WRITE, ctx.instance_id(), ctx.instance_id())
            .await?;

        let command = Command::new(
            model.member.base.aggregate(),
            InstanceEvent::Member(MemberEvent::Changed(MemberChanged {
                user_id: user_id.to_string(),
                roles,
            })),
        );

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("instance member changed");
        Ok(model.member.base.object_details())
    }

    /// Remove a membership, succeeding silently when it does not exist
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), user_id = user_id))]
    pub async fn remove_instance_member(
        &self,
        ctx: &CommandContext,
        user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        require_user_id(user_id)?;

        let mut model = InstanceMemberWriteModel::new(ctx.instance_id(), user_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.member.state.exists() {
            return Ok(model.member.base.object_details());
        }
        self.check_permission(ctx, PERMISSION_MEMBER_DELETE, ctx.instance_id(), ctx.instance_id())
            .await?;

        let command = Command::new(
            model.member.base.aggregate(),
            InstanceEvent::Member(MemberEvent::Removed(MemberRemoved {
                user_id: user_id.to_string(),
            })),
        )
        .with_unique_constraint(remove_member_unique_constraint(ctx.instance_id(), user_id));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("instance member removed");
        Ok(model.member.base.object_details())
    }

    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id, user_id = user_id))]
    pub async fn add_org_member(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        roles: &[String],
    ) -> CommandResult<ObjectDetails> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        let step = AddOrgMember {
            org_id: org_id.to_string(),
            user_id: user_id.to_string(),
            roles: roles.to_vec(),
        };
        let commands = prepare_commands(ctx, self.store(), vec![Box::new(step)]).await?;
        self.check_permission(ctx, PERMISSION_MEMBER_WRITE, org_id, org_id)
            .await?;

        let events = self.push(ctx, commands).await?;
        info!("org member added");
        pushed_events_to_object_details(&events)
            .ok_or_else(|| CommandError::Internal("log returned no events".to_string()))
    }

    /// Replace the roles, `PreconditionFailed` when they are the same
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id, user_id = user_id))]
    pub async fn change_org_member(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
        roles: &[String],
    ) -> CommandResult<ObjectDetails> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        require_user_id(user_id)?;
        let roles = normalize_roles(roles)?;

        let mut model = OrgMemberWriteModel::new(org_id, ctx.instance_id(), user_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.member.state.exists() {
            return Err(CommandError::not_found("member not found"));
        }
        if !model.member.roles_differ(&roles) {
            return Err(CommandError::precondition_failed("member not changed"));
        }
        self.check_permission(ctx, PERMISSION_MEMBER_WRITE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.member.base.aggregate(),
            OrgEvent::Member(MemberEvent::Changed(MemberChanged {
                user_id: user_id.to_string(),
                roles,
            })),
        );

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("org member changed");
        Ok(model.member.base.object_details())
    }

    /// Remove a membership, succeeding silently when it does not exist
    #[instrument(skip_all, fields(instance_id = ctx.instance_id(), org_id = org_id, user_id = user_id))]
    pub async fn remove_org_member(
        &self,
        ctx: &CommandContext,
        org_id: &str,
        user_id: &str,
    ) -> CommandResult<ObjectDetails> {
        if org_id.trim().is_empty() {
            return Err(CommandError::invalid_argument("organization id is empty"));
        }
        require_user_id(user_id)?;

        let mut model = OrgMemberWriteModel::new(org_id, ctx.instance_id(), user_id);
        filter_to_query_reducer(ctx, self.store(), &mut model).await?;
        if !model.member.state.exists() {
            return Ok(model.member.base.object_details());
        }
        self.check_permission(ctx, PERMISSION_MEMBER_DELETE, org_id, org_id)
            .await?;

        let command = Command::new(
            model.member.base.aggregate(),
            OrgEvent::Member(MemberEvent::Removed(MemberRemoved {
                user_id: user_id.to_string(),
            })),
        )
        .with_unique_constraint(remove_member_unique_constraint(org_id, user_id));

        let events = self.push(ctx, vec![command]).await?;
        append_and_reduce(&mut model, &events)?;
        info!("org member removed");
        Ok(model.member.base.object_details())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;
    use crate::command::testing::*;
    use crate::event_store::InMemoryEventStore;
    use crate::events::org::OrgAdded;
    use crate::events::user::{HumanAdded, UserRemoved};
    use crate::events::UserEvent;

    fn roles(roles: &[&str]) -> Vec<String> {
        roles.iter().map(|r| r.to_string()).collect()
    }

    async fn seeded() -> Arc<InMemoryEventStore> {
        let store = Arc::new(InMemoryEventStore::new());
        given(
            &store,
            vec![
                Command::new(
                    Aggregate::org(ORG, INSTANCE),
                    OrgEvent::Added(OrgAdded { name: "org".into() }),
                ),
                Command::new(
                    Aggregate::user("user1", ORG, INSTANCE),
                    UserEvent::HumanAdded(HumanAdded {
                        username: "alice".into(),
                        email: "alice@example.com".into(),
                        email_verified: true,
                    }),
                ),
            ],
        )
        .await;
        store
    }

    #[test_case("", &["ORG_OWNER"] ; "blank user")]
    #[test_case("user1", &[] ; "no roles")]
    #[test_case("user1", &[" "] ; "blank role")]
    #[tokio::test]
    async fn test_add_org_member_invalid(user_id: &str, member_roles: &[&str]) {
        let store = seeded().await;
        let commands = commands(Arc::clone(&store), &[]);
        let len = store.len().await;

        let err = commands
            .add_org_member(&ctx(), ORG, user_id, &roles(member_roles))
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(store.len().await, len);
    }

    #[tokio::test]
    async fn test_org_member_lifecycle() {
        let store = seeded().await;
        let commands = commands(Arc::clone(&store), &[]);

        commands
            .add_org_member(&ctx(), ORG, "user1", &roles(&["ORG_OWNER"]))
            .await
            .unwrap();
        let err = commands
            .add_org_member(&ctx(), ORG, "user1", &roles(&["ORG_OWNER"]))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());

        let err = commands
            .change_org_member(&ctx(), ORG, "user1", &roles(&["ORG_OWNER"]))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());

        commands
            .change_org_member(&ctx(), ORG, "user1", &roles(&["ORG_OWNER", "ORG_USER_MANAGER"]))
            .await
            .unwrap();
        commands
            .remove_org_member(&ctx(), ORG, "user1")
            .await
            .unwrap();

        let len = store.len().await;
        commands
            .remove_org_member(&ctx(), ORG, "user1")
            .await
            .unwrap();
        assert_eq!(store.len().await, len);
    }

    #[tokio::test]
    async fn test_member_needs_existing_user() {
        let store = seeded().await;
        let commands = commands(Arc::clone(&store), &[]);

        let err = commands
            .add_instance_member(&ctx(), "ghost", &roles(&["IAM_OWNER"]))
            .await
            .unwrap_err();
        assert!(err.is_precondition_failed());
    }

    #[tokio::test]
    async fn test_user_removal_voids_membership() {
        let store = seeded().await;
        let commands = commands(Arc::clone(&store), &[]);
        commands
            .add_instance_member(&ctx(), "user1", &roles(&["IAM_OWNER"]))
            .await
            .unwrap();
        given(
            &store,
            vec![Command::new(
                Aggregate::user("user1", ORG, INSTANCE),
                UserEvent::Removed(UserRemoved {
                    username: "alice".into(),
                }),
            )],
        )
        .await;

        let err = commands
            .change_instance_member(&ctx(), "user1", &roles(&["IAM_ADMIN"]))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
