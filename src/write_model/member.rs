// Copyright (c) 2025 - Cowboy AI, Inc.
//! Membership write models
//!
//! A membership is discriminated by user id inside the instance or org
//! aggregate. It is voided by removal of the user or of the aggregate that
//! holds it.

use crate::aggregate::AggregateType;
use crate::domain::ObjectState;
use crate::errors::CommandResult;
use crate::events::{instance, org, user, Event, MemberEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

/// Membership fold shared by instance and org members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberWriteModel {
    pub base: WriteModel,
    pub user_id: String,
    pub roles: Vec<String>,
    pub state: ObjectState,
}

impl MemberWriteModel {
    pub fn new(
        aggregate_type: AggregateType,
        aggregate_id: impl Into<String>,
        resource_owner: impl Into<String>,
        instance_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(aggregate_type, aggregate_id, resource_owner, instance_id),
            user_id: user_id.into(),
            roles: Vec::new(),
            state: ObjectState::Unspecified,
        }
    }

    fn query_for(&self, member_types: [&'static str; 5]) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([self.base.aggregate_type])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types(member_types)
            .or()
            .aggregate_types([AggregateType::User])
            .aggregate_ids([self.user_id.as_str()])
            .event_types([user::REMOVED])
            .builder()
    }

    /// Keep this user's member events, its removal, and removal of the holder
    fn append_filtered(&mut self, events: &[Event], holder_removed: impl Fn(&Event) -> bool) {
        for event in events {
            let own = event.aggregate.aggregate_type == self.base.aggregate_type
                && event.aggregate_id() == self.base.aggregate_id;
            let own_member = own
                && event
                    .payload
                    .member()
                    .is_some_and(|member| member.user_id() == self.user_id);
            let user_removed =
                event.payload.is_user_removed() && event.aggregate_id() == self.user_id;
            if own_member || user_removed || holder_removed(event) {
                self.base.append(event);
            }
        }
    }

    fn void(&mut self) {
        self.roles.clear();
        self.state = ObjectState::Removed;
    }

    /// Roles differ from the current ones, ignoring order
    pub fn roles_differ(&self, roles: &[String]) -> bool {
        let mut current = self.roles.clone();
        let mut desired = roles.to_vec();
        current.sort();
        desired.sort();
        current != desired
    }
}

impl QueryReducer for MemberWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([self.base.aggregate_type])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        self.append_filtered(events, |_| false);
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match event.payload.member() {
                Some(MemberEvent::Added(e)) => {
                    self.roles = e.roles.clone();
                    self.state = ObjectState::Active;
                }
                Some(MemberEvent::Changed(e)) => self.roles = e.roles.clone(),
                Some(MemberEvent::Removed(_) | MemberEvent::CascadeRemoved(_)) => self.void(),
                None => self.void(),
            }
        }
        self.base.reduce_events(&events)
    }
}

/// Member of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceMemberWriteModel {
    pub member: MemberWriteModel,
}

impl InstanceMemberWriteModel {
    pub fn new(instance_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        let instance_id = instance_id.into();
        Self {
            member: MemberWriteModel::new(
                AggregateType::Instance,
                instance_id.clone(),
                instance_id.clone(),
                instance_id,
                user_id,
            ),
        }
    }
}

impl QueryReducer for InstanceMemberWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        self.member.query_for([
            instance::MEMBER_ADDED,
            instance::MEMBER_CHANGED,
            instance::MEMBER_REMOVED,
            instance::MEMBER_CASCADE_REMOVED,
            instance::REMOVED,
        ])
    }

    fn append_events(&mut self, events: &[Event]) {
        self.member
            .append_filtered(events, |event| event.payload.is_instance_removed());
    }

    fn reduce(&mut self) -> CommandResult<()> {
        self.member.reduce()
    }
}

/// Member of an organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgMemberWriteModel {
    pub member: MemberWriteModel,
}

impl OrgMemberWriteModel {
    pub fn new(
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        let org_id = org_id.into();
        Self {
            member: MemberWriteModel::new(
                AggregateType::Org,
                org_id.clone(),
                org_id,
                instance_id,
                user_id,
            ),
        }
    }
}

impl QueryReducer for OrgMemberWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        self.member.query_for([
            org::MEMBER_ADDED,
            org::MEMBER_CHANGED,
            org::MEMBER_REMOVED,
            org::MEMBER_CASCADE_REMOVED,
            org::REMOVED,
        ])
    }

    fn append_events(&mut self, events: &[Event]) {
        let org_id = self.member.base.aggregate_id.clone();
        self.member.append_filtered(events, |event| {
            event.payload.is_org_removed() && event.aggregate_id() == org_id
        });
    }

    fn reduce(&mut self) -> CommandResult<()> {
        self.member.reduce()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::events::member::{MemberAdded, MemberChanged, MemberRemoved};
    use crate::events::org::OrgRemoved;
    use crate::events::user::UserRemoved;
    use crate::events::{OrgEvent, UserEvent};
    use crate::write_model::append_and_reduce;
    use crate::write_model::testing::event;

    fn added(org_id: &str, user_id: &str, roles: &[&str], seq: u64) -> Event {
        event(
            Aggregate::org(org_id, "i1"),
            OrgEvent::Member(MemberEvent::Added(MemberAdded {
                user_id: user_id.into(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })),
            seq,
        )
    }

    #[test]
    fn test_member_ignores_other_users() {
        let mut model = OrgMemberWriteModel::new("org1", "i1", "u1");
        append_and_reduce(
            &mut model,
            &[
                added("org1", "u1", &["ORG_OWNER"], 1),
                added("org1", "u2", &["ORG_VIEWER"], 2),
                event(
                    Aggregate::org("org1", "i1"),
                    OrgEvent::Member(MemberEvent::Removed(MemberRemoved {
                        user_id: "u2".into(),
                    })),
                    3,
                ),
            ],
        )
        .unwrap();

        assert!(model.member.state.is_active());
        assert_eq!(model.member.roles, vec!["ORG_OWNER".to_string()]);
        assert_eq!(model.member.base.processed_sequence, 1);
    }

    #[test]
    fn test_member_changed_then_removed() {
        let mut model = OrgMemberWriteModel::new("org1", "i1", "u1");
        append_and_reduce(
            &mut model,
            &[
                added("org1", "u1", &["ORG_OWNER"], 1),
                event(
                    Aggregate::org("org1", "i1"),
                    OrgEvent::Member(MemberEvent::Changed(MemberChanged {
                        user_id: "u1".into(),
                        roles: vec!["ORG_VIEWER".into()],
                    })),
                    2,
                ),
            ],
        )
        .unwrap();
        assert_eq!(model.member.roles, vec!["ORG_VIEWER".to_string()]);
        assert!(!model.member.roles_differ(&["ORG_VIEWER".to_string()]));

        append_and_reduce(
            &mut model,
            &[event(
                Aggregate::org("org1", "i1"),
                OrgEvent::Member(MemberEvent::Removed(MemberRemoved {
                    user_id: "u1".into(),
                })),
                3,
            )],
        )
        .unwrap();
        assert_eq!(model.member.state, ObjectState::Removed);
        assert!(model.member.roles.is_empty());
    }

    #[test]
    fn test_user_removal_voids_membership() {
        let mut model = OrgMemberWriteModel::new("org1", "i1", "u1");
        append_and_reduce(
            &mut model,
            &[
                added("org1", "u1", &["ORG_OWNER"], 1),
                event(
                    Aggregate::user("u1", "org1", "i1"),
                    UserEvent::Removed(UserRemoved {
                        username: "alice".into(),
                    }),
                    4,
                ),
            ],
        )
        .unwrap();

        assert_eq!(model.member.state, ObjectState::Removed);
        assert_eq!(model.member.base.processed_sequence, 1);
    }

    #[test]
    fn test_org_removal_voids_membership() {
        let mut model = OrgMemberWriteModel::new("org1", "i1", "u1");
        append_and_reduce(
            &mut model,
            &[
                added("org1", "u1", &["ORG_OWNER"], 1),
                event(
                    Aggregate::org("org1", "i1"),
                    OrgEvent::Removed(OrgRemoved { name: "o".into() }),
                    2,
                ),
            ],
        )
        .unwrap();

        assert_eq!(model.member.state, ObjectState::Removed);
    }

    #[test]
    fn test_roles_differ_ignores_order() {
        let mut model = MemberWriteModel::new(AggregateType::Org, "org1", "org1", "i1", "u1");
        model.roles = vec!["A".into(), "B".into()];
        assert!(!model.roles_differ(&["B".to_string(), "A".to_string()]));
        assert!(model.roles_differ(&["A".to_string()]));
    }
}
