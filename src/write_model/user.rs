// Copyright (c) 2025 - Cowboy AI, Inc.
//! User write models

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::aggregate::AggregateType;
use crate::crypto::CryptoValue;
use crate::domain::ObjectState;
use crate::errors::CommandResult;
use crate::events::{org, user, Event, IamEvent, OrgEvent, UserEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

fn user_query(base: &WriteModel, event_types: &[&'static str]) -> SearchQueryBuilder {
    let query = SearchQueryBuilder::new()
        .instance_id(&base.instance_id)
        .add_query()
        .aggregate_types([AggregateType::User])
        .aggregate_ids([base.aggregate_id.as_str()])
        .event_types(event_types.iter().copied());
    if base.resource_owner.is_empty() {
        return query.builder();
    }
    query
        .or()
        .aggregate_types([AggregateType::Org])
        .aggregate_ids([base.resource_owner.as_str()])
        .event_types([org::REMOVED])
        .builder()
}

fn accepts(base: &WriteModel, event: &Event) -> bool {
    match &event.payload {
        IamEvent::User(_) => event.aggregate_id() == base.aggregate_id,
        IamEvent::Org(OrgEvent::Removed(_)) => event.aggregate_id() == base.resource_owner,
        _ => false,
    }
}

/// Existence of a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStateWriteModel {
    pub base: WriteModel,
    pub username: String,
    pub state: ObjectState,
}

impl UserStateWriteModel {
    /// `org_id` may be empty when the owner is not known yet
    pub fn new(
        user_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(AggregateType::User, user_id, org_id, instance_id),
            username: String::new(),
            state: ObjectState::Unspecified,
        }
    }
}

impl QueryReducer for UserStateWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        user_query(&self.base, &[user::HUMAN_ADDED, user::REMOVED])
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if accepts(&self.base, event) {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::User(UserEvent::HumanAdded(e)) => {
                    self.username = e.username.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::User(UserEvent::Removed(_)) | IamEvent::Org(_) => {
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}

/// Email address and its verification of a human user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanEmailWriteModel {
    pub base: WriteModel,
    pub email: String,
    pub is_verified: bool,
    pub code: Option<CryptoValue>,
    pub code_creation: Option<DateTime<Utc>>,
    pub code_expiry: Duration,
    pub state: ObjectState,
}

impl HumanEmailWriteModel {
    pub fn new(
        user_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(AggregateType::User, user_id, org_id, instance_id),
            email: String::new(),
            is_verified: false,
            code: None,
            code_creation: None,
            code_expiry: Duration::ZERO,
            state: ObjectState::Unspecified,
        }
    }

    fn clear_code(&mut self) {
        self.code = None;
        self.code_creation = None;
        self.code_expiry = Duration::ZERO;
    }
}

impl QueryReducer for HumanEmailWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        user_query(
            &self.base,
            &[
                user::HUMAN_ADDED,
                user::EMAIL_CHANGED,
                user::EMAIL_CODE_ADDED,
                user::EMAIL_VERIFIED,
                user::REMOVED,
            ],
        )
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if accepts(&self.base, event) {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::User(UserEvent::HumanAdded(e)) => {
                    self.email = e.email.clone();
                    self.is_verified = e.email_verified;
                    self.state = ObjectState::Active;
                }
                IamEvent::User(UserEvent::EmailChanged(e)) => {
                    self.email = e.email.clone();
                    self.is_verified = false;
                    self.clear_code();
                }
                IamEvent::User(UserEvent::EmailCodeAdded(e)) => {
                    self.code = Some(e.code.clone());
                    self.code_creation = Some(event.created_at);
                    self.code_expiry = e.expiry;
                }
                IamEvent::User(UserEvent::EmailVerified) => {
                    self.is_verified = true;
                    self.clear_code();
                }
                IamEvent::User(UserEvent::Removed(_)) | IamEvent::Org(_) => {
                    self.clear_code();
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregate;
    use crate::crypto::CryptoType;
    use crate::events::org::OrgRemoved;
    use crate::events::user::{EmailChanged, EmailCodeAdded, HumanAdded, UserRemoved};
    use crate::write_model::append_and_reduce;
    use crate::write_model::testing::{event, timestamp};
    use pretty_assertions::assert_eq;

    fn human_added(user_id: &str, seq: u64) -> Event {
        event(
            Aggregate::user(user_id, "org1", "i1"),
            UserEvent::HumanAdded(HumanAdded {
                username: format!("{user_id}-name"),
                email: format!("{user_id}@example.com"),
                email_verified: false,
            }),
            seq,
        )
    }

    fn code() -> CryptoValue {
        CryptoValue {
            crypto_type: CryptoType::Encryption,
            algorithm: "chacha20poly1305".into(),
            key_id: "k1".into(),
            crypted: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_user_state_removed_and_sibling_ignored() {
        let mut model = UserStateWriteModel::new("u1", "org1", "i1");
        append_and_reduce(
            &mut model,
            &[
                human_added("u1", 1),
                event(
                    Aggregate::user("u2", "org1", "i1"),
                    UserEvent::Removed(UserRemoved {
                        username: "u2-name".into(),
                    }),
                    2,
                ),
            ],
        )
        .unwrap();
        assert!(model.state.is_active());
        assert_eq!(model.username, "u1-name");

        append_and_reduce(
            &mut model,
            &[event(
                Aggregate::org("org1", "i1"),
                OrgEvent::Removed(OrgRemoved { name: "o".into() }),
                3,
            )],
        )
        .unwrap();
        assert_eq!(model.state, ObjectState::Removed);
    }

    #[test]
    fn test_email_code_lifecycle() {
        let mut model = HumanEmailWriteModel::new("u1", "org1", "i1");
        append_and_reduce(
            &mut model,
            &[
                human_added("u1", 1),
                event(
                    Aggregate::user("u1", "org1", "i1"),
                    UserEvent::EmailChanged(EmailChanged {
                        email: "new@example.com".into(),
                    }),
                    2,
                ),
                event(
                    Aggregate::user("u1", "org1", "i1"),
                    UserEvent::EmailCodeAdded(EmailCodeAdded {
                        code: code(),
                        expiry: Duration::from_secs(300),
                    }),
                    3,
                ),
            ],
        )
        .unwrap();

        assert_eq!(model.email, "new@example.com");
        assert!(!model.is_verified);
        assert_eq!(model.code, Some(code()));
        assert_eq!(model.code_creation, Some(timestamp(3)));
        assert_eq!(model.code_expiry, Duration::from_secs(300));

        append_and_reduce(
            &mut model,
            &[event(
                Aggregate::user("u1", "org1", "i1"),
                UserEvent::EmailVerified,
                4,
            )],
        )
        .unwrap();
        assert!(model.is_verified);
        assert_eq!(model.code, None);
    }
}
