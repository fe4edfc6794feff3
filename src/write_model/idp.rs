// Copyright (c) 2025 - Cowboy AI, Inc.
//! Organization OAuth identity provider write model

use crate::aggregate::AggregateType;
use crate::crypto::{encrypt, CryptoValue, EncryptionAlgorithm};
use crate::domain::ObjectState;
use crate::errors::CommandResult;
use crate::events::org::OAuthIdpChanged;
use crate::events::{org, Event, IamEvent, OrgEvent};
use crate::query::SearchQueryBuilder;

use super::{QueryReducer, WriteModel};

/// Desired provider settings as supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OAuthProvider {
    pub name: String,
    pub client_id: String,
    /// Empty keeps the stored secret
    pub client_secret: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_endpoint: String,
    pub scopes: Vec<String>,
    pub id_attribute: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgOAuthIdpWriteModel {
    pub base: WriteModel,
    pub idp_id: String,
    pub name: String,
    pub client_id: String,
    pub client_secret: Option<CryptoValue>,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub user_endpoint: String,
    pub scopes: Vec<String>,
    pub id_attribute: String,
    pub state: ObjectState,
}

impl OrgOAuthIdpWriteModel {
    pub fn new(
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
        idp_id: impl Into<String>,
    ) -> Self {
        let org_id = org_id.into();
        Self {
            base: WriteModel::new(AggregateType::Org, org_id.clone(), org_id, instance_id),
            idp_id: idp_id.into(),
            name: String::new(),
            client_id: String::new(),
            client_secret: None,
            authorization_endpoint: String::new(),
            token_endpoint: String::new(),
            user_endpoint: String::new(),
            scopes: Vec::new(),
            id_attribute: String::new(),
            state: ObjectState::Unspecified,
        }
    }

    /// Changed fields only; a new client secret is encrypted here
    pub fn changes(
        &self,
        desired: &OAuthProvider,
        alg: &dyn EncryptionAlgorithm,
    ) -> CommandResult<Option<OAuthIdpChanged>> {
        fn changed<T: PartialEq + Clone>(current: &T, desired: &T) -> Option<T> {
            (current != desired).then(|| desired.clone())
        }

        let client_secret = if desired.client_secret.is_empty() {
            None
        } else {
            Some(encrypt(desired.client_secret.as_bytes(), alg)?)
        };
        let event = OAuthIdpChanged {
            idp_id: self.idp_id.clone(),
            name: changed(&self.name, &desired.name),
            client_id: changed(&self.client_id, &desired.client_id),
            client_secret,
            authorization_endpoint: changed(
                &self.authorization_endpoint,
                &desired.authorization_endpoint,
            ),
            token_endpoint: changed(&self.token_endpoint, &desired.token_endpoint),
            user_endpoint: changed(&self.user_endpoint, &desired.user_endpoint),
            scopes: changed(&self.scopes, &desired.scopes),
            id_attribute: changed(&self.id_attribute, &desired.id_attribute),
        };
        Ok((!event.is_empty()).then_some(event))
    }
}

impl QueryReducer for OrgOAuthIdpWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Org])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([
                org::OAUTH_IDP_ADDED,
                org::OAUTH_IDP_CHANGED,
                org::IDP_REMOVED,
                org::REMOVED,
            ])
            .builder()
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            if event.aggregate_id() != self.base.aggregate_id {
                continue;
            }
            let idp_id = match &event.payload {
                IamEvent::Org(OrgEvent::OAuthIdpAdded(e)) => &e.idp_id,
                IamEvent::Org(OrgEvent::OAuthIdpChanged(e)) => &e.idp_id,
                IamEvent::Org(OrgEvent::IdpRemoved(e)) => &e.idp_id,
                IamEvent::Org(OrgEvent::Removed(_)) => &self.idp_id,
                _ => continue,
            };
            if *idp_id == self.idp_id {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Org(OrgEvent::OAuthIdpAdded(e)) => {
                    self.name = e.name.clone();
                    self.client_id = e.client_id.clone();
                    self.client_secret = Some(e.client_secret.clone());
                    self.authorization_endpoint = e.authorization_endpoint.clone();
                    self.token_endpoint = e.token_endpoint.clone();
                    self.user_endpoint = e.user_endpoint.clone();
                    self.scopes = e.scopes.clone();
                    self.id_attribute = e.id_attribute.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::Org(OrgEvent::OAuthIdpChanged(e)) => {
                    if let Some(v) = &e.name {
                        self.name = v.clone();
                    }
                    if let Some(v) = &e.client_id {
                        self.client_id = v.clone();
                    }
                    if let Some(v) = &e.client_secret {
                        self.client_secret = Some(v.clone());
                    }
                    if let Some(v) = &e.authorization_endpoint {
                        self.authorization_endpoint = v.clone();
                    }
                    if let Some(v) = &e.token_endpoint {
                        self.token_endpoint = v.clone();
                    }
                    if let Some(v) = &e.user_endpoint {
                        self.user_endpoint = v.clone();
                    }
                    if let Some(v) = &e.scopes {
                        self.scopes = v.clone();
                    }
                    if let Some(v) = &e.id_attribute {
                        self.id_attribute = v.clone();
                    }
                }
                IamEvent::Org(OrgEvent::IdpRemoved(_) | OrgEvent::Removed(_)) => {
                    self.client_secret = None;
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
    use crate::crypto::{decrypt_string, ChaChaEncryption};
    use crate::events::org::{IdpRemoved, OAuthIdpAdded, OrgRemoved};
    use crate::write_model::append_and_reduce;
    use crate::write_model::testing::event;

    fn provider() -> OAuthProvider {
        OAuthProvider {
            name: "github".into(),
            client_id: "client".into(),
            client_secret: "secret".into(),
            authorization_endpoint: "https://github.com/login/oauth/authorize".into(),
            token_endpoint: "https://github.com/login/oauth/access_token".into(),
            user_endpoint: "https://api.github.com/user".into(),
            scopes: vec!["read:user".into()],
            id_attribute: "id".into(),
        }
    }

    fn added(idp_id: &str, alg: &ChaChaEncryption, seq: u64) -> Event {
        let p = provider();
        event(
            Aggregate::org("org1", "i1"),
            OrgEvent::OAuthIdpAdded(OAuthIdpAdded {
                idp_id: idp_id.into(),
                name: p.name,
                client_id: p.client_id,
                client_secret: encrypt(p.client_secret.as_bytes(), alg).unwrap(),
                authorization_endpoint: p.authorization_endpoint,
                token_endpoint: p.token_endpoint,
                user_endpoint: p.user_endpoint,
                scopes: p.scopes,
                id_attribute: p.id_attribute,
            }),
            seq,
        )
    }

    #[test]
    fn test_discriminates_by_idp_id() {
        let alg = ChaChaEncryption::new("k1", [1u8; 32]);
        let mut model = OrgOAuthIdpWriteModel::new("org1", "i1", "idp1");
        append_and_reduce(
            &mut model,
            &[
                added("idp1", &alg, 1),
                added("idp2", &alg, 2),
                event(
                    Aggregate::org("org1", "i1"),
                    OrgEvent::IdpRemoved(IdpRemoved {
                        idp_id: "idp2".into(),
                    }),
                    3,
                ),
            ],
        )
        .unwrap();

        assert!(model.state.is_active());
        assert_eq!(model.name, "github");
        let secret = model.client_secret.as_ref().unwrap();
        assert_eq!(decrypt_string(secret, &alg).unwrap(), "secret");
    }

    #[test]
    fn test_org_removal_voids_provider() {
        let alg = ChaChaEncryption::new("k1", [1u8; 32]);
        let mut model = OrgOAuthIdpWriteModel::new("org1", "i1", "idp1");
        append_and_reduce(
            &mut model,
            &[
                added("idp1", &alg, 1),
                event(
                    Aggregate::org("org1", "i1"),
                    OrgEvent::Removed(OrgRemoved { name: "o".into() }),
                    2,
                ),
            ],
        )
        .unwrap();

        assert_eq!(model.state, ObjectState::Removed);
        assert_eq!(model.client_secret, None);
    }

    #[test]
    fn test_changes_without_new_secret() {
        let alg = ChaChaEncryption::new("k1", [1u8; 32]);
        let mut model = OrgOAuthIdpWriteModel::new("org1", "i1", "idp1");
        append_and_reduce(&mut model, &[added("idp1", &alg, 1)]).unwrap();

        let mut desired = provider();
        desired.client_secret = String::new();
        assert_eq!(model.changes(&desired, &alg).unwrap(), None);

        desired.scopes = vec!["read:user".into(), "user:email".into()];
        let changed = model.changes(&desired, &alg).unwrap().unwrap();
        assert_eq!(changed.scopes, Some(desired.scopes.clone()));
        assert_eq!(changed.name, None);
        assert_eq!(changed.client_secret, None);
    }
}
