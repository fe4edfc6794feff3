// Copyright (c) 2025 - Cowboy AI, Inc.
//! Project and API application write models
//!
//! Applications are discriminated by `app_id` inside the project aggregate.
//! Both models react to removal of the owning organization; applications
//! also react to removal of their project.

use crate::aggregate::AggregateType;
use crate::domain::{ApiAuthMethod, ObjectState};
use crate::errors::CommandResult;
use crate::events::{org, project, Event, IamEvent, OrgEvent, ProjectEvent};
use crate::query::{SearchQuery, SearchQueryBuilder};

use super::{QueryReducer, WriteModel};

fn owner_removed(base: &WriteModel, event: &Event) -> bool {
    matches!(&event.payload, IamEvent::Org(OrgEvent::Removed(_)))
        && event.aggregate_id() == base.resource_owner
}

fn with_owner_removal(base: &WriteModel, query: SearchQuery) -> SearchQueryBuilder {
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWriteModel {
    pub base: WriteModel,
    pub name: String,
    pub state: ObjectState,
}

impl ProjectWriteModel {
    pub fn new(
        project_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(AggregateType::Project, project_id, org_id, instance_id),
            name: String::new(),
            state: ObjectState::Unspecified,
        }
    }
}

impl QueryReducer for ProjectWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        let query = SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Project])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([project::ADDED, project::REMOVED]);
        with_owner_removal(&self.base, query)
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            let own = event.aggregate_id() == self.base.aggregate_id
                && matches!(
                    &event.payload,
                    IamEvent::Project(ProjectEvent::Added(_) | ProjectEvent::Removed(_))
                );
            if own || owner_removed(&self.base, event) {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Project(ProjectEvent::Added(e)) => {
                    self.name = e.name.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::Project(ProjectEvent::Removed(_)) | IamEvent::Org(_) => {
                    self.state = ObjectState::Removed;
                }
                _ => {}
            }
        }
        self.base.reduce_events(&events)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiAppWriteModel {
    pub base: WriteModel,
    pub app_id: String,
    pub name: String,
    pub client_id: String,
    pub hashed_secret: Option<String>,
    pub auth_method: ApiAuthMethod,
    pub state: ObjectState,
}

impl ApiAppWriteModel {
    pub fn new(
        project_id: impl Into<String>,
        app_id: impl Into<String>,
        org_id: impl Into<String>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            base: WriteModel::new(AggregateType::Project, project_id, org_id, instance_id),
            app_id: app_id.into(),
            name: String::new(),
            client_id: String::new(),
            hashed_secret: None,
            auth_method: ApiAuthMethod::default(),
            state: ObjectState::Unspecified,
        }
    }
}

impl QueryReducer for ApiAppWriteModel {
    fn query(&self) -> SearchQueryBuilder {
        let query = SearchQueryBuilder::new()
            .instance_id(&self.base.instance_id)
            .add_query()
            .aggregate_types([AggregateType::Project])
            .aggregate_ids([self.base.aggregate_id.as_str()])
            .event_types([
                project::REMOVED,
                project::APPLICATION_ADDED,
                project::APPLICATION_REMOVED,
                project::API_CONFIG_ADDED,
                project::API_CONFIG_SECRET_CHANGED,
            ]);
        with_owner_removal(&self.base, query)
    }

    fn append_events(&mut self, events: &[Event]) {
        for event in events {
            let accepted = match &event.payload {
                IamEvent::Project(ProjectEvent::Removed(_)) => {
                    event.aggregate_id() == self.base.aggregate_id
                }
                IamEvent::Project(e) => {
                    event.aggregate_id() == self.base.aggregate_id
                        && e.app_id() == Some(self.app_id.as_str())
                }
                _ => owner_removed(&self.base, event),
            };
            if accepted {
                self.base.append(event);
            }
        }
    }

    fn reduce(&mut self) -> CommandResult<()> {
        let events = self.base.take_events();
        for event in &events {
            match &event.payload {
                IamEvent::Project(ProjectEvent::ApplicationAdded(e)) => {
                    self.name = e.name.clone();
                    self.state = ObjectState::Active;
                }
                IamEvent::Project(ProjectEvent::ApiConfigAdded(e)) => {
                    self.client_id = e.client_id.clone();
                    self.hashed_secret = e.hashed_secret.clone();
                    self.auth_method = e.auth_method;
                }
                IamEvent::Project(ProjectEvent::ApiConfigSecretChanged(e)) => {
                    self.hashed_secret = Some(e.hashed_secret.clone());
                }
                IamEvent::Project(ProjectEvent::ApplicationRemoved(_) | ProjectEvent::Removed(_))
                | IamEvent::Org(_) => {
                    self.hashed_secret = None;
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
    use crate::events::org::OrgRemoved;
    use crate::events::project::{
        ApiConfigAdded, ApiConfigSecretChanged, ApplicationAdded, ProjectAdded, ProjectRemoved,
    };
    use crate::write_model::append_and_reduce;
    use crate::write_model::testing::event;

    fn app_added(app_id: &str, seq: u64) -> Vec<Event> {
        vec![
            event(
                Aggregate::project("p1", "org1", "i1"),
                ProjectEvent::ApplicationAdded(ApplicationAdded {
                    app_id: app_id.into(),
                    name: format!("app {app_id}"),
                }),
                seq,
            ),
            event(
                Aggregate::project("p1", "org1", "i1"),
                ProjectEvent::ApiConfigAdded(ApiConfigAdded {
                    app_id: app_id.into(),
                    client_id: format!("{app_id}@p1"),
                    hashed_secret: Some(format!("hash-{app_id}")),
                    auth_method: ApiAuthMethod::Basic,
                }),
                seq + 1,
            ),
        ]
    }

    #[test]
    fn test_project_lifecycle_and_owner_removal() {
        let mut model = ProjectWriteModel::new("p1", "org1", "i1");
        append_and_reduce(
            &mut model,
            &[event(
                Aggregate::project("p1", "org1", "i1"),
                ProjectEvent::Added(ProjectAdded { name: "proj".into() }),
                1,
            )],
        )
        .unwrap();
        assert!(model.state.is_active());

        append_and_reduce(
            &mut model,
            &[event(
                Aggregate::org("org1", "i1"),
                OrgEvent::Removed(OrgRemoved { name: "o".into() }),
                9,
            )],
        )
        .unwrap();
        assert_eq!(model.state, ObjectState::Removed);
        assert_eq!(model.base.processed_sequence, 1);
    }

    #[test]
    fn test_app_ignores_sibling_apps() {
        let mut model = ApiAppWriteModel::new("p1", "a1", "org1", "i1");
        let mut events = app_added("a1", 1);
        events.extend(app_added("a2", 3));
        events.push(event(
            Aggregate::project("p1", "org1", "i1"),
            ProjectEvent::ApiConfigSecretChanged(ApiConfigSecretChanged {
                app_id: "a2".into(),
                hashed_secret: "rotated".into(),
            }),
            5,
        ));
        append_and_reduce(&mut model, &events).unwrap();

        assert!(model.state.is_active());
        assert_eq!(model.client_id, "a1@p1");
        assert_eq!(model.hashed_secret.as_deref(), Some("hash-a1"));
        assert_eq!(model.base.processed_sequence, 2);
    }

    #[test]
    fn test_project_removal_voids_app() {
        let mut model = ApiAppWriteModel::new("p1", "a1", "org1", "i1");
        let mut events = app_added("a1", 1);
        events.push(event(
            Aggregate::project("p1", "org1", "i1"),
            ProjectEvent::Removed(ProjectRemoved { name: "proj".into() }),
            3,
        ));
        append_and_reduce(&mut model, &events).unwrap();

        assert_eq!(model.state, ObjectState::Removed);
        assert_eq!(model.hashed_secret, None);
    }
}
