// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command side of a multi-tenant identity and access management platform
//!
//! State lives only in an append-only event log. Each command rebuilds a
//! short-lived write model from the log, checks its preconditions, pushes
//! new events and folds them back to report what changed.
//!
//! ```text
//! Commands ──filter──→ EventStore ──events──→ WriteModel (reduce)
//!    │                                             │
//!    └──────────push(commands)←── decide ←─────────┘
//! ```
//!
//! # Layout
//!
//! - [`events`]: closed event sum type, one enum per aggregate type
//! - [`event_store`]: log contract and an in-memory reference log
//! - [`write_model`]: per command projections of the log
//! - [`preparation`]: validate then create commands, with a transaction view
//! - [`command`]: the public command service
//! - [`crypto`]: encryption, hashing and one-time codes
//! - [`cache`]: milestone cache backends

pub mod aggregate;
pub mod cache;
pub mod command;
pub mod config;
pub mod context;
pub mod crypto;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod id;
pub mod permission;
pub mod preparation;
pub mod query;
pub mod write_model;

// Re-export commonly used types
pub use aggregate::{Aggregate, AggregateType};
pub use command::{Commands, CommandsBuilder};
pub use config::CommandsConfig;
pub use context::CommandContext;
pub use errors::{CommandError, CommandResult, ErrorKind};
pub use event_store::{EventStore, InMemoryEventStore};
pub use events::{Command, Event, IamEvent};
pub use write_model::ObjectDetails;
