// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for command execution
//!
//! Every public command returns either a success object or exactly one
//! [`CommandError`]. The error carries its classification through
//! [`CommandError::kind`], which maps onto the taxonomy callers branch on:
//!
//! ```text
//! InvalidArgument     structural validation, no I/O performed
//! NotFound            target aggregate or sub-entity absent or removed
//! AlreadyExists       active state present, or unique constraint rejected
//! PreconditionFailed  no effective change, or prerequisite state missing
//! PermissionDenied    authorization callback rejected
//! Internal            log, encryption, id generation, cancellation
//! ```

use thiserror::Error;

/// Errors raised by an event log client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventStoreError {
    /// A declared unique constraint is already taken
    #[error("unique constraint violated ({unique_type}): {message}")]
    UniqueConstraint {
        unique_type: String,
        message: String,
    },

    /// Optimistic concurrency check failed
    #[error("concurrency conflict on aggregate {aggregate_id}: expected sequence {expected}, found {actual}")]
    Conflict {
        aggregate_id: String,
        expected: u64,
        actual: u64,
    },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// The caller's deadline elapsed
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Backend failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors raised by encryption, hashing and code handling
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Ciphertext was produced by another algorithm
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// No key with this id is configured
    #[error("unknown key id: {0}")]
    UnknownKey(String),

    /// Key material has the wrong size
    #[error("invalid key material for {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    Encrypt,

    #[error("decryption failed")]
    Decrypt,

    /// Encoded hash could not be parsed
    #[error("malformed hash: {0}")]
    MalformedHash(String),

    /// Generator configuration cannot produce a secret
    #[error("invalid generator config: {0}")]
    InvalidGeneratorConfig(String),
}

/// Classification of a [`CommandError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    PreconditionFailed,
    PermissionDenied,
    Internal,
}

/// Errors that can occur while executing a command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Caller input is structurally invalid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Target does not exist or was removed
    #[error("not found: {0}")]
    NotFound(String),

    /// Target already exists
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Requested change is a no-op or a prerequisite is missing
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Authorization callback rejected the command
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Event log failure, propagated unmodified
    #[error("event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// Encryption or hashing failure
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The id generator failed
    #[error("id generation failed: {0}")]
    IdGeneration(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Anything else that is not caused by the caller
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

impl CommandError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists(message.into())
    }

    pub fn precondition_failed(message: impl Into<String>) -> Self {
        Self::PreconditionFailed(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    /// Classify this error
    ///
    /// A unique constraint rejected by the log is an `AlreadyExists`,
    /// every other log failure is `Internal`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::EventStore(EventStoreError::UniqueConstraint { .. }) => ErrorKind::AlreadyExists,
            Self::EventStore(_)
            | Self::Crypto(_)
            | Self::IdGeneration(_)
            | Self::Configuration(_)
            | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        self.kind() == ErrorKind::InvalidArgument
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    pub fn is_precondition_failed(&self) -> bool {
        self.kind() == ErrorKind::PreconditionFailed
    }

    pub fn is_permission_denied(&self) -> bool {
        self.kind() == ErrorKind::PermissionDenied
    }

    pub fn is_internal(&self) -> bool {
        self.kind() == ErrorKind::Internal
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(err: serde_json::Error) -> Self {
        CommandError::Internal(format!("serialization: {err}"))
    }
}

// Errors cross task boundaries inside the command service.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CommandError>();
    assert_send_sync::<EventStoreError>();
};
