// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Context
//!
//! Carries the caller's identity and the cancellation scope of one command
//! invocation. The context is threaded into every `filter`/`push` call so a
//! cancelled or timed out request never reaches the log.
//!
//! # Example
//!
//! ```rust
//! use cim_iam_command::context::CommandContext;
//! use std::time::Duration;
//!
//! let ctx = CommandContext::new("instance1")
//!     .with_user("user1")
//!     .with_org("org1")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ctx.instance_id(), "instance1");
//! assert_eq!(ctx.user_id(), "user1");
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::EventStoreError;

/// Per-invocation context of a command
#[derive(Debug, Clone)]
pub struct CommandContext {
    instance_id: String,
    org_id: String,
    user_id: String,
    correlation_id: Uuid,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl CommandContext {
    /// Create a context scoped to an instance
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            org_id: String::new(),
            user_id: String::new(),
            correlation_id: Uuid::now_v7(),
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Set the acting user, recorded as creator of pushed events
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Set the caller's organization
    pub fn with_org(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = org_id.into();
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Bind the context to an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail fast if the context is already done
    pub fn check(&self) -> Result<(), EventStoreError> {
        if self.cancellation.is_cancelled() {
            return Err(EventStoreError::Cancelled);
        }
        if matches!(self.deadline, Some(deadline) if deadline <= Instant::now()) {
            return Err(EventStoreError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Race a log call against cancellation and the deadline
    pub async fn guard<T, F>(&self, fut: F) -> Result<T, EventStoreError>
    where
        F: Future<Output = Result<T, EventStoreError>>,
    {
        self.check()?;

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancellation.cancelled() => Err(EventStoreError::Cancelled),
            _ = expired => Err(EventStoreError::DeadlineExceeded),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guard_passes_result_through() {
        let ctx = CommandContext::new("instance1");
        let result = ctx.guard(async { Ok::<_, EventStoreError>(42) }).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn test_guard_rejects_cancelled_context() {
        let token = CancellationToken::new();
        let ctx = CommandContext::new("instance1").with_cancellation(token.clone());
        token.cancel();

        let result = ctx.guard(async { Ok::<_, EventStoreError>(1) }).await;
        assert_eq!(result, Err(EventStoreError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_guard_enforces_deadline() {
        let ctx = CommandContext::new("instance1").with_timeout(Duration::from_millis(10));
        let result = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, EventStoreError>(())
            })
            .await;
        assert_eq!(result, Err(EventStoreError::DeadlineExceeded));
    }

    #[test]
    fn test_builder_sets_identity() {
        let ctx = CommandContext::new("i1").with_user("u1").with_org("o1");
        assert_eq!(ctx.instance_id(), "i1");
        assert_eq!(ctx.user_id(), "u1");
        assert_eq!(ctx.org_id(), "o1");
        assert!(ctx.check().is_ok());
    }
}
