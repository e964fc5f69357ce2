//! Per-call cancellation and deadlines
//!
//! Every store operation takes a [`CallContext`] and hands it to the
//! backing client untouched. Clients check it before doing work and again
//! right before making a write durable.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

/// Cancellation token plus optional deadline for one call
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// A context that expires after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// A context cancelled through the given token
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Tighten the deadline to at most `timeout` from now
    pub fn timeout(self, timeout: Duration) -> Self {
        self.deadline_at(Instant::now() + timeout)
    }

    /// Tighten the deadline to at most `deadline`
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Derive a context that is cancelled with this one but can also be
    /// cancelled on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Cancel this context and all of its children
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying cancellation token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The deadline, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether the context was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fail if the context was cancelled or its deadline has passed
    pub fn check(&self) -> Result<(), ClientError> {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if let Some(deadline) = self.deadline
            && Instant::now() >= deadline
        {
            return Err(ClientError::DeadlineExceeded);
        }
        Ok(())
    }
}
