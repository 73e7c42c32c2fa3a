//! Requests that flow from store handles to the store worker.

use std::time::Duration;

use tokio::{sync::oneshot, time::Instant};

use crate::error::{Result, StoreError};

/// Per-request context carried alongside every command.
///
/// The worker consults the deadline right before dispatching a command. A
/// command whose deadline already passed is answered with
/// [`StoreError::DeadlineExceeded`] and never touches the table. Once a
/// command is dispatched it always runs to completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context with no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// One operation against the table plus the private channel its result goes back on.
///
/// Every variant owns a fresh oneshot sender, so the worker can answer each
/// command exactly once.
#[derive(Debug)]
pub(crate) enum Command<V> {
    Get {
        ctx: RequestContext,
        key: String,
        respond_to: oneshot::Sender<Result<V>>,
    },
    Put {
        ctx: RequestContext,
        key: String,
        value: V,
        respond_to: oneshot::Sender<Result<()>>,
    },
    Delete {
        ctx: RequestContext,
        key: String,
        respond_to: oneshot::Sender<Result<()>>,
    },
}

impl<V> Command<V> {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Command::Get { .. } => "get",
            Command::Put { .. } => "put",
            Command::Delete { .. } => "delete",
        }
    }

    pub(crate) fn key(&self) -> &str {
        match self {
            Command::Get { key, .. } | Command::Put { key, .. } | Command::Delete { key, .. } => {
                key
            }
        }
    }

    pub(crate) fn context(&self) -> &RequestContext {
        match self {
            Command::Get { ctx, .. } | Command::Put { ctx, .. } | Command::Delete { ctx, .. } => {
                ctx
            }
        }
    }

    /// True once the caller stopped waiting for the reply.
    pub(crate) fn caller_gone(&self) -> bool {
        match self {
            Command::Get { respond_to, .. } => respond_to.is_closed(),
            Command::Put { respond_to, .. } | Command::Delete { respond_to, .. } => {
                respond_to.is_closed()
            }
        }
    }

    /// Answers the command with `error` without running it.
    pub(crate) fn reject(self, error: StoreError) {
        // A send only fails when the caller is gone, and then nobody is left to tell.
        match self {
            Command::Get { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
            Command::Put { respond_to, .. } | Command::Delete { respond_to, .. } => {
                let _ = respond_to.send(Err(error));
            }
        }
    }
}
