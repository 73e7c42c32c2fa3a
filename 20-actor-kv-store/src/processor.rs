//! The store worker and the handle callers use to reach it.
//!
//! A single tokio task owns the [`KvTable`] and drains one bounded queue of
//! [`Command`]s. Callers never see the table: they hold a [`StoreHandle`],
//! push a command carrying a fresh oneshot reply channel, and await the
//! answer. Because the worker handles one command at a time, every
//! operation observes the effects of all commands dequeued before it and
//! none after it.
//!
//! The worker stops once every handle has been dropped. Commands that were
//! already queued at that point are still answered.

use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info};

use crate::{
    command::{Command, RequestContext},
    error::{Result, StoreError},
    table::KvTable,
};

/// Inbound queue size used when no other capacity is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How many commands may wait in the inbound queue before submitters
    /// are suspended. Clamped to at least one.
    pub queue_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Cloneable entry point to a running store.
///
/// Each method submits one command and suspends until the worker replies.
/// Any number of tasks may use clones of the same handle concurrently.
#[derive(Debug)]
pub struct StoreHandle<V> {
    request_tx: mpsc::Sender<Command<V>>,
}

impl<V> Clone for StoreHandle<V> {
    fn clone(&self) -> Self {
        Self {
            request_tx: self.request_tx.clone(),
        }
    }
}

impl<V: Send + 'static> StoreHandle<V> {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] if the key is absent
    /// - [`StoreError::DeadlineExceeded`] if `ctx` expired while queued
    /// - [`StoreError::Unavailable`] if the worker is gone
    pub async fn get(&self, ctx: RequestContext, key: impl Into<String>) -> Result<V> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Command::Get {
            ctx,
            key: key.into(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| StoreError::Unavailable)?
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub async fn put(&self, ctx: RequestContext, key: impl Into<String>, value: V) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Command::Put {
            ctx,
            key: key.into(),
            value,
            respond_to,
        })
        .await?;
        response.await.map_err(|_| StoreError::Unavailable)?
    }

    /// Removes `key`. Succeeds whether or not the key was present.
    pub async fn delete(&self, ctx: RequestContext, key: impl Into<String>) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.submit(Command::Delete {
            ctx,
            key: key.into(),
            respond_to,
        })
        .await?;
        response.await.map_err(|_| StoreError::Unavailable)?
    }

    /// True once the worker has stopped receiving commands.
    pub fn is_closed(&self) -> bool {
        self.request_tx.is_closed()
    }

    async fn submit(&self, command: Command<V>) -> Result<()> {
        self.request_tx
            .send(command)
            .await
            .map_err(|_| StoreError::Unavailable)
    }
}

/// Spawns the store worker on the current tokio runtime.
///
/// Returns the handle callers submit through and the worker's join handle.
/// The join handle resolves once every `StoreHandle` clone has been dropped
/// and the queue is drained, or with a `JoinError` if the worker panicked.
pub fn spawn_store<V>(config: StoreConfig) -> (StoreHandle<V>, JoinHandle<()>)
where
    V: Clone + Send + 'static,
{
    let capacity = config.queue_capacity.max(1);
    let (request_tx, request_rx) = mpsc::channel(capacity);

    let worker = Worker::new(request_rx);
    let join = tokio::spawn(async move {
        info!(capacity, "store worker started");
        worker.run().await;
    });

    (StoreHandle { request_tx }, join)
}

/// Owns the table and applies commands to it one at a time.
struct Worker<V> {
    table: KvTable<V>,
    request_rx: mpsc::Receiver<Command<V>>,
    processed: u64,
}

impl<V: Clone> Worker<V> {
    fn new(request_rx: mpsc::Receiver<Command<V>>) -> Self {
        Self {
            table: KvTable::new(),
            request_rx,
            processed: 0,
        }
    }

    async fn run(mut self) {
        while let Some(command) = self.request_rx.recv().await {
            self.handle_command(command);
        }
        info!(
            processed = self.processed,
            entries = self.table.len(),
            "store worker stopped, all handles dropped"
        );
    }

    /// Runs one command to completion and answers its caller.
    ///
    /// Commands whose caller already went away are dropped unexecuted, and
    /// commands whose deadline passed are rejected. Neither touches the table.
    fn handle_command(&mut self, command: Command<V>) {
        if command.caller_gone() {
            debug!(
                op = command.kind(),
                key = command.key(),
                "caller went away, skipping command"
            );
            return;
        }

        if command.context().is_expired() {
            debug!(
                op = command.kind(),
                key = command.key(),
                "deadline exceeded before dispatch"
            );
            command.reject(StoreError::DeadlineExceeded);
            return;
        }

        debug!(op = command.kind(), key = command.key(), "dispatching");

        // Replies are best-effort: a caller that stops waiting after dispatch
        // just never reads its result.
        match command {
            Command::Get {
                key, respond_to, ..
            } => {
                let _ = respond_to.send(self.table.get(&key));
            }
            Command::Put {
                key,
                value,
                respond_to,
                ..
            } => {
                self.table.put(key, value);
                let _ = respond_to.send(Ok(()));
            }
            Command::Delete {
                key, respond_to, ..
            } => {
                self.table.delete(&key);
                let _ = respond_to.send(Ok(()));
            }
        }

        self.processed += 1;
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;

    fn worker() -> Worker<String> {
        let (_request_tx, request_rx) = mpsc::channel(1);
        Worker::new(request_rx)
    }

    #[tokio::test]
    async fn expired_put_is_rejected_without_touching_table() {
        let mut worker = worker();
        let (respond_to, response) = oneshot::channel();

        worker.handle_command(Command::Put {
            ctx: RequestContext::with_deadline(Instant::now()),
            key: "a".into(),
            value: "1".into(),
            respond_to,
        });

        assert_eq!(response.await, Ok(Err(StoreError::DeadlineExceeded)));
        assert!(worker.table.is_empty());
        assert_eq!(worker.processed, 0);
    }

    #[tokio::test]
    async fn abandoned_put_is_skipped() {
        let mut worker = worker();
        let (respond_to, response) = oneshot::channel();
        drop(response);

        worker.handle_command(Command::Put {
            ctx: RequestContext::background(),
            key: "a".into(),
            value: "1".into(),
            respond_to,
        });

        assert!(worker.table.is_empty());
        assert_eq!(worker.processed, 0);
    }

    #[tokio::test]
    async fn commands_apply_in_dequeue_order() {
        let mut worker = worker();

        let (put_tx, put_rx) = oneshot::channel();
        worker.handle_command(Command::Put {
            ctx: RequestContext::background(),
            key: "a".into(),
            value: "1".into(),
            respond_to: put_tx,
        });
        let (get_tx, get_rx) = oneshot::channel();
        worker.handle_command(Command::Get {
            ctx: RequestContext::background(),
            key: "a".into(),
            respond_to: get_tx,
        });
        let (delete_tx, delete_rx) = oneshot::channel();
        worker.handle_command(Command::Delete {
            ctx: RequestContext::background(),
            key: "a".into(),
            respond_to: delete_tx,
        });

        assert_eq!(put_rx.await, Ok(Ok(())));
        assert_eq!(get_rx.await, Ok(Ok("1".to_string())));
        assert_eq!(delete_rx.await, Ok(Ok(())));
        assert!(worker.table.is_empty());
        assert_eq!(worker.processed, 3);
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let (store, _worker) = spawn_store::<u32>(StoreConfig { queue_capacity: 0 });
        store
            .put(RequestContext::background(), "n", 1)
            .await
            .expect("put should succeed");
        assert_eq!(store.get(RequestContext::background(), "n").await, Ok(1));
    }
}
