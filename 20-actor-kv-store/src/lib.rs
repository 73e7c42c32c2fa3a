//! In-memory key-value store served over HTTP, with every table access
//! serialized through a single worker task.
//!
//! Callers never lock anything. They send commands to the worker through a
//! bounded queue and wait on a private oneshot channel for the answer. The
//! worker is the only code that ever touches the table, so operations are
//! applied one after another in the order the worker dequeues them.
//!
//! - [`table`] holds the unsynchronized map the worker owns.
//! - [`command`] defines the messages sent to the worker and the per-request
//!   [`RequestContext`](command::RequestContext).
//! - [`processor`] spawns the worker and hands out [`StoreHandle`]s.
//! - [`server`] exposes `/get`, `/put` and `/delete` over axum.
//! - [`cli`] parses the command-line configuration.
//! - [`error`] lists the ways a store operation can fail.

pub mod cli;
pub mod command;
pub mod error;
pub mod processor;
pub mod server;
pub mod table;

pub use command::RequestContext;
pub use error::StoreError;
pub use processor::{spawn_store, StoreConfig, StoreHandle};
