use thiserror::Error;

/// Outcome of a store operation that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A get was issued for a key the table does not hold.
    #[error("value not found for key {key:?}")]
    NotFound { key: String },

    /// The request's deadline passed while it was still waiting in the queue.
    #[error("request deadline exceeded before the store picked it up")]
    DeadlineExceeded,

    /// The store worker is gone, so nothing can answer the request.
    #[error("store worker is not running")]
    Unavailable,
}

pub type Result<T> = std::result::Result<T, StoreError>;
