//! Error types for store operations.

use dojo_json_pointer::{Pointer, PointerError};
use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A `test` operation found a different value; nothing from the batch
    /// was committed.
    #[error("TEST: test operation failure at {path}, unable to apply any operations")]
    TestFailure { path: Pointer },

    /// An encoded operation carried an `op` tag that is not
    /// `add`, `replace`, `remove` or `test`.
    #[error("UNKNOWN_OPERATION: {0}")]
    UnknownOperation(String),

    /// An encoded operation was structurally malformed.
    #[error("INVALID_OPERATION: {0}")]
    InvalidOperation(String),

    /// A non-numeric segment was used to index an array.
    #[error("INVALID_INDEX: {segment} at {path}")]
    InvalidIndex { path: Pointer, segment: String },

    /// The addressed parent is a scalar and cannot hold children.
    #[error("INVALID_TARGET: {path}")]
    InvalidTarget { path: Pointer },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn from_pointer(err: PointerError, path: &Pointer) -> Self {
        match err {
            PointerError::InvalidIndex(segment) => StoreError::InvalidIndex {
                path: path.clone(),
                segment,
            },
            PointerError::InvalidTarget => StoreError::InvalidTarget { path: path.clone() },
        }
    }
}
