//! Shift error types

use thiserror::Error;

use crate::storage::StorageError;

/// Errors from shift validation and the shift store
#[derive(Error, Debug)]
pub enum ShiftError {
    /// Input violates a record invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// No shift with that id
    #[error("Shift not found: {0}")]
    NotFound(String),

    /// A shift with that id already exists
    #[error("Shift already exists: {0}")]
    Conflict(String),

    /// Persisting the shift slot failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for shift operations
pub type ShiftResult<T> = Result<T, ShiftError>;
