//! Account error types

use thiserror::Error;

use crate::backend::BackendError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Profile already exists: {0}")]
    Conflict(String),

    /// Wrong or missing admin password
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub type AccountResult<T> = Result<T, AccountError>;
