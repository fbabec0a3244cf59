//! Hosted backend errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Backend request timed out")]
    Timeout,

    #[error("Backend unavailable")]
    Unavailable,

    #[error("Backend error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected backend response: {0}")]
    Parse(String),
}

impl BackendError {
    /// Map a transport failure the way every backend call does
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_connect() {
            BackendError::Unavailable
        } else {
            BackendError::Request(err)
        }
    }

    /// Failures the user can only retry later
    pub fn is_outage(&self) -> bool {
        match self {
            BackendError::Request(_)
            | BackendError::Timeout
            | BackendError::Unavailable
            | BackendError::Parse(_) => true,
            BackendError::Api { status, .. } => *status >= 500 || *status == 429,
            BackendError::InvalidCredentials | BackendError::InvalidInput(_) => false,
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outage_classification() {
        assert!(BackendError::Timeout.is_outage());
        assert!(BackendError::Unavailable.is_outage());
        assert!(BackendError::Api { status: 502, message: String::new() }.is_outage());
        assert!(BackendError::Api { status: 429, message: String::new() }.is_outage());
        assert!(!BackendError::Api { status: 422, message: String::new() }.is_outage());
        assert!(!BackendError::InvalidCredentials.is_outage());
    }
}
