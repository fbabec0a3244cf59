//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::account::AccountError;
use crate::backend::BackendError;
use crate::billing::BillingError;
use crate::shifts::ShiftError;

/// Message shown whenever the hosted backend cannot be reached
pub const UNAVAILABLE_MESSAGE: &str = "Service temporarily unavailable, please try again shortly";

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or rejected credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Writes blocked until the subscription is renewed; carries the banner
    #[error("{0}")]
    SubscriptionRequired(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down); the detail is only logged
    #[error("{}", UNAVAILABLE_MESSAGE)]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::SubscriptionRequired(_) => {
                (StatusCode::PAYMENT_REQUIRED, "SUBSCRIPTION_REQUIRED")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        // Client mistakes are routine; only server-side failures are errors
        if status.is_server_error() {
            let detail = match &self {
                ApiError::ServiceUnavailable(detail) => detail.clone(),
                other => other.to_string(),
            };
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %detail,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ShiftError> for ApiError {
    fn from(err: ShiftError) -> Self {
        match err {
            ShiftError::Validation(msg) => ApiError::Validation(msg),
            ShiftError::NotFound(id) => ApiError::NotFound(format!("Shift '{}'", id)),
            ShiftError::Conflict(id) => {
                ApiError::Conflict(format!("Shift '{}' already exists", id))
            }
            ShiftError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        if err.is_outage() {
            return ApiError::ServiceUnavailable(err.to_string());
        }
        match err {
            BackendError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            BackendError::InvalidInput(msg) => ApiError::Validation(msg),
            BackendError::Api { status: 401 | 403, message } => ApiError::Unauthorized(message),
            BackendError::Api { status: 409 | 422, message } => ApiError::Conflict(message),
            BackendError::Api { message, .. } => ApiError::Validation(message),
            other => ApiError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(id) => ApiError::NotFound(format!("Profile '{}'", id)),
            AccountError::Conflict(msg) => ApiError::Conflict(msg),
            AccountError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            AccountError::Storage(e) => ApiError::Storage(e),
            AccountError::Backend(e) => e.into(),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::InvalidSignature(_) | BillingError::InvalidPayload(_) => {
                ApiError::Validation(err.to_string())
            }
            BillingError::InvalidRequest(msg) => ApiError::Validation(msg),
            BillingError::Account(e) => e.into(),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_outage_hides_detail() {
        let err: ApiError = BackendError::Timeout.into();
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
        assert_eq!(err.to_string(), UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_backend_client_errors() {
        let err: ApiError = BackendError::InvalidCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err: ApiError = BackendError::Api {
            status: 422,
            message: "User already registered".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (ApiError::SubscriptionRequired("x".into()), StatusCode::PAYMENT_REQUIRED),
            (ApiError::ServiceUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_shift_not_found() {
        let err: ApiError = ShiftError::NotFound("abc".to_string()).into();
        assert_eq!(err.to_string(), "Not found: Shift 'abc'");
    }
}
