//! Hosted authentication
//!
//! Sign-up, sign-in, password reset and session lookup are delegated to the
//! hosted backend behind [`AuthProvider`].

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::backend::error::{BackendError, BackendResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// An authenticated user as the backend reports it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    /// Free-form metadata given at sign-up (holds the display name)
    #[serde(default)]
    pub user_metadata: serde_json::Value,
}

impl AuthUser {
    /// Display name from sign-up metadata, falling back to the email's local part
    pub fn display_name(&self) -> String {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.trim().to_string())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or_default().to_string())
    }
}

/// Tokens returned by a password sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until `access_token` expires
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> BackendResult<AuthUser>;

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession>;

    /// Send a password reset email
    async fn reset_password(&self, email: &str) -> BackendResult<()>;

    /// Resolve an access token to its user
    async fn get_user(&self, access_token: &str) -> BackendResult<AuthUser>;
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid regex")
});

pub fn validate_email(email: &str) -> BackendResult<()> {
    if !EMAIL_RE.is_match(email.trim()) {
        return Err(BackendError::InvalidInput(format!(
            "'{}' is not a valid email address",
            email.trim()
        )));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> BackendResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BackendError::InvalidInput(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email(" dr.joao+plantao@hospital.org.br ").is_ok());
        assert!(validate_email("ana@").is_err());
        assert!(validate_email("ana.example.com").is_err());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
    }

    #[test]
    fn test_display_name() {
        let user = AuthUser {
            id: "u1".to_string(),
            email: "ana@example.com".to_string(),
            user_metadata: serde_json::json!({ "name": "Dra. Ana" }),
        };
        assert_eq!(user.display_name(), "Dra. Ana");

        let anonymous = AuthUser {
            user_metadata: serde_json::Value::Null,
            ..user
        };
        assert_eq!(anonymous.display_name(), "ana");
    }
}
