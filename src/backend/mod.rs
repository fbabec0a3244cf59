//! Hosted backend
//!
//! Authentication and the remote profiles table. When no backend is
//! configured, profiles live in the local SQLite store and the auth routes
//! report the service as unavailable.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{
    validate_email, validate_password, AuthProvider, AuthSession, AuthUser, MIN_PASSWORD_LEN,
};
pub use client::{BackendConfig, HostedBackend};
pub use error::{BackendError, BackendResult};
