//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

use crate::account::{AccessState, AccountService, ProfileStore, SessionStore};
use crate::api::error::{ApiError, ApiResult};
use crate::billing::CheckoutConfig;
use crate::hospitals::HospitalCatalog;
use crate::shifts::ShiftStore;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Shift records
    pub shifts: Arc<ShiftStore>,
    /// Reference facilities for autocomplete
    pub catalog: Arc<HospitalCatalog>,
    /// Profiles table (local SQLite or hosted)
    pub profiles: Arc<dyn ProfileStore>,
    /// Hosted auth flows, absent when no backend is configured
    pub accounts: Option<Arc<AccountService>>,
    /// Demo/admin flags
    pub sessions: Arc<SessionStore>,
    /// Prices and redirect URLs for checkout
    pub checkout: Arc<CheckoutConfig>,
    /// Payment webhook signing secret
    pub webhook_secret: Option<String>,
    /// API configuration
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState without hosted auth
    pub fn new(
        shifts: Arc<ShiftStore>,
        catalog: Arc<HospitalCatalog>,
        profiles: Arc<dyn ProfileStore>,
        sessions: Arc<SessionStore>,
        config: ApiConfig,
    ) -> Self {
        Self {
            shifts,
            catalog,
            profiles,
            accounts: None,
            sessions,
            checkout: Arc::new(CheckoutConfig::default()),
            webhook_secret: None,
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Attach hosted auth flows
    pub fn with_accounts(mut self, accounts: Arc<AccountService>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Attach checkout prices and the webhook secret
    pub fn with_billing(mut self, checkout: CheckoutConfig, webhook_secret: Option<String>) -> Self {
        self.checkout = Arc::new(checkout);
        self.webhook_secret = webhook_secret.filter(|s| !s.is_empty());
        self
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if hosted auth is available
    pub fn has_accounts(&self) -> bool {
        self.accounts.is_some()
    }

    /// Hosted auth flows, or 503 when none are configured
    pub fn accounts(&self) -> ApiResult<&Arc<AccountService>> {
        self.accounts.as_ref().ok_or_else(|| {
            ApiError::ServiceUnavailable("authentication backend is not configured".to_string())
        })
    }

    /// Reject shift changes the caller is not entitled to
    pub async fn ensure_can_write(&self, headers: &HeaderMap) -> ApiResult<()> {
        if !self.config.enforce_subscription {
            return Ok(());
        }
        if self.sessions.flags().await.bypasses_subscription() {
            return Ok(());
        }

        let token = bearer_token(headers).ok_or_else(|| {
            ApiError::Unauthorized("Sign in or start demo mode to change shifts".to_string())
        })?;
        let profile = self.accounts()?.current(token).await?;

        let access = AccessState::evaluate(&profile, Utc::now());
        if access.can_write() {
            return Ok(());
        }

        tracing::info!(profile_id = %profile.id, access = ?access, "Shift write blocked");
        Err(ApiError::SubscriptionRequired(access.banner().unwrap_or_else(|| {
            "An active subscription is required to change shifts".to_string()
        })))
    }
}

/// `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origins; permissive when empty
    pub cors_origins: Vec<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
    /// Gate shift changes on the subscription
    pub enforce_subscription: bool,
    /// Enable data export endpoint
    pub enable_export: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            cors_origins: Vec::new(),
            request_timeout_ms: 30_000,
            max_body_size: 2 * 1024 * 1024, // 2MB
            enforce_subscription: false,
            enable_export: true,
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&crate::config::Config> for ApiConfig {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            host: config.api.host.clone(),
            port: config.api.port,
            cors_origins: config.api.cors_origins.clone(),
            request_timeout_ms: config.api.request_timeout_secs * 1000,
            max_body_size: config.api.max_body_size,
            enforce_subscription: config.shifts.enforce_subscription,
            enable_export: config.api.enable_export,
        }
    }
}
