//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and `PLANTAO_*` environment variable overrides.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::backend::BackendConfig;
use crate::billing::CheckoutConfig;
use crate::shifts::TaxPolicy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub shifts: ShiftsConfig,

    #[serde(default)]
    pub backend: HostedBackendConfig,

    #[serde(default)]
    pub billing: BillingConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Local persistence
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the `shifts` and `session` slots
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// SQLite profiles table; defaults to `<data_dir>/profiles.db`
    #[serde(default)]
    pub profiles_db: Option<String>,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("plantao").to_string_lossy().to_string())
        .unwrap_or_else(|| "./plantao_data".to_string())
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            profiles_db: None,
        }
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default = "default_true")]
    pub enable_export: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    2 * 1024 * 1024 // 2 MB
}

fn default_true() -> bool {
    true
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:8084".to_string(),
                "http://127.0.0.1:8084".to_string(),
            ],
            request_timeout_secs: default_request_timeout(),
            max_body_size: default_max_body_size(),
            enable_export: true,
        }
    }
}

/// Shift records
#[derive(Debug, Clone, Deserialize)]
pub struct ShiftsConfig {
    /// Withholding rate applied when a shift has no explicit tax
    #[serde(default = "default_tax_rate")]
    pub default_tax_rate_percent: Decimal,

    /// Require demo/admin or a paying (or trial) profile to change shifts.
    ///
    /// Demo mode is a flag on the installation, not on a caller, and
    /// `POST /api/v1/session/demo` sets it without authentication. Anyone who
    /// can reach the API can therefore lift this check for every client, so
    /// only expose the server to the single local user it serves.
    #[serde(default)]
    pub enforce_subscription: bool,
}

fn default_tax_rate() -> Decimal {
    Decimal::from(11)
}

impl Default for ShiftsConfig {
    fn default() -> Self {
        Self {
            default_tax_rate_percent: default_tax_rate(),
            enforce_subscription: false,
        }
    }
}

/// Hosted auth and profiles backend; disabled while `url` is unset
#[derive(Debug, Clone, Deserialize)]
pub struct HostedBackendConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub anon_key: Option<String>,

    #[serde(default)]
    pub service_key: Option<String>,

    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,

    #[serde(default = "default_backend_timeout")]
    pub request_timeout_ms: u64,
}

fn default_profiles_table() -> String {
    "profiles".to_string()
}

fn default_backend_timeout() -> u64 {
    10_000
}

impl Default for HostedBackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            service_key: None,
            profiles_table: default_profiles_table(),
            request_timeout_ms: default_backend_timeout(),
        }
    }
}

/// Trial, prices and payment webhooks
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_trial_days")]
    pub trial_days: u32,

    #[serde(default = "default_monthly_price")]
    pub monthly_price_cents: u64,

    #[serde(default = "default_annual_price")]
    pub annual_price_cents: u64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_success_url")]
    pub success_url: String,

    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,

    /// Signing secret for webhooks; signatures are not checked while unset
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

fn default_trial_days() -> u32 {
    7
}

fn default_monthly_price() -> u64 {
    CheckoutConfig::default().monthly_price_cents
}

fn default_annual_price() -> u64 {
    CheckoutConfig::default().annual_price_cents
}

fn default_currency() -> String {
    CheckoutConfig::default().currency
}

fn default_success_url() -> String {
    CheckoutConfig::default().success_url
}

fn default_cancel_url() -> String {
    CheckoutConfig::default().cancel_url
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            monthly_price_cents: default_monthly_price(),
            annual_price_cents: default_annual_price(),
            currency: default_currency(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
            webhook_secret: None,
        }
    }
}

/// Demo and admin sessions
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Admin sign-in is disabled while unset
    #[serde(default)]
    pub admin_password: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("plantao").join("config.toml")),
            Some(PathBuf::from("/etc/plantao/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Storage overrides
        if let Some(data_dir) = var("PLANTAO_DATA_DIR") {
            self.storage.data_dir = data_dir;
        }

        // API overrides
        if let Some(host) = var("PLANTAO_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("PLANTAO_API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        // Shift overrides
        if let Some(rate) = var("PLANTAO_TAX_RATE") {
            if let Ok(r) = rate.parse() {
                self.shifts.default_tax_rate_percent = r;
            }
        }
        if let Some(enforce) = var("PLANTAO_ENFORCE_SUBSCRIPTION") {
            self.shifts.enforce_subscription = matches!(enforce.as_str(), "1" | "true" | "yes");
        }

        // Backend overrides
        if let Some(url) = var("PLANTAO_BACKEND_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = var("PLANTAO_BACKEND_ANON_KEY") {
            self.backend.anon_key = Some(key);
        }
        if let Some(key) = var("PLANTAO_BACKEND_SERVICE_KEY") {
            self.backend.service_key = Some(key);
        }

        // Billing and session secrets
        if let Some(secret) = var("PLANTAO_WEBHOOK_SECRET") {
            self.billing.webhook_secret = Some(secret);
        }
        if let Some(password) = var("PLANTAO_ADMIN_PASSWORD") {
            self.session.admin_password = Some(password);
        }

        // Logging overrides
        if let Some(level) = var("PLANTAO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("PLANTAO_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Data directory with a leading `~` expanded
    pub fn data_dir(&self) -> PathBuf {
        expand_home(&self.storage.data_dir)
    }

    pub fn profiles_db_path(&self) -> PathBuf {
        match &self.storage.profiles_db {
            Some(path) => expand_home(path),
            None => self.data_dir().join("profiles.db"),
        }
    }

    pub fn tax_policy(&self) -> Result<TaxPolicy, ConfigError> {
        TaxPolicy::new(self.shifts.default_tax_rate_percent)
            .map_err(|e| ConfigError::Invalid(format!("shifts.default_tax_rate_percent: {}", e)))
    }

    pub fn checkout(&self) -> CheckoutConfig {
        CheckoutConfig {
            monthly_price_cents: self.billing.monthly_price_cents,
            annual_price_cents: self.billing.annual_price_cents,
            currency: self.billing.currency.clone(),
            success_url: self.billing.success_url.clone(),
            cancel_url: self.billing.cancel_url.clone(),
        }
    }

    /// Hosted backend settings, `None` when no backend is configured
    pub fn hosted_backend(&self) -> Result<Option<BackendConfig>, ConfigError> {
        let Some(url) = self.backend.url.as_ref().filter(|u| !u.trim().is_empty()) else {
            return Ok(None);
        };
        let anon_key = self
            .backend
            .anon_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::Invalid("backend.anon_key is required with backend.url".to_string()))?;

        Ok(Some(BackendConfig {
            url: url.clone(),
            anon_key,
            service_key: self.backend.service_key.clone(),
            profiles_table: self.backend.profiles_table.clone(),
            request_timeout_ms: self.backend.request_timeout_ms,
        }))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Plantão Configuration
#
# Environment variables override these settings:
# - PLANTAO_DATA_DIR
# - PLANTAO_API_HOST
# - PLANTAO_API_PORT
# - PLANTAO_TAX_RATE
# - PLANTAO_ENFORCE_SUBSCRIPTION
# - PLANTAO_BACKEND_URL, PLANTAO_BACKEND_ANON_KEY, PLANTAO_BACKEND_SERVICE_KEY
# - PLANTAO_WEBHOOK_SECRET
# - PLANTAO_ADMIN_PASSWORD
# - PLANTAO_LOG_LEVEL
# - PLANTAO_LOG_FORMAT

[storage]
# Directory for shift records and session flags
data_dir = "~/.local/share/plantao"

# Local profiles database (used when no hosted backend is configured)
# profiles_db = "~/.local/share/plantao/profiles.db"

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins
cors_origins = ["http://localhost:8084", "http://127.0.0.1:8084"]

# Request timeout in seconds
request_timeout_secs = 30

# Maximum request body (bytes)
max_body_size = 2097152

# Enable the CSV/JSON export endpoint
enable_export = true

[shifts]
# Withholding rate (%) when a shift has no explicit tax amount
default_tax_rate_percent = 11

# Block shift changes for expired or cancelled subscriptions.
# Demo mode (POST /api/v1/session/demo, no login needed) lifts this for the
# whole installation, so keep the API bound to the local machine.
enforce_subscription = false

[backend]
# Hosted auth/profiles backend. Leave url unset to keep profiles locally.
# url = "https://your-project.example.co"
# anon_key = ""
# service_key = ""
profiles_table = "profiles"
request_timeout_ms = 10000

[billing]
# Free trial length (days)
trial_days = 7

# Prices in cents
monthly_price_cents = 4990
annual_price_cents = 47900
currency = "brl"

# Checkout redirects
success_url = "http://localhost:8080/account?checkout=success"
cancel_url = "http://localhost:8080/account?checkout=cancelled"

# Payment webhook signing secret
# webhook_secret = "whsec_..."

[session]
# Password for admin sessions (admin sign-in is disabled while unset)
# admin_password = ""

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/plantao/plantao.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_generated_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.billing.trial_days, 7);
        assert_eq!(config.shifts.default_tax_rate_percent, Decimal::from(11));
        assert!(config.backend.url.is_none());
        assert!(config.hosted_backend().unwrap().is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::parse("[shifts]\ndefault_tax_rate_percent = 27.5\n").unwrap();
        assert_eq!(
            config.shifts.default_tax_rate_percent,
            "27.5".parse::<Decimal>().unwrap()
        );
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PLANTAO_API_PORT", "9000"),
            ("PLANTAO_TAX_RATE", "5"),
            ("PLANTAO_ENFORCE_SUBSCRIPTION", "true"),
            ("PLANTAO_BACKEND_URL", "https://backend.example.com"),
            ("PLANTAO_BACKEND_ANON_KEY", "anon"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api.port, 9000);
        assert_eq!(config.shifts.default_tax_rate_percent, Decimal::from(5));
        assert!(config.shifts.enforce_subscription);

        let backend = config.hosted_backend().unwrap().unwrap();
        assert_eq!(backend.url, "https://backend.example.com");
        assert_eq!(backend.anon_key, "anon");
    }

    #[test]
    fn test_backend_requires_anon_key() {
        let mut config = Config::default();
        config.backend.url = Some("https://backend.example.com".to_string());
        assert!(matches!(config.hosted_backend(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_invalid_tax_rate() {
        let mut config = Config::default();
        config.shifts.default_tax_rate_percent = Decimal::from(120);
        assert!(config.tax_policy().is_err());
    }

    #[test]
    fn test_profiles_db_defaults_to_data_dir() {
        let mut config = Config::default();
        config.storage.data_dir = "/tmp/plantao".to_string();
        assert_eq!(config.profiles_db_path(), PathBuf::from("/tmp/plantao/profiles.db"));
    }
}
