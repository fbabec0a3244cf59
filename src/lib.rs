//! # Plantão
//!
//! Shift logbook for medical professionals - record plantões, follow
//! payments, estimate tax withholding and see where the money comes from.
//!
//! ## Features
//!
//! - **Shift records**: create, edit, import and export shifts with payment status
//! - **Tax withholding**: flat-rate estimate with per-shift overrides
//! - **Dashboard**: totals, outstanding amounts, per-location and monthly series
//! - **Hospitals**: reference list with autocomplete and a map of worked locations
//! - **Accounts**: hosted auth, free trial and subscription gating
//! - **Billing**: checkout sessions and signed payment webhooks
//!
//! ## Modules
//!
//! - [`shifts`]: Shift records, validation, tax and filters
//! - [`dashboard`]: Earnings aggregation
//! - [`hospitals`]: Reference facilities and map markers
//! - [`account`]: Profiles, access state and session flags
//! - [`backend`]: Hosted auth and profiles REST client
//! - [`billing`]: Checkout and payment webhooks
//! - [`storage`]: Persisted JSON slots
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plantao::hospitals::HospitalCatalog;
//! use plantao::shifts::{NewShift, ShiftFilter, ShiftStatus, ShiftStore, TaxPolicy};
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = Arc::new(HospitalCatalog::reference());
//!     let store = ShiftStore::open(Path::new("./plantao_data"), TaxPolicy::default(), catalog)?;
//!
//!     // Log a 12h shift; 11% withholding is derived from the gross amount
//!     let date = NaiveDate::from_ymd_opt(2024, 3, 9).ok_or("bad date")?;
//!     let shift = store
//!         .create(NewShift::new("UPA Santana", date, Decimal::from(12), Decimal::from(1500)))
//!         .await?;
//!     println!("Net: {}", shift.net_amount());
//!
//!     // Mark it paid and summarize what is still owed
//!     store.set_status(&shift.id, ShiftStatus::Paid).await?;
//!     let shifts = store.query(&ShiftFilter::new()).await?;
//!     let summary = plantao::dashboard::summarize(&shifts);
//!     println!("Receivable: {}", summary.receivable_amount);
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod api;
pub mod backend;
pub mod billing;
pub mod config;
pub mod dashboard;
pub mod hospitals;
pub mod shifts;
pub mod storage;
pub mod text;

// Re-export top-level types for convenience
pub use shifts::{
    Coordinates, FacilityType, NewShift, Shift, ShiftError, ShiftFilter, ShiftPatch, ShiftResult,
    ShiftStatus, ShiftStore, TaxPolicy,
};

pub use dashboard::{summarize, DashboardSummary};

pub use hospitals::{map_markers, Hospital, HospitalCatalog, MapMarker};

pub use account::{
    AccessState, AccountError, AccountService, PlanType, Profile, ProfileStore, SessionFlags,
    SessionStore, SqliteProfileStore, SubscriptionStatus,
};

pub use backend::{AuthProvider, BackendConfig, BackendError, HostedBackend};

pub use billing::{BillingError, CheckoutConfig, CheckoutSession, WebhookEvent, WebhookOutcome};

pub use storage::{JsonSlot, StorageError, StorageResult};

pub use api::{build_router, serve, ApiConfig, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
