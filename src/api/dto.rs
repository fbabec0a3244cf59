//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Domain types (`Shift`, `NewShift`, `Profile`, ...) are sent as-is; these
//! wrap them with the envelopes the endpoints need.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::account::{AccessState, PlanType, Profile, SessionFlags};
use crate::hospitals::{Hospital, MapMarker};
use crate::shifts::{NewShift, Shift, ShiftFilter, ShiftStatus};

// ============================================
// SHIFT DTOs
// ============================================

/// Filter query string shared by list, export, dashboard and map
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<ShiftStatus>,
}

impl FilterParams {
    pub fn to_filter(&self) -> ShiftFilter {
        ShiftFilter {
            from: self.from,
            to: self.to,
            location: self.location.clone().filter(|l| !l.trim().is_empty()),
            status: self.status,
        }
    }
}

/// Shift list response
#[derive(Debug, Serialize)]
pub struct ShiftListResponse {
    pub shifts: Vec<Shift>,
    pub count: usize,
}

/// Batch import request
#[derive(Debug, Deserialize)]
pub struct BatchShiftRequest {
    pub shifts: Vec<NewShift>,
}

/// Batch import response
#[derive(Debug, Serialize)]
pub struct BatchShiftResponse {
    /// Status: "ok", "partial" or "failed"
    pub status: String,
    /// Number of shifts created
    pub accepted: usize,
    /// Number of shifts rejected
    pub rejected: usize,
    /// Ids of the created shifts, in input order
    pub created: Vec<String>,
    /// Errors for rejected shifts
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<BatchError>,
}

/// Error for a single shift in a batch
#[derive(Debug, Serialize)]
pub struct BatchError {
    /// Index of the failed shift
    pub index: usize,
    /// Error message
    pub error: String,
}

/// Status transition request
#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: ShiftStatus,
}

/// Export query parameters
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// Output format: csv or json
    #[serde(default = "default_export_format")]
    pub format: String,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<ShiftStatus>,
}

fn default_export_format() -> String {
    "csv".to_string()
}

impl ExportParams {
    pub fn to_filter(&self) -> ShiftFilter {
        FilterParams {
            from: self.from,
            to: self.to,
            location: self.location.clone(),
            status: self.status,
        }
        .to_filter()
    }
}

// ============================================
// HOSPITAL DTOs
// ============================================

/// Autocomplete query parameters
#[derive(Debug, Deserialize)]
pub struct HospitalSearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HospitalSearchResponse {
    pub hospitals: Vec<Hospital>,
    pub count: usize,
}

/// Map response
#[derive(Debug, Serialize)]
pub struct MapResponse {
    pub markers: Vec<MapMarker>,
    /// Filtered shifts without coordinates (not plotted)
    pub unmapped: usize,
}

// ============================================
// AUTH DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The caller's profile and what it may do
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub profile: Profile,
    pub access: AccessState,
    pub can_write: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl AccountResponse {
    pub fn new(profile: Profile, access: AccessState) -> Self {
        Self {
            can_write: access.can_write(),
            banner: access.banner(),
            profile,
            access,
        }
    }
}

/// Sign-in response: tokens plus the account
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(flatten)]
    pub account: AccountResponse,
}

// ============================================
// SUBSCRIPTION DTOs
// ============================================

/// Subscription status response
#[derive(Debug, Serialize)]
pub struct SubscriptionStatusResponse {
    /// Whether shift changes are gated at all
    pub enforced: bool,
    /// Whether this caller may change shifts right now
    pub can_write: bool,
    pub session: SessionFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: PlanType,
}

// ============================================
// SESSION DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct AdminSignInRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub flags: SessionFlags,
    /// Whether an admin password is configured
    pub admin_enabled: bool,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy"
    pub status: String,
    /// Shift storage status
    pub storage: String,
    /// Profiles table status
    pub profiles: String,
    /// "sqlite" or "hosted"
    pub profile_store: String,
    /// Hosted auth: "enabled" or "disabled"
    pub auth: String,
    /// Stored shifts
    pub shift_count: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// API version
    pub version: String,
}
