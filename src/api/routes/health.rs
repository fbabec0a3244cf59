//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ready to serve traffic)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// Id that never exists; looking it up exercises the profiles table
const PROBE_PROFILE_ID: &str = "__health_probe__";

/// GET /health/live
///
/// Kubernetes liveness probe.
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Kubernetes readiness probe.
/// Returns 200 once the shift data directory is writable.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    if check_storage_health(&state) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health
///
/// Full health status with component details.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let storage_ok = check_storage_health(&state);
    let profiles_ok = check_profiles_health(&state).await;

    let overall_status = match (storage_ok, profiles_ok) {
        (true, true) => "healthy",
        (true, false) | (false, true) => "degraded",
        (false, false) => "unhealthy",
    };

    Json(HealthResponse {
        status: overall_status.to_string(),
        storage: status_label(storage_ok),
        profiles: status_label(profiles_ok),
        profile_store: state.profiles.kind().to_string(),
        auth: if state.has_accounts() { "enabled" } else { "disabled" }.to_string(),
        shift_count: state.shifts.count().await,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

fn status_label(ok: bool) -> String {
    if ok { "ok" } else { "error" }.to_string()
}

/// Shift slot directory still exists
fn check_storage_health(state: &AppState) -> bool {
    state.shifts.data_dir().is_dir()
}

/// Profiles table answers a lookup
async fn check_profiles_health(state: &AppState) -> bool {
    match state.profiles.get(PROBE_PROFILE_ID).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, store = state.profiles.kind(), "Profiles health check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let status = liveness().await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_status_label() {
        assert_eq!(status_label(true), "ok");
        assert_eq!(status_label(false), "error");
    }
}
