//! Session Routes
//!
//! Demo and admin flags for this installation. The flags are shared by every
//! caller; entering demo mode needs no credentials.
//!
//! - GET /api/v1/session - Current flags
//! - DELETE /api/v1/session - Sign out of demo/admin
//! - POST /api/v1/session/demo - Enter demo mode
//! - POST /api/v1/session/admin - Admin sign-in

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{AdminSignInRequest, SessionResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(SessionResponse {
        flags: state.sessions.flags().await,
        admin_enabled: state.sessions.admin_enabled(),
    })
}

/// DELETE /api/v1/session
pub async fn clear_session(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.sessions.clear().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/session/demo
pub async fn enter_demo(State(state): State<Arc<AppState>>) -> ApiResult<Json<SessionResponse>> {
    let flags = state.sessions.enter_demo().await?;
    Ok(Json(SessionResponse {
        flags,
        admin_enabled: state.sessions.admin_enabled(),
    }))
}

/// POST /api/v1/session/admin
pub async fn sign_in_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminSignInRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let flags = state.sessions.sign_in_admin(&req.password).await?;
    Ok(Json(SessionResponse {
        flags,
        admin_enabled: true,
    }))
}
