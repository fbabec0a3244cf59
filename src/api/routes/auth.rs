//! Auth Routes
//!
//! Thin wrappers over the hosted auth backend. All of them answer 503 when no
//! backend is configured.
//!
//! - POST /api/v1/auth/signup - Create an account with a free trial
//! - POST /api/v1/auth/signin - Password sign-in
//! - POST /api/v1/auth/reset-password - Send a reset email
//! - GET /api/v1/auth/session - Profile behind the bearer token

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::account::AccessState;
use crate::api::dto::{
    AccountResponse, MessageResponse, ResetPasswordRequest, SignInRequest, SignInResponse,
    SignUpRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::{bearer_token, AppState};

/// POST /api/v1/auth/signup
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<AccountResponse>)> {
    let profile = state
        .accounts()?
        .sign_up(&req.email, &req.password, &req.name)
        .await?;

    let access = AccessState::evaluate(&profile, Utc::now());
    Ok((StatusCode::CREATED, Json(AccountResponse::new(profile, access))))
}

/// POST /api/v1/auth/signin
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> ApiResult<Json<SignInResponse>> {
    let signed_in = state.accounts()?.sign_in(&req.email, &req.password).await?;

    let access = AccessState::evaluate(&signed_in.profile, Utc::now());
    Ok(Json(SignInResponse {
        access_token: signed_in.session.access_token,
        refresh_token: signed_in.session.refresh_token,
        expires_in: signed_in.session.expires_in,
        account: AccountResponse::new(signed_in.profile, access),
    }))
}

/// POST /api/v1/auth/reset-password
///
/// Same answer whether or not the email is registered.
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state.accounts()?.reset_password(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "If the email is registered, a reset link is on its way",
    )))
}

/// GET /api/v1/auth/session
pub async fn current_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.accounts()?;
    let token = require_token(&headers)?;
    let profile = accounts.current(token).await?;

    let access = AccessState::evaluate(&profile, Utc::now());
    Ok(Json(AccountResponse::new(profile, access)))
}

/// Bearer token or 401
pub(crate) fn require_token(headers: &HeaderMap) -> ApiResult<&str> {
    bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))
}
