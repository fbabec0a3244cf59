//! Subscription Routes
//!
//! - GET /api/v1/subscription/status - Access state and banner for the caller
//! - POST /api/v1/subscription/cancel - Cancel the caller's subscription
//! - POST /api/v1/checkout - Open a checkout session
//! - POST /api/v1/webhooks/payment - Payment provider events

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

use crate::account::AccessState;
use crate::api::dto::{AccountResponse, CheckoutRequest, SubscriptionStatusResponse};
use crate::api::error::ApiResult;
use crate::api::routes::auth::require_token;
use crate::api::state::{bearer_token, AppState};
use crate::billing::{create_checkout_session, handle_webhook, CheckoutSession, WebhookOutcome};

/// Header carrying `t=<ts>,v1=<hex>`
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// GET /api/v1/subscription/status
///
/// Works without a token: anonymous callers just get the session flags.
pub async fn subscription_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SubscriptionStatusResponse>> {
    let session = state.sessions.flags().await;
    let enforced = state.config.enforce_subscription;

    let profile = match (bearer_token(&headers), &state.accounts) {
        (Some(token), Some(accounts)) => Some(accounts.current(token).await?),
        _ => None,
    };
    let access = profile
        .as_ref()
        .map(|p| AccessState::evaluate(p, Utc::now()));

    let can_write = !enforced
        || session.bypasses_subscription()
        || access.map(|a| a.can_write()).unwrap_or(false);

    Ok(Json(SubscriptionStatusResponse {
        enforced,
        can_write,
        banner: access.and_then(|a| a.banner()),
        session,
        profile,
        access,
    }))
}

/// POST /api/v1/subscription/cancel
pub async fn cancel_subscription(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<AccountResponse>> {
    let accounts = state.accounts()?;
    let token = require_token(&headers)?;
    let profile = accounts.cancel(token).await?;

    let access = AccessState::evaluate(&profile, Utc::now());
    Ok(Json(AccountResponse::new(profile, access)))
}

/// POST /api/v1/checkout
///
/// The payment provider is stubbed: the session URL points straight at the
/// success page.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CheckoutRequest>,
) -> ApiResult<Json<CheckoutSession>> {
    let accounts = state.accounts()?;
    let token = require_token(&headers)?;
    let profile = accounts.current(token).await?;

    let session = create_checkout_session(&state.checkout, req.plan, &profile)?;
    Ok(Json(session))
}

/// POST /api/v1/webhooks/payment
///
/// Acknowledged with 200 whenever the signature and payload are valid, even
/// if no profile matched.
pub async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<WebhookOutcome>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let outcome = handle_webhook(
        &body,
        signature,
        state.webhook_secret.as_deref(),
        state.profiles.as_ref(),
    )
    .await?;

    tracing::info!(outcome = ?outcome, "Payment webhook processed");
    Ok(Json(outcome))
}
