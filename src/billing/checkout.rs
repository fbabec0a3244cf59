//! Checkout sessions
//!
//! The payment provider is stubbed: a session id is minted locally and the
//! caller is sent straight to the success URL.

use serde::{Deserialize, Serialize};

use crate::account::{PlanType, Profile};
use crate::billing::error::{BillingError, BillingResult};

/// Prices and redirect targets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutConfig {
    pub monthly_price_cents: u64,
    pub annual_price_cents: u64,
    /// ISO 4217 code, lowercase
    pub currency: String,
    /// May contain `{CHECKOUT_SESSION_ID}`; otherwise `session_id` is appended
    pub success_url: String,
    pub cancel_url: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            monthly_price_cents: 4_990,
            annual_price_cents: 47_900,
            currency: "brl".to_string(),
            success_url: "http://localhost:8080/account?checkout=success".to_string(),
            cancel_url: "http://localhost:8080/account?checkout=cancelled".to_string(),
        }
    }
}

impl CheckoutConfig {
    pub fn price_cents(&self, plan: PlanType) -> u64 {
        match plan {
            PlanType::Monthly => self.monthly_price_cents,
            PlanType::Annual => self.annual_price_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    /// Where to send the browser
    pub url: String,
    pub cancel_url: String,
    pub plan: PlanType,
    pub amount_cents: u64,
    pub currency: String,
    /// Profile the session was opened for (echoed back by the completion webhook)
    pub client_reference_id: String,
    pub stub: bool,
}

/// Open a checkout session for `plan`
pub fn create_checkout_session(
    config: &CheckoutConfig,
    plan: PlanType,
    profile: &Profile,
) -> BillingResult<CheckoutSession> {
    if config.success_url.trim().is_empty() {
        return Err(BillingError::InvalidRequest(
            "checkout success URL is not configured".to_string(),
        ));
    }

    let id = format!("cs_stub_{}", uuid::Uuid::new_v4().simple());

    tracing::warn!(
        session_id = %id,
        profile_id = %profile.id,
        plan = %plan,
        "Payment provider is stubbed; no charge was made"
    );

    Ok(CheckoutSession {
        url: success_url(&config.success_url, &id),
        cancel_url: config.cancel_url.clone(),
        plan,
        amount_cents: config.price_cents(plan),
        currency: config.currency.clone(),
        client_reference_id: profile.id.clone(),
        stub: true,
        id,
    })
}

fn success_url(template: &str, session_id: &str) -> String {
    if template.contains("{CHECKOUT_SESSION_ID}") {
        return template.replace("{CHECKOUT_SESSION_ID}", session_id);
    }
    let separator = if template.contains('?') { '&' } else { '?' };
    format!("{}{}session_id={}", template, separator, session_id)
}
