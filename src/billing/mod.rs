//! Subscription billing
//!
//! - [`checkout`]: checkout session creation (stubbed provider)
//! - [`webhook`]: signed provider webhooks that update profiles

pub mod checkout;
pub mod error;
pub mod webhook;

pub use checkout::{create_checkout_session, CheckoutConfig, CheckoutSession};
pub use error::{BillingError, BillingResult};
pub use webhook::{
    apply_event, handle_webhook, verify_signature, WebhookEvent, WebhookOutcome,
    SIGNATURE_TOLERANCE_SECS,
};
