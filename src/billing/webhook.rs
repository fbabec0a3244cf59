//! Payment provider webhooks
//!
//! Verifies the `t=<unix>,v1=<hex>` signature header, parses the event and
//! relays its fields into the matching profile:
//!
//! | Event                           | Profile lookup                                      | New status  |
//! |---------------------------------|-----------------------------------------------------|-------------|
//! | `checkout.session.completed`    | client reference, `metadata.user_id`, then email    | `active`    |
//! | `customer.subscription.deleted` | subscription id, then customer id                   | `cancelled` |
//! | `invoice.payment_failed`        | subscription id, then customer id                   | `expired`   |

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::account::{PlanType, Profile, ProfileStore, ProfileUpdate, SubscriptionStatus};
use crate::billing::error::{BillingError, BillingResult};
use crate::text::constant_time_compare;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed payload
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const PAYMENT_FAILED: &str = "invoice.payment_failed";

/// Check a signature header against the raw body
pub fn verify_signature(
    header: &str,
    body: &[u8],
    secret: &str,
    now: DateTime<Utc>,
) -> BillingResult<()> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| BillingError::InvalidSignature("missing timestamp".to_string()))?;
    if signatures.is_empty() {
        return Err(BillingError::InvalidSignature("missing v1 signature".to_string()));
    }

    let ts: i64 = timestamp
        .parse()
        .map_err(|_| BillingError::InvalidSignature("invalid timestamp".to_string()))?;
    let skew = now
        .timestamp()
        .checked_sub(ts)
        .and_then(i64::checked_abs)
        .unwrap_or(i64::MAX);
    if skew > SIGNATURE_TOLERANCE_SECS {
        return Err(BillingError::InvalidSignature(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let expected = sign(timestamp, body, secret)?;
    if !signatures
        .iter()
        .any(|candidate| constant_time_compare(&expected, candidate))
    {
        return Err(BillingError::InvalidSignature("signature mismatch".to_string()));
    }

    tracing::debug!("Webhook signature verified");
    Ok(())
}

/// Hex HMAC-SHA256 of `"<timestamp>.<body>"`
pub fn sign(timestamp: &str, body: &[u8], secret: &str) -> BillingResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| BillingError::InvalidSignature(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Event envelope as the provider sends it
#[derive(Debug, Clone, Deserialize)]
struct RawEvent {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

/// The events that change a profile
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    CheckoutCompleted {
        client_reference_id: Option<String>,
        user_id: Option<String>,
        customer_email: Option<String>,
        plan: Option<PlanType>,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    SubscriptionDeleted {
        subscription_id: Option<String>,
        customer_id: Option<String>,
    },
    PaymentFailed {
        subscription_id: Option<String>,
        customer_id: Option<String>,
    },
    /// Acknowledged without effect
    Other { event_type: String },
}

fn string_at(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> BillingResult<Self> {
        let raw: RawEvent = serde_json::from_slice(body)
            .map_err(|e| BillingError::InvalidPayload(e.to_string()))?;
        let object = &raw.data.object;

        tracing::debug!(event_id = ?raw.id, event_type = %raw.event_type, "Parsed webhook event");

        let event = match raw.event_type.as_str() {
            CHECKOUT_COMPLETED => WebhookEvent::CheckoutCompleted {
                client_reference_id: string_at(object, "/client_reference_id"),
                user_id: string_at(object, "/metadata/user_id"),
                customer_email: string_at(object, "/customer_email")
                    .or_else(|| string_at(object, "/customer_details/email")),
                plan: string_at(object, "/metadata/plan").and_then(|p| p.parse().ok()),
                customer_id: string_at(object, "/customer"),
                subscription_id: string_at(object, "/subscription"),
            },
            SUBSCRIPTION_DELETED => WebhookEvent::SubscriptionDeleted {
                subscription_id: string_at(object, "/id"),
                customer_id: string_at(object, "/customer"),
            },
            PAYMENT_FAILED => WebhookEvent::PaymentFailed {
                subscription_id: string_at(object, "/subscription"),
                customer_id: string_at(object, "/customer"),
            },
            _ => WebhookEvent::Other {
                event_type: raw.event_type.clone(),
            },
        };

        Ok(event)
    }

    pub fn event_type(&self) -> &str {
        match self {
            WebhookEvent::CheckoutCompleted { .. } => CHECKOUT_COMPLETED,
            WebhookEvent::SubscriptionDeleted { .. } => SUBSCRIPTION_DELETED,
            WebhookEvent::PaymentFailed { .. } => PAYMENT_FAILED,
            WebhookEvent::Other { event_type } => event_type,
        }
    }
}

/// What a delivered event did
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Applied {
        event_type: String,
        profile_id: String,
        subscription_status: SubscriptionStatus,
    },
    Ignored {
        event_type: String,
    },
    ProfileNotFound {
        event_type: String,
    },
}

/// Apply an event to the profiles table
pub async fn apply_event(
    event: &WebhookEvent,
    profiles: &dyn ProfileStore,
) -> BillingResult<WebhookOutcome> {
    let event_type = event.event_type().to_string();

    let (profile, update) = match event {
        WebhookEvent::CheckoutCompleted {
            client_reference_id,
            user_id,
            customer_email,
            plan,
            customer_id,
            subscription_id,
        } => {
            let profile = find_checkout_profile(
                profiles,
                client_reference_id.as_deref(),
                user_id.as_deref(),
                customer_email.as_deref(),
            )
            .await?;
            let update = ProfileUpdate {
                subscription_status: Some(SubscriptionStatus::Active),
                plan_type: *plan,
                customer_id: customer_id.clone(),
                subscription_id: subscription_id.clone(),
                ..Default::default()
            };
            (profile, update)
        }
        WebhookEvent::SubscriptionDeleted {
            subscription_id,
            customer_id,
        } => {
            let profile = find_subscriber(profiles, subscription_id.as_deref(), customer_id.as_deref())
                .await?;
            (profile, ProfileUpdate::status(SubscriptionStatus::Cancelled))
        }
        WebhookEvent::PaymentFailed {
            subscription_id,
            customer_id,
        } => {
            let profile = find_subscriber(profiles, subscription_id.as_deref(), customer_id.as_deref())
                .await?;
            (profile, ProfileUpdate::status(SubscriptionStatus::Expired))
        }
        WebhookEvent::Other { .. } => {
            tracing::debug!(event_type = %event_type, "Ignoring webhook event");
            return Ok(WebhookOutcome::Ignored { event_type });
        }
    };

    let Some(profile) = profile else {
        tracing::warn!(event_type = %event_type, "No profile matches webhook event");
        return Ok(WebhookOutcome::ProfileNotFound { event_type });
    };

    let updated = profiles.update(&profile.id, update).await?;

    tracing::info!(
        event_type = %event_type,
        profile_id = %updated.id,
        status = %updated.subscription_status,
        "Applied webhook event"
    );

    Ok(WebhookOutcome::Applied {
        event_type,
        profile_id: updated.id,
        subscription_status: updated.subscription_status,
    })
}

async fn find_checkout_profile(
    profiles: &dyn ProfileStore,
    client_reference_id: Option<&str>,
    user_id: Option<&str>,
    email: Option<&str>,
) -> BillingResult<Option<Profile>> {
    for id in [client_reference_id, user_id].into_iter().flatten() {
        if let Some(profile) = profiles.get(id).await? {
            return Ok(Some(profile));
        }
    }
    match email {
        Some(email) => Ok(profiles.find_by_email(email).await?),
        None => Ok(None),
    }
}

async fn find_subscriber(
    profiles: &dyn ProfileStore,
    subscription_id: Option<&str>,
    customer_id: Option<&str>,
) -> BillingResult<Option<Profile>> {
    if let Some(id) = subscription_id {
        if let Some(profile) = profiles.find_by_subscription(id).await? {
            return Ok(Some(profile));
        }
    }
    match customer_id {
        Some(id) => Ok(profiles.find_by_customer(id).await?),
        None => Ok(None),
    }
}

/// Verify (when a secret is configured), parse and apply one delivery
pub async fn handle_webhook(
    body: &[u8],
    signature: Option<&str>,
    secret: Option<&str>,
    profiles: &dyn ProfileStore,
) -> BillingResult<WebhookOutcome> {
    match secret.filter(|s| !s.is_empty()) {
        Some(secret) => {
            let header = signature.ok_or_else(|| {
                BillingError::InvalidSignature("missing signature header".to_string())
            })?;
            verify_signature(header, body, secret, Utc::now())?;
        }
        None => {
            tracing::warn!("Webhook secret not configured; skipping signature check");
        }
    }

    let event = WebhookEvent::parse(body)?;
    apply_event(&event, profiles).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::SqliteProfileStore;

    const SECRET: &str = "whsec_test";

    fn signed_header(body: &[u8], at: DateTime<Utc>) -> String {
        let ts = at.timestamp().to_string();
        format!("t={},v1={}", ts, sign(&ts, body, SECRET).unwrap())
    }

    async fn store_with(profile: Profile) -> SqliteProfileStore {
        let store = SqliteProfileStore::in_memory().unwrap();
        store.insert(profile).await.unwrap();
        store
    }

    fn trial(id: &str, email: &str) -> Profile {
        Profile::new_trial(id, "Ana", email, Utc::now(), 7)
    }

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"type":"ping"}"#;
        let now = Utc::now();
        assert!(verify_signature(&signed_header(body, now), body, SECRET, now).is_ok());
    }

    #[test]
    fn test_signature_rejects_tampering() {
        let body = br#"{"type":"ping"}"#;
        let now = Utc::now();
        let header = signed_header(body, now);

        assert!(verify_signature(&header, br#"{"type":"pong"}"#, SECRET, now).is_err());
        assert!(verify_signature(&header, body, "other_secret", now).is_err());
        assert!(verify_signature("v1=abc", body, SECRET, now).is_err());
        assert!(verify_signature("t=123", body, SECRET, now).is_err());
    }

    #[test]
    fn test_signature_tolerance() {
        let body = b"{}";
        let signed_at = Utc::now();
        let header = signed_header(body, signed_at);

        let late = signed_at + chrono::Duration::seconds(SIGNATURE_TOLERANCE_SECS + 1);
        assert!(verify_signature(&header, body, SECRET, late).is_err());

        let in_time = signed_at + chrono::Duration::seconds(SIGNATURE_TOLERANCE_SECS - 1);
        assert!(verify_signature(&header, body, SECRET, in_time).is_ok());

        for extreme in ["t=-9223372036854775808,v1=00", "t=9223372036854775807,v1=00"] {
            assert!(matches!(
                verify_signature(extreme, body, SECRET, signed_at),
                Err(BillingError::InvalidSignature(_))
            ));
        }
    }

    #[test]
    fn test_parse_checkout_completed() {
        let body = serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "client_reference_id": "u1",
                "customer": "cus_1",
                "subscription": "sub_1",
                "customer_details": { "email": "ana@example.com" },
                "metadata": { "plan": "annual" }
            }}
        });
        let event = WebhookEvent::parse(body.to_string().as_bytes()).unwrap();
        assert_eq!(
            event,
            WebhookEvent::CheckoutCompleted {
                client_reference_id: Some("u1".to_string()),
                user_id: None,
                customer_email: Some("ana@example.com".to_string()),
                plan: Some(PlanType::Annual),
                customer_id: Some("cus_1".to_string()),
                subscription_id: Some("sub_1".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            WebhookEvent::parse(b"not json"),
            Err(BillingError::InvalidPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_activates_profile_by_email() {
        let store = store_with(trial("u1", "ana@example.com")).await;
        let event = WebhookEvent::CheckoutCompleted {
            client_reference_id: None,
            user_id: Some("unknown".to_string()),
            customer_email: Some("ANA@example.com".to_string()),
            plan: Some(PlanType::Monthly),
            customer_id: Some("cus_1".to_string()),
            subscription_id: Some("sub_1".to_string()),
        };

        let outcome = apply_event(&event, &store).await.unwrap();
        assert_eq!(
            outcome,
            WebhookOutcome::Applied {
                event_type: CHECKOUT_COMPLETED.to_string(),
                profile_id: "u1".to_string(),
                subscription_status: SubscriptionStatus::Active,
            }
        );

        let profile = store.get("u1").await.unwrap().unwrap();
        assert_eq!(profile.plan_type, Some(PlanType::Monthly));
        assert_eq!(profile.subscription_id.as_deref(), Some("sub_1"));
    }

    #[tokio::test]
    async fn test_subscription_deleted_and_payment_failed() {
        let mut profile = trial("u1", "ana@example.com");
        profile.subscription_status = SubscriptionStatus::Active;
        profile.customer_id = Some("cus_1".to_string());
        profile.subscription_id = Some("sub_1".to_string());
        let store = store_with(profile).await;

        let failed = WebhookEvent::PaymentFailed {
            subscription_id: None,
            customer_id: Some("cus_1".to_string()),
        };
        apply_event(&failed, &store).await.unwrap();
        let current = store.get("u1").await.unwrap().unwrap();
        assert_eq!(current.subscription_status, SubscriptionStatus::Expired);

        let deleted = WebhookEvent::SubscriptionDeleted {
            subscription_id: Some("sub_1".to_string()),
            customer_id: None,
        };
        apply_event(&deleted, &store).await.unwrap();
        let current = store.get("u1").await.unwrap().unwrap();
        assert_eq!(current.subscription_status, SubscriptionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_unknown_profile_and_other_events() {
        let store = SqliteProfileStore::in_memory().unwrap();

        let deleted = WebhookEvent::SubscriptionDeleted {
            subscription_id: Some("sub_x".to_string()),
            customer_id: None,
        };
        assert!(matches!(
            apply_event(&deleted, &store).await.unwrap(),
            WebhookOutcome::ProfileNotFound { .. }
        ));

        let other = WebhookEvent::Other {
            event_type: "charge.refunded".to_string(),
        };
        assert!(matches!(
            apply_event(&other, &store).await.unwrap(),
            WebhookOutcome::Ignored { .. }
        ));
    }

    #[tokio::test]
    async fn test_handle_webhook_checks_signature_when_configured() {
        let store = store_with(trial("u1", "ana@example.com")).await;
        let body = serde_json::json!({
            "type": "invoice.payment_failed",
            "data": { "object": { "customer": "cus_404" } }
        })
        .to_string();

        let unsigned = handle_webhook(body.as_bytes(), None, Some(SECRET), &store).await;
        assert!(matches!(unsigned, Err(BillingError::InvalidSignature(_))));

        let header = signed_header(body.as_bytes(), Utc::now());
        let outcome = handle_webhook(body.as_bytes(), Some(header.as_str()), Some(SECRET), &store)
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::ProfileNotFound { .. }));

        let skipped = handle_webhook(body.as_bytes(), None, None, &store).await;
        assert!(skipped.is_ok());
    }
}
