//! User profile and subscription access
//!
//! A profile starts on a free trial. Writing shifts needs an active trial or
//! a paid subscription; reading is always allowed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Trial notice starts this many days before the end
pub const TRIAL_WARNING_DAYS: i64 = 3;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trial" => Ok(SubscriptionStatus::Trial),
            "active" => Ok(SubscriptionStatus::Active),
            "expired" => Ok(SubscriptionStatus::Expired),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(format!("Unknown subscription status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Annual,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Annual => "annual",
        }
    }
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlanType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "mensal" => Ok(PlanType::Monthly),
            "annual" | "yearly" | "anual" => Ok(PlanType::Annual),
            other => Err(format!("Unknown plan: {}", other)),
        }
    }
}

/// One row of the profiles table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    /// Same id as the auth user
    pub id: String,
    pub name: String,
    pub email: String,
    pub subscription_status: SubscriptionStatus,
    #[serde(default)]
    pub trial_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub plan_type: Option<PlanType>,
    /// Payment provider customer id
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Payment provider subscription id
    #[serde(default)]
    pub subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// A fresh profile whose trial ends `trial_days` after `now`
    pub fn new_trial(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
        trial_days: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            subscription_status: SubscriptionStatus::Trial,
            trial_expires_at: Some(now + Duration::days(i64::from(trial_days))),
            plan_type: None,
            customer_id: None,
            subscription_id: None,
            created_at: now,
            last_login_at: None,
        }
    }

    pub fn access(&self, now: DateTime<Utc>) -> AccessState {
        AccessState::evaluate(self, now)
    }

    /// Apply the present fields of `update`
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.name {
            self.name = name.clone();
        }
        if let Some(status) = update.subscription_status {
            self.subscription_status = status;
        }
        if let Some(expires) = update.trial_expires_at {
            self.trial_expires_at = Some(expires);
        }
        if let Some(plan) = update.plan_type {
            self.plan_type = Some(plan);
        }
        if let Some(customer) = &update.customer_id {
            self.customer_id = Some(customer.clone());
        }
        if let Some(subscription) = &update.subscription_id {
            self.subscription_id = Some(subscription.clone());
        }
        if let Some(login) = update.last_login_at {
            self.last_login_at = Some(login);
        }
    }
}

/// Partial profile update; absent fields are left alone
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trial_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<PlanType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl ProfileUpdate {
    pub fn status(status: SubscriptionStatus) -> Self {
        Self {
            subscription_status: Some(status),
            ..Default::default()
        }
    }

    pub fn login(at: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(at),
            ..Default::default()
        }
    }
}

/// What a profile may do right now
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AccessState {
    /// Trial running; `days_left` is rounded up
    Trial { days_left: i64 },
    Active,
    TrialExpired,
    /// Payment lapsed
    Expired,
    Cancelled,
}

impl AccessState {
    pub fn evaluate(profile: &Profile, now: DateTime<Utc>) -> Self {
        match profile.subscription_status {
            SubscriptionStatus::Active => AccessState::Active,
            SubscriptionStatus::Expired => AccessState::Expired,
            SubscriptionStatus::Cancelled => AccessState::Cancelled,
            SubscriptionStatus::Trial => match profile.trial_expires_at {
                Some(expires) if expires > now => {
                    let seconds = (expires - now).num_seconds();
                    AccessState::Trial {
                        days_left: (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY,
                    }
                }
                _ => AccessState::TrialExpired,
            },
        }
    }

    /// Whether shifts may be created or changed
    pub fn can_write(&self) -> bool {
        matches!(self, AccessState::Trial { .. } | AccessState::Active)
    }

    /// Notice to show above the app, if any
    pub fn banner(&self) -> Option<String> {
        match self {
            AccessState::Trial { days_left } if *days_left <= TRIAL_WARNING_DAYS => {
                let unit = if *days_left == 1 { "day" } else { "days" };
                Some(format!(
                    "Your free trial ends in {} {}. Subscribe to keep logging shifts.",
                    days_left, unit
                ))
            }
            AccessState::Trial { .. } | AccessState::Active => None,
            AccessState::TrialExpired => Some(
                "Your free trial has ended. Subscribe to keep logging shifts.".to_string(),
            ),
            AccessState::Expired => Some(
                "Your last payment failed. Update your payment method to restore access."
                    .to_string(),
            ),
            AccessState::Cancelled => Some(
                "Your subscription was cancelled. Subscribe again to keep logging shifts."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_at(now: DateTime<Utc>) -> Profile {
        Profile::new_trial("u1", "Dra. Ana", "ana@example.com", now, 7)
    }

    #[test]
    fn test_new_trial() {
        let now = Utc::now();
        let profile = profile_at(now);
        assert_eq!(profile.subscription_status, SubscriptionStatus::Trial);
        assert_eq!(profile.trial_expires_at, Some(now + Duration::days(7)));
        assert_eq!(profile.access(now), AccessState::Trial { days_left: 7 });
    }

    #[test]
    fn test_days_left_rounds_up() {
        let now = Utc::now();
        let profile = profile_at(now);

        let later = now + Duration::days(4) + Duration::hours(1);
        assert_eq!(profile.access(later), AccessState::Trial { days_left: 3 });

        let last_minute = now + Duration::days(7) - Duration::minutes(1);
        assert_eq!(profile.access(last_minute), AccessState::Trial { days_left: 1 });
    }

    #[test]
    fn test_trial_expires() {
        let now = Utc::now();
        let profile = profile_at(now);
        let state = profile.access(now + Duration::days(7));
        assert_eq!(state, AccessState::TrialExpired);
        assert!(!state.can_write());
    }

    #[test]
    fn test_can_write() {
        assert!(AccessState::Active.can_write());
        assert!(AccessState::Trial { days_left: 2 }.can_write());
        assert!(!AccessState::Expired.can_write());
        assert!(!AccessState::Cancelled.can_write());
    }

    #[test]
    fn test_banner() {
        assert!(AccessState::Active.banner().is_none());
        assert!(AccessState::Trial { days_left: 5 }.banner().is_none());

        let banner = AccessState::Trial { days_left: 1 }.banner().unwrap();
        assert!(banner.contains("1 day."));
        assert!(AccessState::Cancelled.banner().is_some());
        assert!(AccessState::Expired.banner().unwrap().contains("payment"));
    }

    #[test]
    fn test_apply_update() {
        let mut profile = profile_at(Utc::now());
        let update = ProfileUpdate {
            subscription_status: Some(SubscriptionStatus::Active),
            plan_type: Some(PlanType::Annual),
            customer_id: Some("cus_1".to_string()),
            ..Default::default()
        };
        profile.apply(&update);

        assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
        assert_eq!(profile.plan_type, Some(PlanType::Annual));
        assert_eq!(profile.customer_id.as_deref(), Some("cus_1"));
        assert!(profile.subscription_id.is_none());
    }

    #[test]
    fn test_access_state_json_shape() {
        let json = serde_json::to_value(AccessState::Trial { days_left: 2 }).unwrap();
        assert_eq!(json["state"], "trial");
        assert_eq!(json["days_left"], 2);

        let json = serde_json::to_value(AccessState::TrialExpired).unwrap();
        assert_eq!(json["state"], "trial_expired");
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let json = serde_json::to_value(ProfileUpdate::status(SubscriptionStatus::Cancelled)).unwrap();
        assert_eq!(json, serde_json::json!({ "subscription_status": "cancelled" }));
    }
}
