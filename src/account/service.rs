//! Account flows
//!
//! Glues the hosted auth provider to the profiles table: sign-up creates the
//! trial profile, sign-in stamps the login time, and a token resolves to its
//! profile.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::account::error::{AccountError, AccountResult};
use crate::account::profile::{Profile, ProfileUpdate, SubscriptionStatus};
use crate::account::store::ProfileStore;
use crate::backend::{validate_email, validate_password, AuthProvider, AuthSession, AuthUser, BackendError};

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub session: AuthSession,
    pub profile: Profile,
}

pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    trial_days: u32,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>, profiles: Arc<dyn ProfileStore>, trial_days: u32) -> Self {
        Self {
            auth,
            profiles,
            trial_days,
        }
    }

    pub fn profiles(&self) -> &Arc<dyn ProfileStore> {
        &self.profiles
    }

    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> AccountResult<Profile> {
        let email = email.trim();
        let name = name.trim();
        validate_email(email)?;
        validate_password(password)?;
        if name.is_empty() {
            return Err(BackendError::InvalidInput("Name cannot be empty".to_string()).into());
        }

        let user = self.auth.sign_up(email, password, name).await?;
        let profile = Profile::new_trial(&user.id, name, email, Utc::now(), self.trial_days);
        let profile = self.profiles.insert(profile).await?;

        tracing::info!(profile_id = %profile.id, trial_days = self.trial_days, "Account created");
        Ok(profile)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AccountResult<SignedIn> {
        let email = email.trim();
        validate_email(email)?;

        let session = self.auth.sign_in(email, password).await?;
        self.ensure_profile(&session.user).await?;
        let profile = self
            .profiles
            .update(&session.user.id, ProfileUpdate::login(Utc::now()))
            .await?;

        tracing::info!(profile_id = %profile.id, "Signed in");
        Ok(SignedIn { session, profile })
    }

    pub async fn reset_password(&self, email: &str) -> AccountResult<()> {
        let email = email.trim();
        validate_email(email)?;
        self.auth.reset_password(email).await?;
        tracing::info!("Password reset requested");
        Ok(())
    }

    /// Profile behind an access token
    pub async fn current(&self, access_token: &str) -> AccountResult<Profile> {
        let user = self.auth.get_user(access_token).await?;
        self.ensure_profile(&user).await
    }

    /// Mark the caller's subscription as cancelled
    pub async fn cancel(&self, access_token: &str) -> AccountResult<Profile> {
        let profile = self.current(access_token).await?;
        let profile = self
            .profiles
            .update(&profile.id, ProfileUpdate::status(SubscriptionStatus::Cancelled))
            .await?;

        tracing::info!(profile_id = %profile.id, "Subscription cancelled");
        Ok(profile)
    }

    /// The user's profile, creating a trial one if the row is missing
    async fn ensure_profile(&self, user: &AuthUser) -> AccountResult<Profile> {
        if let Some(profile) = self.profiles.get(&user.id).await? {
            return Ok(profile);
        }

        tracing::warn!(profile_id = %user.id, "Profile missing, creating trial profile");
        let profile = Profile::new_trial(
            &user.id,
            user.display_name(),
            &user.email,
            Utc::now(),
            self.trial_days,
        );
        match self.profiles.insert(profile).await {
            Err(AccountError::Conflict(_)) => self
                .profiles
                .get(&user.id)
                .await?
                .ok_or_else(|| AccountError::NotFound(user.id.clone())),
            other => other,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::account::store::SqliteProfileStore;
    use crate::account::AccessState;
    use crate::backend::BackendResult;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// In-memory auth provider: users by email, token = "token-<id>"
    #[derive(Default)]
    pub(crate) struct FakeAuth {
        users: Mutex<HashMap<String, (AuthUser, String)>>,
    }

    impl FakeAuth {
        /// Register a user directly, bypassing `sign_up`
        pub(crate) async fn add_user(&self, id: &str, email: &str, password: &str) {
            let user = AuthUser {
                id: id.to_string(),
                email: email.to_string(),
                user_metadata: serde_json::Value::Null,
            };
            self.users
                .lock()
                .await
                .insert(email.to_string(), (user, password.to_string()));
        }
    }

    #[async_trait]
    impl AuthProvider for FakeAuth {
        async fn sign_up(&self, email: &str, password: &str, name: &str) -> BackendResult<AuthUser> {
            let mut users = self.users.lock().await;
            if users.contains_key(email) {
                return Err(BackendError::Api {
                    status: 422,
                    message: "User already registered".to_string(),
                });
            }
            let user = AuthUser {
                id: format!("user-{}", users.len() + 1),
                email: email.to_string(),
                user_metadata: serde_json::json!({ "name": name }),
            };
            users.insert(email.to_string(), (user.clone(), password.to_string()));
            Ok(user)
        }

        async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
            let users = self.users.lock().await;
            match users.get(email) {
                Some((user, stored)) if stored == password => Ok(AuthSession {
                    access_token: format!("token-{}", user.id),
                    refresh_token: None,
                    expires_in: Some(3600),
                    user: user.clone(),
                }),
                _ => Err(BackendError::InvalidCredentials),
            }
        }

        async fn reset_password(&self, _email: &str) -> BackendResult<()> {
            Ok(())
        }

        async fn get_user(&self, access_token: &str) -> BackendResult<AuthUser> {
            let users = self.users.lock().await;
            users
                .values()
                .map(|(user, _)| user)
                .find(|user| format!("token-{}", user.id) == access_token)
                .cloned()
                .ok_or(BackendError::InvalidCredentials)
        }
    }

    fn service() -> (Arc<FakeAuth>, AccountService) {
        let auth = Arc::new(FakeAuth::default());
        let profiles = Arc::new(SqliteProfileStore::in_memory().unwrap());
        let service = AccountService::new(auth.clone(), profiles, 7);
        (auth, service)
    }

    #[tokio::test]
    async fn test_sign_up_creates_trial_profile() {
        let (_auth, service) = service();
        let profile = service
            .sign_up(" ana@example.com ", "12345678", "Dra. Ana")
            .await
            .unwrap();

        assert_eq!(profile.email, "ana@example.com");
        assert_eq!(profile.subscription_status, SubscriptionStatus::Trial);
        assert_eq!(profile.access(Utc::now()), AccessState::Trial { days_left: 7 });
    }

    #[tokio::test]
    async fn test_sign_up_validates_input() {
        let (_auth, service) = service();
        assert!(service.sign_up("not-an-email", "12345678", "Ana").await.is_err());
        assert!(service.sign_up("ana@example.com", "short", "Ana").await.is_err());
        assert!(service.sign_up("ana@example.com", "12345678", "  ").await.is_err());
    }

    #[tokio::test]
    async fn test_sign_in_stamps_login_and_creates_missing_profile() {
        let (auth, service) = service();
        auth.add_user("u7", "joao@example.com", "secret-pass").await;

        let signed_in = service.sign_in("joao@example.com", "secret-pass").await.unwrap();
        assert_eq!(signed_in.profile.id, "u7");
        assert_eq!(signed_in.profile.name, "joao");
        assert!(signed_in.profile.last_login_at.is_some());

        assert!(matches!(
            service.sign_in("joao@example.com", "bad-pass").await,
            Err(AccountError::Backend(BackendError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_current_and_cancel() {
        let (_auth, service) = service();
        let profile = service.sign_up("ana@example.com", "12345678", "Ana").await.unwrap();
        let token = format!("token-{}", profile.id);

        assert_eq!(service.current(&token).await.unwrap().id, profile.id);

        let cancelled = service.cancel(&token).await.unwrap();
        assert_eq!(cancelled.subscription_status, SubscriptionStatus::Cancelled);
        assert!(!cancelled.access(Utc::now()).can_write());

        assert!(service.current("token-nobody").await.is_err());
    }
}
