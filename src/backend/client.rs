//! Hosted backend REST client
//!
//! Talks to the backend's auth API (`/auth/v1/*`) and its table API
//! (`/rest/v1/<table>`). Every request carries the project key in the `apikey`
//! header plus a bearer token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::account::{AccountError, AccountResult, Profile, ProfileStore, ProfileUpdate};
use crate::backend::auth::{AuthProvider, AuthSession, AuthUser};
use crate::backend::error::{BackendError, BackendResult};

/// Connection settings for the hosted backend
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project URL, e.g. "https://xyzcompany.example.co"
    pub url: String,
    /// Public (anon) key, used for auth calls
    pub anon_key: String,
    /// Service key for table access from the server; falls back to the anon key
    pub service_key: Option<String>,
    pub profiles_table: String,
    pub request_timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            service_key: None,
            profiles_table: "profiles".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

pub struct HostedBackend {
    client: Client,
    config: BackendConfig,
}

impl HostedBackend {
    pub fn new(mut config: BackendConfig) -> BackendResult<Self> {
        if config.url.trim().is_empty() || config.anon_key.trim().is_empty() {
            return Err(BackendError::InvalidInput(
                "backend url and anon key are required".to_string(),
            ));
        }
        config.url = config.url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn table_key(&self) -> &str {
        self.config
            .service_key
            .as_deref()
            .unwrap_or(&self.config.anon_key)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn table_url(&self, query: &str) -> String {
        format!(
            "{}/rest/v1/{}?{}",
            self.config.url, self.config.profiles_table, query
        )
    }

    fn with_key(&self, request: RequestBuilder, key: &str) -> RequestBuilder {
        request.header("apikey", key).bearer_auth(key)
    }

    async fn send(&self, request: RequestBuilder) -> BackendResult<Response> {
        let response = request.send().await.map_err(BackendError::from_transport)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> BackendResult<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }

    /// First row matching `column = value`
    async fn select_profile(&self, column: &str, value: &str) -> AccountResult<Option<Profile>> {
        let query = format!(
            "{}=eq.{}&select=*&limit=1",
            column,
            urlencoding::encode(value)
        );
        let request = self.with_key(self.client.get(self.table_url(&query)), self.table_key());
        let rows: Vec<Profile> = self.json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn write_rows<B: Serialize + ?Sized>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> BackendResult<Vec<Profile>> {
        let request = self
            .with_key(request, self.table_key())
            .header("Prefer", "return=representation")
            .json(body);
        self.json(request).await
    }
}

/// Build an `Api` error from a failed response, pulling the message out of
/// the usual JSON error shapes
async fn api_error(response: Response) -> BackendError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    BackendError::Api {
        status: status.as_u16(),
        message: error_message(&text),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["msg", "error_description", "message", "error"]
                .iter()
                .find_map(|key| v.get(key).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl AuthProvider for HostedBackend {
    async fn sign_up(&self, email: &str, password: &str, name: &str) -> BackendResult<AuthUser> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": { "name": name },
        });
        let request = self
            .with_key(self.client.post(self.auth_url("signup")), &self.config.anon_key)
            .json(&body);

        // Depending on project settings the response is the user or a session holding it
        let value: serde_json::Value = self.json(request).await?;
        let user = value.get("user").cloned().unwrap_or(value);
        serde_json::from_value(user).map_err(|e| BackendError::Parse(e.to_string()))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let body = serde_json::json!({ "email": email, "password": password });
        let request = self
            .with_key(
                self.client.post(self.auth_url("token?grant_type=password")),
                &self.config.anon_key,
            )
            .json(&body);

        match self.json(request).await {
            Err(BackendError::Api { status, .. })
                if status == StatusCode::BAD_REQUEST.as_u16()
                    || status == StatusCode::UNAUTHORIZED.as_u16() =>
            {
                Err(BackendError::InvalidCredentials)
            }
            other => other,
        }
    }

    async fn reset_password(&self, email: &str) -> BackendResult<()> {
        let request = self
            .with_key(self.client.post(self.auth_url("recover")), &self.config.anon_key)
            .json(&serde_json::json!({ "email": email }));
        self.send(request).await?;
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> BackendResult<AuthUser> {
        let request = self
            .client
            .get(self.auth_url("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token);

        match self.json(request).await {
            Err(BackendError::Api { status, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Err(BackendError::InvalidCredentials)
            }
            other => other,
        }
    }
}

#[async_trait]
impl ProfileStore for HostedBackend {
    fn kind(&self) -> &'static str {
        "hosted"
    }

    async fn get(&self, id: &str) -> AccountResult<Option<Profile>> {
        self.select_profile("id", id).await
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<Profile>> {
        let query = format!(
            "email=ilike.{}&select=*&limit=1",
            urlencoding::encode(email.trim())
        );
        let request = self.with_key(self.client.get(self.table_url(&query)), self.table_key());
        let rows: Vec<Profile> = self.json(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_by_customer(&self, customer_id: &str) -> AccountResult<Option<Profile>> {
        self.select_profile("customer_id", customer_id).await
    }

    async fn find_by_subscription(&self, subscription_id: &str) -> AccountResult<Option<Profile>> {
        self.select_profile("subscription_id", subscription_id).await
    }

    async fn insert(&self, profile: Profile) -> AccountResult<Profile> {
        let request = self.client.post(self.table_url("select=*"));
        let rows = match self.write_rows(request, &profile).await {
            Err(BackendError::Api { status, .. }) if status == StatusCode::CONFLICT.as_u16() => {
                return Err(AccountError::Conflict(format!("profile {}", profile.id)));
            }
            other => other?,
        };

        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("insert returned no rows".to_string()).into())
    }

    async fn update(&self, id: &str, update: ProfileUpdate) -> AccountResult<Profile> {
        let query = format!("id=eq.{}&select=*", urlencoding::encode(id));
        let request = self.client.patch(self.table_url(&query));
        let rows = self.write_rows(request, &update).await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }
}
