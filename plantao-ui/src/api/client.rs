//! HTTP API Client
//!
//! Functions for communicating with the Plantão REST API.

use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::state::global::{
    DashboardSummary, Hospital, MapMarker, Profile, SessionFlags, Shift, ShiftQuery, ShiftStatus,
    SubscriptionInfo,
};

/// Default API base URL
pub const DEFAULT_API_BASE: &str = "http://localhost:8082/api/v1";

const API_URL_KEY: &str = "plantao_api_url";
const TOKEN_KEY: &str = "plantao_token";

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Get the API base URL from local storage or use default
pub fn get_api_base() -> String {
    let url = local_storage()
        .and_then(|storage| storage.get_item(API_URL_KEY).ok().flatten())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    url.trim_end_matches('/').to_string()
}

/// Set the API base URL in local storage
pub fn set_api_base(url: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(API_URL_KEY, url);
    }
}

pub fn get_token() -> Option<String> {
    local_storage()
        .and_then(|storage| storage.get_item(TOKEN_KEY).ok().flatten())
        .filter(|t| !t.is_empty())
}

pub fn set_token(token: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(TOKEN_KEY, token);
    }
}

pub fn clear_token() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(TOKEN_KEY);
    }
}

// ============ Response Types ============

#[derive(Debug, serde::Deserialize)]
struct ShiftListResponse {
    shifts: Vec<Shift>,
}

#[derive(Debug, serde::Deserialize)]
struct HospitalSearchResponse {
    hospitals: Vec<Hospital>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MapData {
    pub markers: Vec<MapMarker>,
    pub unmapped: usize,
}

#[derive(Debug, serde::Deserialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub profile: Profile,
    #[serde(default)]
    pub banner: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
    pub stub: bool,
}

#[derive(Debug, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub auth: String,
    pub shift_count: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, serde::Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Fields sent when logging a shift from the form
#[derive(Debug, Clone, serde::Serialize)]
pub struct NewShift {
    pub location: String,
    pub date: String,
    pub hours_worked: String,
    pub gross_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<String>,
    pub status: ShiftStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
}

/// Inline edit; only the fields that changed are sent
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ShiftEdit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_worked: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recompute_tax: bool,
    /// Empty string clears the invoice number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
}

impl ShiftEdit {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============ Helpers ============

fn url(path: &str) -> String {
    format!("{}{}", get_api_base(), path)
}

/// Attach the stored bearer token, if any
fn authorized(builder: RequestBuilder) -> RequestBuilder {
    match get_token() {
        Some(token) => builder.header("Authorization", &format!("Bearer {}", token)),
        None => builder,
    }
}

async fn error_message(response: Response, fallback: &str) -> String {
    response
        .json::<ApiErrorBody>()
        .await
        .map(|body| body.error.message)
        .unwrap_or_else(|_| fallback.to_string())
}

async fn read<T: DeserializeOwned>(response: Response, fallback: &str) -> Result<T, String> {
    if !response.ok() {
        return Err(error_message(response, fallback).await);
    }

    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

async fn send(builder: RequestBuilder) -> Result<Response, String> {
    authorized(builder)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))
}

async fn send_json<B: serde::Serialize>(builder: RequestBuilder, body: &B) -> Result<Response, String> {
    authorized(builder)
        .json(body)
        .map_err(|e| format!("Request build error: {}", e))?
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))
}

// ============ Shifts ============

pub async fn fetch_shifts(query: &ShiftQuery) -> Result<Vec<Shift>, String> {
    let response = send(Request::get(&url("/shifts")).query(query.params())).await?;
    let list: ShiftListResponse = read(response, "Could not load shifts").await?;
    Ok(list.shifts)
}

pub async fn create_shift(shift: &NewShift) -> Result<Shift, String> {
    let response = send_json(Request::post(&url("/shifts")), shift).await?;
    read(response, "Could not save shift").await
}

pub async fn update_shift(id: &str, edit: &ShiftEdit) -> Result<Shift, String> {
    let path = format!("/shifts/{}", encode(id));
    let response = send_json(Request::patch(&url(&path)), edit).await?;
    read(response, "Could not update shift").await
}

pub async fn change_status(id: &str, status: ShiftStatus) -> Result<Shift, String> {
    #[derive(serde::Serialize)]
    struct StatusChange {
        status: ShiftStatus,
    }

    let path = format!("/shifts/{}/status", encode(id));
    let response = send_json(Request::post(&url(&path)), &StatusChange { status }).await?;
    read(response, "Could not change status").await
}

pub async fn delete_shift(id: &str) -> Result<(), String> {
    let path = format!("/shifts/{}", encode(id));
    let response = send(Request::delete(&url(&path))).await?;

    if !response.ok() {
        return Err(error_message(response, "Could not delete shift").await);
    }
    Ok(())
}

pub async fn fetch_dashboard(query: &ShiftQuery) -> Result<DashboardSummary, String> {
    let response = send(Request::get(&url("/dashboard")).query(query.params())).await?;
    read(response, "Could not load dashboard").await
}

// ============ Hospitals ============

/// Autocomplete; the server returns nothing for fewer than 2 characters
pub async fn search_hospitals(query: &str) -> Result<Vec<Hospital>, String> {
    let response = send(Request::get(&url("/hospitals")).query([("q", query), ("limit", "8")])).await?;
    let result: HospitalSearchResponse = read(response, "Could not search hospitals").await?;
    Ok(result.hospitals)
}

pub async fn fetch_map(query: &ShiftQuery) -> Result<MapData, String> {
    let response = send(Request::get(&url("/map")).query(query.params())).await?;
    read(response, "Could not load map").await
}

// ============ Account ============

pub async fn sign_in(email: &str, password: &str) -> Result<SignInResponse, String> {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = send_json(Request::post(&url("/auth/signin")), &body).await?;
    let signed_in: SignInResponse = read(response, "Sign-in failed").await?;
    set_token(&signed_in.access_token);
    Ok(signed_in)
}

pub async fn sign_up(email: &str, password: &str, name: &str) -> Result<(), String> {
    let body = serde_json::json!({ "email": email, "password": password, "name": name });
    let response = send_json(Request::post(&url("/auth/signup")), &body).await?;

    if !response.ok() {
        return Err(error_message(response, "Sign-up failed").await);
    }
    Ok(())
}

pub async fn reset_password(email: &str) -> Result<(), String> {
    let body = serde_json::json!({ "email": email });
    let response = send_json(Request::post(&url("/auth/reset-password")), &body).await?;

    if !response.ok() {
        return Err(error_message(response, "Could not send reset email").await);
    }
    Ok(())
}

pub async fn fetch_subscription_status() -> Result<SubscriptionInfo, String> {
    let response = send(Request::get(&url("/subscription/status"))).await?;
    read(response, "Could not load subscription").await
}

pub async fn create_checkout(plan: &str) -> Result<CheckoutSession, String> {
    let body = serde_json::json!({ "plan": plan });
    let response = send_json(Request::post(&url("/checkout")), &body).await?;
    read(response, "Could not start checkout").await
}

pub async fn cancel_subscription() -> Result<(), String> {
    let response = send(Request::post(&url("/subscription/cancel"))).await?;

    if !response.ok() {
        return Err(error_message(response, "Could not cancel subscription").await);
    }
    Ok(())
}

pub async fn enter_demo() -> Result<SessionFlags, String> {
    let response = send(Request::post(&url("/session/demo"))).await?;
    read(response, "Could not start demo").await
}

pub async fn clear_session() -> Result<(), String> {
    clear_token();
    let response = send(Request::delete(&url("/session"))).await?;

    if !response.ok() {
        return Err(error_message(response, "Could not sign out").await);
    }
    Ok(())
}

/// Check API health
pub async fn check_health() -> Result<HealthResponse, String> {
    let health_url = get_api_base().replace("/api/v1", "/health");

    let response = Request::get(&health_url)
        .send()
        .await
        .map_err(|e| format!("Network error: {}", e))?;

    if !response.ok() {
        return Err("API is not healthy".to_string());
    }

    response.json().await.map_err(|e| format!("Parse error: {}", e))
}

fn encode(segment: &str) -> String {
    String::from(js_sys::encode_uri_component(segment))
}
