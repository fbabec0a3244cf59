//! Plantão REST API
//!
//! HTTP API layer for Plantão, built with Axum.
//!
//! # Endpoints
//!
//! ## Shifts
//! - `GET /api/v1/shifts` - List shifts (`from`, `to`, `location`, `status`)
//! - `POST /api/v1/shifts` - Create a shift
//! - `POST /api/v1/shifts/batch` - Import many shifts
//! - `GET /api/v1/shifts/export` - Export as CSV or JSON
//! - `GET /api/v1/shifts/:id` - Get a shift
//! - `PATCH /api/v1/shifts/:id` - Inline edit
//! - `POST /api/v1/shifts/:id/status` - Change payment status
//! - `DELETE /api/v1/shifts/:id` - Delete a shift
//!
//! ## Dashboard and map
//! - `GET /api/v1/dashboard` - Aggregated earnings
//! - `GET /api/v1/hospitals` - Hospital autocomplete
//! - `GET /api/v1/map` - Map markers
//!
//! ## Accounts
//! - `POST /api/v1/auth/signup`, `POST /api/v1/auth/signin`
//! - `POST /api/v1/auth/reset-password`, `GET /api/v1/auth/session`
//! - `GET /api/v1/subscription/status`, `POST /api/v1/subscription/cancel`
//! - `POST /api/v1/checkout` - Checkout session (stubbed provider)
//! - `POST /api/v1/webhooks/payment` - Payment provider events
//!
//! ## Session
//! - `GET /api/v1/session`, `DELETE /api/v1/session`
//! - `POST /api/v1/session/demo`, `POST /api/v1/session/admin`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use plantao::api::{build_router, serve, ApiConfig, AppState};
//! use plantao::account::{SessionStore, SqliteProfileStore};
//! use plantao::hospitals::HospitalCatalog;
//! use plantao::shifts::{ShiftStore, TaxPolicy};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dir = Path::new("./plantao_data");
//!     let catalog = Arc::new(HospitalCatalog::reference());
//!     let shifts = Arc::new(ShiftStore::open(dir, TaxPolicy::default(), catalog.clone())?);
//!     let profiles = Arc::new(SqliteProfileStore::open(&dir.join("profiles.db"))?);
//!     let sessions = Arc::new(SessionStore::open(dir, None)?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::new(shifts, catalog, profiles, sessions, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Shift routes
        .route(
            "/shifts",
            get(routes::shifts::list_shifts).post(routes::shifts::create_shift),
        )
        .route("/shifts/batch", post(routes::shifts::import_shifts))
        .route("/shifts/export", get(routes::export::export_shifts))
        .route(
            "/shifts/:id",
            get(routes::shifts::get_shift)
                .patch(routes::shifts::update_shift)
                .delete(routes::shifts::delete_shift),
        )
        .route("/shifts/:id/status", post(routes::shifts::change_status))
        // Dashboard, autocomplete and map
        .route("/dashboard", get(routes::dashboard::get_dashboard))
        .route("/hospitals", get(routes::hospitals::search_hospitals))
        .route("/map", get(routes::hospitals::get_map))
        // Auth routes (hosted backend)
        .route("/auth/signup", post(routes::auth::sign_up))
        .route("/auth/signin", post(routes::auth::sign_in))
        .route("/auth/reset-password", post(routes::auth::reset_password))
        .route("/auth/session", get(routes::auth::current_session))
        // Subscription and payment routes
        .route(
            "/subscription/status",
            get(routes::subscription::subscription_status),
        )
        .route(
            "/subscription/cancel",
            post(routes::subscription::cancel_subscription),
        )
        .route("/checkout", post(routes::subscription::create_checkout))
        .route(
            "/webhooks/payment",
            post(routes::subscription::payment_webhook),
        )
        // Session routes
        .route(
            "/session",
            get(routes::session::get_session).delete(routes::session::clear_session),
        )
        .route("/session/demo", post(routes::session::enter_demo))
        .route("/session/admin", post(routes::session::sign_in_admin));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let body_limit = state.config.max_body_size;
    let timeout = Duration::from_millis(state.config.request_timeout_ms);

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// Configured origins, or permissive when none are set
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Plantão API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Plantão API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::service::tests::FakeAuth;
    use crate::account::{AccountService, ProfileStore, SessionStore, SqliteProfileStore};
    use crate::hospitals::HospitalCatalog;
    use crate::shifts::{ShiftStore, TaxPolicy};
    use axum::{
        body::Body,
        http::{header, Request, Response, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    struct TestApp {
        router: Router,
        profiles: Arc<SqliteProfileStore>,
        _dir: tempfile::TempDir,
    }

    fn create_test_app_with(enforce_subscription: bool, auth: Option<Arc<FakeAuth>>) -> TestApp {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(HospitalCatalog::reference());
        let shifts =
            Arc::new(ShiftStore::open(dir.path(), TaxPolicy::default(), catalog.clone()).unwrap());
        let profiles = Arc::new(SqliteProfileStore::in_memory().unwrap());
        let sessions =
            Arc::new(SessionStore::open(dir.path(), Some("admin-pass".to_string())).unwrap());
        let config = ApiConfig {
            enforce_subscription,
            ..ApiConfig::default()
        };

        let mut state = AppState::new(shifts, catalog, profiles.clone(), sessions, config);
        if let Some(auth) = auth {
            state = state.with_accounts(Arc::new(AccountService::new(auth, profiles.clone(), 7)));
        }

        TestApp {
            router: build_router(state),
            profiles,
            _dir: dir,
        }
    }

    fn create_test_app() -> TestApp {
        create_test_app_with(false, None)
    }

    async fn send(app: &TestApp, request: Request<Body>) -> Response<Body> {
        app.router.clone().oneshot(request).await.unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn new_shift(location: &str, date: &str, gross: &str) -> Value {
        json!({
            "location": location,
            "date": date,
            "hours_worked": "12",
            "gross_amount": gross,
        })
    }

    async fn create(app: &TestApp, body: Value) -> Value {
        let response = send(app, json_request("POST", "/api/v1/shifts", body, None)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();
        let response = send(&app, get("/health/live")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let app = create_test_app();
        let response = send(&app, get("/health/ready")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();
        let response = send(&app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["profile_store"], "sqlite");
        assert_eq!(body["auth"], "disabled");
    }

    #[tokio::test]
    async fn test_create_shift_derives_tax() {
        let app = create_test_app();
        let shift = create(&app, new_shift("Clínica Norte", "2024-03-09", "1000")).await;

        assert_eq!(shift["tax_amount"], "110.00");
        assert_eq!(shift["status"], "receivable");
        assert!(shift["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_create_shift_invalid_json() {
        let app = create_test_app();
        let response = send(
            &app,
            Request::builder()
                .method("POST")
                .uri("/api/v1/shifts")
                .header("Content-Type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_shift_validation_error() {
        let app = create_test_app();
        let mut body = new_shift("Clínica Norte", "2024-03-09", "1000");
        body["hours_worked"] = json!("0");

        let response = send(&app, json_request("POST", "/api/v1/shifts", body, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let app = create_test_app();
        let mut body = new_shift("Clínica Norte", "2024-03-09", "1000");
        body["id"] = json!("shift-1");
        create(&app, body.clone()).await;

        let response = send(&app, json_request("POST", "/api/v1/shifts", body, None)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let app = create_test_app();
        create(&app, new_shift("UPA Santana", "2024-03-01", "800")).await;
        create(&app, new_shift("UPA Tijuca", "2024-04-01", "900")).await;

        let response = send(&app, get("/api/v1/shifts?from=2024-03-15&to=2024-04-30")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["shifts"][0]["location"], "UPA Tijuca");

        let response = send(&app, get("/api/v1/shifts?location=upa%20santana")).await;
        assert_eq!(body_json(response).await["count"], 1);

        let response = send(&app, get("/api/v1/shifts?from=2024-05-01&to=2024-04-01")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_shift_lifecycle() {
        let app = create_test_app();
        let shift = create(&app, new_shift("UPA Santana", "2024-03-01", "800")).await;
        let id = shift["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/shifts/{}", id);

        let response = send(
            &app,
            json_request("PATCH", &uri, json!({ "invoice_number": "NF-42" }), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["invoice_number"], "NF-42");

        let response = send(
            &app,
            json_request("POST", &format!("{}/status", uri), json!({ "status": "paid" }), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "paid");

        let response = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_batch_partial() {
        let app = create_test_app();
        let mut bad = new_shift("UPA Santana", "2024-03-01", "800");
        bad["gross_amount"] = json!("-5");

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/v1/shifts/batch",
                json!({ "shifts": [new_shift("UPA Santana", "2024-03-02", "800"), bad] }),
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::MULTI_STATUS);
        let body = body_json(response).await;
        assert_eq!(body["accepted"], 1);
        assert_eq!(body["rejected"], 1);
        assert_eq!(body["errors"][0]["index"], 1);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = create_test_app();
        create(&app, new_shift("UPA Santana", "2024-03-01", "800")).await;

        let response = send(&app, get("/api/v1/shifts/export?format=csv")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("UPA Santana"));

        let response = send(&app, get("/api/v1/shifts/export?format=xml")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_dashboard_totals() {
        let app = create_test_app();
        create(&app, new_shift("UPA Santana", "2024-03-01", "800")).await;
        create(&app, new_shift("UPA Tijuca", "2024-03-02", "1200")).await;

        let response = send(&app, get("/api/v1/dashboard")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["totals"]["shift_count"], 2);
        assert_eq!(body["totals"]["gross"], "2000");
        assert_eq!(body["monthly"][0]["month"], "2024-03");
    }

    #[tokio::test]
    async fn test_hospital_autocomplete() {
        let app = create_test_app();

        let response = send(&app, get("/api/v1/hospitals?q=einst")).await;
        let body = body_json(response).await;
        assert_eq!(body["hospitals"][0]["name"], "Hospital Israelita Albert Einstein");

        let response = send(&app, get("/api/v1/hospitals?q=h")).await;
        assert_eq!(body_json(response).await["count"], 0);
    }

    #[tokio::test]
    async fn test_map_markers_from_catalog() {
        let app = create_test_app();
        let shift = create(&app, new_shift("UPA Santana", "2024-03-01", "800")).await;
        assert_eq!(shift["facility_type"], "emergency_unit");
        create(&app, new_shift("Consultório particular", "2024-03-02", "500")).await;

        let response = send(&app, get("/api/v1/map")).await;
        let body = body_json(response).await;
        assert_eq!(body["markers"].as_array().unwrap().len(), 1);
        assert_eq!(body["markers"][0]["location"], "UPA Santana");
        assert_eq!(body["unmapped"], 1);
    }

    #[tokio::test]
    async fn test_auth_without_backend_is_unavailable() {
        let app = create_test_app();
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/signin",
                json!({ "email": "ana@example.com", "password": "12345678" }),
                None,
            ),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(
            body["error"]["message"],
            "Service temporarily unavailable, please try again shortly"
        );
    }

    #[tokio::test]
    async fn test_demo_session_unlocks_writes() {
        let app = create_test_app_with(true, Some(Arc::new(FakeAuth::default())));
        let body = new_shift("UPA Santana", "2024-03-01", "800");

        let response = send(&app, json_request("POST", "/api/v1/shifts", body.clone(), None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(&app, json_request("POST", "/api/v1/session/demo", json!({}), None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["demo"], true);

        let response = send(&app, json_request("POST", "/api/v1/shifts", body, None)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_admin_sign_in() {
        let app = create_test_app();

        let response = send(
            &app,
            json_request("POST", "/api/v1/session/admin", json!({ "password": "wrong" }), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            json_request("POST", "/api/v1/session/admin", json!({ "password": "admin-pass" }), None),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["admin"], true);

        let response = send(
            &app,
            Request::builder()
                .method("DELETE")
                .uri("/api/v1/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(body_json(send(&app, get("/api/v1/session")).await).await["admin"], false);
    }

    #[tokio::test]
    async fn test_subscription_gating_and_webhook() {
        let app = create_test_app_with(true, Some(Arc::new(FakeAuth::default())));

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/signup",
                json!({ "email": "ana@example.com", "password": "12345678", "name": "Dra. Ana" }),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let account = body_json(response).await;
        assert_eq!(account["access"]["state"], "trial");
        let profile_id = account["profile"]["id"].as_str().unwrap().to_string();

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/v1/auth/signin",
                json!({ "email": "ana@example.com", "password": "12345678" }),
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let token = body_json(response).await["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        let shift = new_shift("UPA Santana", "2024-03-01", "800");
        let response =
            send(&app, json_request("POST", "/api/v1/shifts", shift.clone(), Some(&token))).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        // Cancel, then writes are refused with the banner
        let response = send(
            &app,
            json_request("POST", "/api/v1/subscription/cancel", json!({}), Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response =
            send(&app, json_request("POST", "/api/v1/shifts", shift.clone(), Some(&token))).await;
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "SUBSCRIPTION_REQUIRED");

        // Checkout completes and the webhook reactivates the profile
        let response = send(
            &app,
            json_request("POST", "/api/v1/checkout", json!({ "plan": "annual" }), Some(&token)),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert!(session["id"].as_str().unwrap().starts_with("cs_stub_"));

        let event = json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "client_reference_id": profile_id,
                "customer": "cus_1",
                "subscription": "sub_1",
                "metadata": { "plan": "annual" }
            }}
        });
        let response = send(&app, json_request("POST", "/api/v1/webhooks/payment", event, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "applied");

        let stored = app.profiles.get(&profile_id).await.unwrap().unwrap();
        assert_eq!(stored.customer_id.as_deref(), Some("cus_1"));

        let response = send(
            &app,
            Request::builder()
                .uri("/api/v1/subscription/status")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        let status = body_json(response).await;
        assert_eq!(status["can_write"], true);
        assert_eq!(status["access"]["state"], "active");

        let response = send(&app, json_request("POST", "/api/v1/shifts", shift, Some(&token))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_webhook_unknown_profile_is_acknowledged() {
        let app = create_test_app();
        let event = json!({
            "type": "invoice.payment_failed",
            "data": { "object": { "subscription": "sub_missing" } }
        });

        let response = send(&app, json_request("POST", "/api/v1/webhooks/payment", event, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "profile_not_found");
    }
}
