//! Shared test harness.
//!
//! Mirrors the router construction in `main.rs` so integration tests
//! exercise the same middleware stack (CORS, request ID, timeout,
//! tracing, panic recovery) that production uses.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use meridian_api::config::ServerConfig;
use meridian_api::routes;
use meridian_api::state::AppState;
use meridian_api::storage::LocalArtifactStorage;
use meridian_db::store::{EntityStore, PgEntityStore};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        export_dir: std::env::temp_dir().join("meridian-test-exports"),
        scheduler_tick_secs: 60,
        scheduler_max_concurrent: 4,
    }
}

/// Application state backed by the real Postgres entity store.
pub fn test_state(pool: PgPool) -> AppState {
    let store = Arc::new(PgEntityStore::new(pool.clone()));
    test_state_with_store(pool, store)
}

/// Application state with a caller-provided entity store (fixtures,
/// failure injection).
pub fn test_state_with_store(pool: PgPool, entity_store: Arc<dyn EntityStore>) -> AppState {
    let config = test_config();
    AppState {
        pool,
        storage: Arc::new(LocalArtifactStorage::new(config.export_dir.clone())),
        config: Arc::new(config),
        entity_store,
        mailer: None,
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    app_with_state(test_state(pool))
}

pub fn app_with_state(state: AppState) -> Router {
    let config = state.config.clone();

    let origins: Vec<axum::http::HeaderValue> = config
        .cors_origins
        .iter()
        .map(|o| o.parse().unwrap())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health_router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Seed one invoice row directly.
pub async fn seed_invoice(
    pool: &PgPool,
    tenant: uuid::Uuid,
    number: &str,
    status: Option<&str>,
    total: f64,
    due_date: &str,
) {
    sqlx::query(
        "INSERT INTO invoices (tenant_id, invoice_number, status, total, due_date) \
         VALUES ($1, $2, $3, $4, $5::date)",
    )
    .bind(tenant)
    .bind(number)
    .bind(status)
    .bind(total)
    .bind(due_date)
    .execute(pool)
    .await
    .unwrap();
}
