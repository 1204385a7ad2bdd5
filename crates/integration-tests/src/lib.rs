//! Integration test support for MiTienda.
//!
//! Tests run against a fresh in-memory `SQLite` database each, so the whole
//! suite is hermetic: no server process, no database service, no network.
//!
//! Router-level tests drive the axum application in-process with
//! `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use mitienda_api::config::ApiConfig;
use mitienda_api::db::ProductRepository;
use mitienda_api::db::products::{CreateProductInput, CreateVariantInput};
use mitienda_api::models::{Product, User};
use mitienda_api::services::AuthService;
use mitienda_api::state::AppState;
use mitienda_core::{CurrencyCode, UserId, VariantId};

/// Default password used for test accounts.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Create a migrated in-memory database pool.
///
/// An in-memory `SQLite` database lives and dies with its connection, so the
/// pool is capped at a single long-lived connection that every caller shares.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");

    mitienda_api::db::MIGRATOR
        .run(&pool)
        .await
        .expect("run migrations");

    pool
}

/// Register a user with [`TEST_PASSWORD`].
pub async fn create_user(pool: &SqlitePool, email: &str) -> User {
    AuthService::new(pool)
        .register(email, TEST_PASSWORD, None)
        .await
        .expect("register test user")
}

/// Flip a user's staff flag directly in the database.
pub async fn promote_to_staff(pool: &SqlitePool, user_id: UserId) {
    sqlx::query("UPDATE users SET is_staff = 1 WHERE id = ?1")
        .bind(user_id)
        .execute(pool)
        .await
        .expect("promote user to staff");
}

/// Create a product with a single variant; returns the product and the
/// variant's id.
pub async fn create_product(
    pool: &SqlitePool,
    title: &str,
    price: &str,
    stock: i64,
) -> (Product, VariantId) {
    let input = CreateProductInput {
        sku: None,
        title: title.to_owned(),
        description: None,
        variants: vec![CreateVariantInput {
            sku: format!("{title}-V1"),
            price: price.parse::<Decimal>().expect("parse test price"),
            currency: CurrencyCode::USD,
            stock,
        }],
    };

    let product = ProductRepository::new(pool)
        .create(&input)
        .await
        .expect("create test product");
    let variant_id = product.variants.first().expect("variant created").id;

    (product, variant_id)
}

/// Read a variant's current stock directly.
pub async fn stock_of(pool: &SqlitePool, variant_id: VariantId) -> i64 {
    sqlx::query_scalar("SELECT stock FROM product_variants WHERE id = ?1")
        .bind(variant_id)
        .fetch_one(pool)
        .await
        .expect("read stock")
}

/// Sum of journal deltas for a variant, grouped by reason.
pub async fn journal_total(pool: &SqlitePool, variant_id: VariantId, reason: &str) -> i64 {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(delta), 0) FROM inventory_events WHERE variant_id = ?1 AND reason = ?2",
    )
    .bind(variant_id)
    .bind(reason)
    .fetch_one(pool)
    .await
    .expect("read inventory journal")
}

// =============================================================================
// Router-level helpers
// =============================================================================

/// Build the application router over the given pool.
pub fn test_app(pool: SqlitePool) -> Router {
    let config = ApiConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        jwt_secret: SecretString::from("integration-test-signing-key-0123456789ab"),
        token_expiry_minutes: 60,
    };

    mitienda_api::app(AppState::new(config, pool))
}

/// Fire one request at the router and return status plus parsed JSON body
/// (or `Value::Null` for empty bodies).
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();

    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

/// Register and log a user in over HTTP, returning the bearer token.
pub async fn login(app: &Router, email: &str) -> String {
    let (status, _) = request(
        app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    body["access_token"].as_str().unwrap().to_owned()
}
