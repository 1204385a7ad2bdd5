//! End-to-end tests over the HTTP surface, driving the axum router
//! in-process.

use axum::http::StatusCode;
use serde_json::json;

use mitienda_integration_tests::{
    TEST_PASSWORD, create_product, login, promote_to_staff, request, test_app, test_pool,
};

#[tokio::test]
async fn health_endpoints_respond() {
    let pool = test_pool().await;
    let app = test_app(pool);

    let (status, _) = request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(&app, "GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_login_me_round_trip() {
    let pool = test_pool().await;
    let app = test_app(pool);

    let token = login(&app, "shopper@example.com").await;

    let (status, body) = request(&app, "GET", "/api/v1/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "shopper@example.com");
    assert_eq!(body["is_staff"], false);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let pool = test_pool().await;
    let app = test_app(pool);

    login(&app, "shopper@example.com").await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/auth/register",
        None,
        Some(json!({ "email": "shopper@example.com", "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email already registered");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let pool = test_pool().await;
    let app = test_app(pool);

    login(&app, "shopper@example.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "shopper@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cart_requires_authentication() {
    let pool = test_pool().await;
    let app = test_app(pool);

    let (status, _) = request(&app, "GET", "/api/v1/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/api/v1/cart", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn products_are_public() {
    let pool = test_pool().await;
    create_product(&pool, "Lamp", "19.99", 5).await;
    let app = test_app(pool);

    let (status, body) = request(&app, "GET", "/api/v1/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("product list").len(), 1);
    assert_eq!(body[0]["slug"], "lamp");
    assert_eq!(body[0]["variants"][0]["price"]["amount"], "19.99");

    let (status, body) = request(&app, "GET", "/api/v1/products/lamp", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Lamp");

    let (status, _) = request(&app, "GET", "/api/v1/products/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_shopping_flow_over_http() {
    let pool = test_pool().await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 5).await;
    let app = test_app(pool);

    let token = login(&app, "shopper@example.com").await;

    // Empty cart is created on first read.
    let (status, body) = request(&app, "GET", "/api/v1/cart", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().expect("items").is_empty());

    // Add two units.
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/cart/items",
        Some(&token),
        Some(json!({ "variant_id": variant_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["quantity"], 2);

    // Checkout produces a pending order with the snapshot total.
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/orders/checkout",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["total"]["amount"], "20.00");
    let order_id = body["id"].as_i64().expect("order id");

    // The order shows up in the user's listing and detail view.
    let (status, body) = request(&app, "GET", "/api/v1/orders", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().expect("orders").len(), 1);

    let (status, body) = request(
        &app,
        "GET",
        &format!("/api/v1/orders/{order_id}"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["unit_price"], "10.00");

    // Checking out again fails: the cart was consumed.
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/orders/checkout",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cart is empty");
}

#[tokio::test]
async fn checkout_conflict_surfaces_as_409() {
    let pool = test_pool().await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 1).await;
    let app = test_app(pool);

    let token = login(&app, "shopper@example.com").await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/cart/items",
        Some(&token),
        Some(json!({ "variant_id": variant_id, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/api/v1/orders/checkout",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn foreign_orders_read_as_missing() {
    let pool = test_pool().await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 5).await;
    let app = test_app(pool);

    let owner_token = login(&app, "owner@example.com").await;
    let intruder_token = login(&app, "intruder@example.com").await;

    request(
        &app,
        "POST",
        "/api/v1/cart/items",
        Some(&owner_token),
        Some(json!({ "variant_id": variant_id, "quantity": 1 })),
    )
    .await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/v1/orders/checkout",
        Some(&owner_token),
        None,
    )
    .await;
    let order_id = body["id"].as_i64().expect("order id");

    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/v1/orders/{order_id}"),
        Some(&intruder_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_surface_is_staff_only() {
    let pool = test_pool().await;
    let app = test_app(pool.clone());

    let customer_token = login(&app, "customer@example.com").await;
    let (status, _) = request(
        &app,
        "GET",
        "/api/v1/admin/orders",
        Some(&customer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Promote and retry: the same token now passes.
    let staff_token = login(&app, "staff@example.com").await;
    let staff_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
        .bind("staff@example.com")
        .fetch_one(&pool)
        .await
        .expect("staff id");
    promote_to_staff(&pool, mitienda_core::UserId::new(staff_id)).await;

    let (status, body) = request(&app, "GET", "/api/v1/admin/orders", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().expect("orders").is_empty());
}

#[tokio::test]
async fn admin_can_create_products_and_transition_orders() {
    let pool = test_pool().await;
    let app = test_app(pool.clone());

    let staff_token = login(&app, "staff@example.com").await;
    let staff_id: i64 = sqlx::query_scalar("SELECT id FROM users WHERE email = ?1")
        .bind("staff@example.com")
        .fetch_one(&pool)
        .await
        .expect("staff id");
    promote_to_staff(&pool, mitienda_core::UserId::new(staff_id)).await;

    // Create a product over the admin surface.
    let (status, body) = request(
        &app,
        "POST",
        "/api/v1/admin/products",
        Some(&staff_token),
        Some(json!({
            "title": "Desk Chair",
            "variants": [{ "sku": "CHAIR-1", "price": "89.00", "stock": 4 }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["slug"], "desk-chair");
    let product_id = body["id"].as_i64().expect("product id");
    let variant_id = body["variants"][0]["id"].as_i64().expect("variant id");

    // Renaming the product re-derives its slug.
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/api/v1/admin/products/{product_id}"),
        Some(&staff_token),
        Some(json!({ "title": "Office Chair" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "office-chair");

    // A customer buys it.
    let customer_token = login(&app, "customer@example.com").await;
    request(
        &app,
        "POST",
        "/api/v1/cart/items",
        Some(&customer_token),
        Some(json!({ "variant_id": variant_id, "quantity": 1 })),
    )
    .await;
    let (_, body) = request(
        &app,
        "POST",
        "/api/v1/orders/checkout",
        Some(&customer_token),
        None,
    )
    .await;
    let order_id = body["id"].as_i64().expect("order id");

    // Staff moves the order along; an illegal edge is rejected.
    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/v1/admin/orders/{order_id}/status"),
        Some(&staff_token),
        Some(json!({ "status": "paid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "paid");

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/v1/admin/orders/{order_id}/status"),
        Some(&staff_token),
        Some(json!({ "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
