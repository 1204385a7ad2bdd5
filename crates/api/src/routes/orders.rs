//! Order route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use mitienda_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::Order;
use crate::services::CheckoutService;
use crate::state::AppState;

/// Order routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/", get(list))
        .route("/{order_id}", get(get_order))
}

/// Create an order from the user's current cart.
///
/// POST /api/v1/orders/checkout
#[instrument(skip(state, user))]
pub async fn checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<Order>)> {
    let order = CheckoutService::new(state.pool()).checkout(user.id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// List all orders for the current user, newest first.
///
/// GET /api/v1/orders
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;

    Ok(Json(orders))
}

/// Get details for one of the current user's orders.
///
/// GET /api/v1/orders/{order_id}
#[instrument(skip(state, user))]
pub async fn get_order(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_for_user(order_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_owned()))?;

    Ok(Json(order))
}
