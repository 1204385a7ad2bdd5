//! Cart route handlers.
//!
//! All cart routes operate on the authenticated user's own cart; item ids
//! belonging to other users are reported as missing.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use mitienda_core::{CartItemId, VariantId};

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::Cart;
use crate::services::CartService;
use crate::state::AppState;

/// Cart routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/items", post(add_item))
        .route("/items/{item_id}", put(update_item).delete(remove_item))
}

/// Add-to-cart form data.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    pub quantity: i64,
}

/// Quantity-update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// Get the current user's shopping cart, creating it on first access.
///
/// GET /api/v1/cart
#[instrument(skip(state, user))]
pub async fn show(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool()).get_or_create(user.id).await?;
    Ok(Json(cart))
}

/// Add an item to the shopping cart.
///
/// POST /api/v1/cart/items
#[instrument(skip(state, user, request))]
pub async fn add_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<Cart>> {
    if request.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be positive".to_owned()));
    }

    let cart = CartService::new(state.pool())
        .add_item(user.id, request.variant_id, request.quantity)
        .await?;

    Ok(Json(cart))
}

/// Update an item's quantity; zero removes the item.
///
/// PUT /api/v1/cart/items/{item_id}
#[instrument(skip(state, user, request))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.pool())
        .update_item_quantity(user.id, item_id, request.quantity)
        .await?;

    Ok(Json(cart))
}

/// Remove an item from the shopping cart. Idempotent.
///
/// DELETE /api/v1/cart/items/{item_id}
#[instrument(skip(state, user))]
pub async fn remove_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(item_id): Path<CartItemId>,
) -> Result<StatusCode> {
    CartService::new(state.pool())
        .remove_item(user.id, item_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
