//! Admin route handlers (staff only).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use serde::Deserialize;
use tracing::instrument;

use mitienda_core::{OrderId, OrderStatus, ProductId, VariantId};

use crate::db::products::{CreateProductInput, UpdateProductInput};
use crate::db::{InventoryLedger, OrderRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{Order, Product};
use crate::services::OrderService;
use crate::state::AppState;

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/{product_id}", put(update_product))
        .route("/orders", get(list_all_orders))
        .route("/orders/{order_id}/status", post(transition_status))
        .route("/variants/{variant_id}/restock", post(restock))
}

/// Create a new product with its variants.
///
/// POST /api/v1/admin/products
#[instrument(skip(state, _staff, input))]
pub async fn create_product(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Json(input): Json<CreateProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update an existing product.
///
/// PUT /api/v1/admin/products/{product_id}
#[instrument(skip(state, _staff, input))]
pub async fn update_product(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(product_id): Path<ProductId>,
    Json(input): Json<UpdateProductInput>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .update(product_id, &input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("product not found".to_owned()),
            other => AppError::Database(other),
        })?;

    Ok(Json(product))
}

/// List all orders in the system.
///
/// GET /api/v1/admin/orders
#[instrument(skip(state, _staff))]
pub async fn list_all_orders(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// Status transition form data.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: OrderStatus,
}

/// Move an order along one allowed status edge.
///
/// POST /api/v1/admin/orders/{order_id}/status
#[instrument(skip(state, _staff, request))]
pub async fn transition_status(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(order_id): Path<OrderId>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<Order>> {
    let order = OrderService::new(state.pool())
        .transition_status(order_id, request.status)
        .await?;

    Ok(Json(order))
}

/// Restock form data.
#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    pub quantity: i64,
}

/// Add stock to a variant.
///
/// POST /api/v1/admin/variants/{variant_id}/restock
#[instrument(skip(state, _staff, request))]
pub async fn restock(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(variant_id): Path<VariantId>,
    Json(request): Json<RestockRequest>,
) -> Result<StatusCode> {
    if request.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be positive".to_owned()));
    }

    let mut tx = state.pool().begin().await.map_err(RepositoryError::from)?;
    InventoryLedger::increment(&mut tx, variant_id, request.quantity, "restock")
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("variant not found".to_owned()),
            other => AppError::Database(other),
        })?;
    tx.commit().await.map_err(RepositoryError::from)?;

    Ok(StatusCode::NO_CONTENT)
}
