//! Route handlers.
//!
//! The HTTP boundary is a thin adapter: handlers deserialize the request,
//! call one service or repository operation, and serialize the result. All
//! error mapping lives in [`crate::error::AppError`].

pub mod admin;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the versioned API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/auth", auth::routes())
        .nest("/api/v1/products", products::routes())
        .nest("/api/v1/cart", cart::routes())
        .nest("/api/v1/orders", orders::routes())
        .nest("/api/v1/admin", admin::routes())
}
