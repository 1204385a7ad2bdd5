//! Order status transitions.
//!
//! Orders never change their line items; the only mutation after checkout is
//! the status edge enforced here. Cancellation puts the reserved units back
//! through the inventory ledger, inside the same transaction as the status
//! write.

use sqlx::SqlitePool;
use thiserror::Error;

use mitienda_core::{InvalidStatusTransition, OrderId, OrderStatus};

use crate::db::{InventoryLedger, RepositoryError, orders};
use crate::models::Order;

/// Journal reason recorded when a cancellation restocks an order's lines.
const CANCEL_REASON: &str = "order_cancelled";

/// Errors that can occur when transitioning an order's status.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order doesn't exist.
    #[error("order not found")]
    NotFound,

    /// The requested status edge is not allowed.
    #[error(transparent)]
    Transition(#[from] InvalidStatusTransition),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Service for order status management.
pub struct OrderService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Move an order along one allowed status edge.
    ///
    /// Allowed edges are `pending -> paid -> shipped -> delivered` and
    /// `{pending, paid} -> cancelled`. Cancelling restocks every line of the
    /// order through the inventory ledger in the same transaction, undoing
    /// the decrement that checkout applied.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist and
    /// `OrderError::Transition` if the edge is not allowed.
    pub async fn transition_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let current = orders::order_status(&mut tx, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        current.transition_to(new_status)?;

        orders::set_order_status(&mut tx, order_id, new_status).await?;

        if new_status == OrderStatus::Cancelled {
            let items = orders::items_for_order(&mut *tx, order_id).await?;
            for item in &items {
                InventoryLedger::increment(&mut tx, item.variant_id, item.quantity, CANCEL_REASON)
                    .await?;
            }
        }

        let order = orders::fetch_order(&mut tx, order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(%order_id, from = %current, to = %new_status, "order status updated");

        Ok(order)
    }
}
