//! Checkout coordinator: the Cart -> Order state transition.
//!
//! The whole transition runs inside a single database transaction: cart
//! validation, stock reservation, order creation, and cart drain either all
//! commit or all roll back. From any observer the cart is either still full
//! and unordered, or empty with exactly one new order - never in between.
//!
//! Checkout is deliberately not idempotent: it consumes the cart it reads
//! from, so a retry after a successful commit sees an empty cart and fails
//! with [`CheckoutError::EmptyCart`]. Callers that need retry-safety must
//! recover through the order-listing read path instead of retrying blindly.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use thiserror::Error;

use mitienda_core::{Price, UserId, VariantId};

use crate::db::inventory::StockReservation;
use crate::db::{InventoryLedger, RepositoryError, carts, orders, products};
use crate::models::Order;

/// Journal reason recorded for checkout stock decrements.
const RESERVE_REASON: &str = "order_placed";

/// Errors that can occur during checkout.
///
/// Every failure leaves the cart and the stock ledger exactly as they were
/// before the call.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user's cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line references a variant that was deleted or deactivated.
    #[error("variant {variant_id} is no longer available")]
    VariantUnavailable {
        /// The unavailable variant.
        variant_id: VariantId,
    },

    /// A cart line asks for more units than are in stock.
    #[error("insufficient stock for variant {variant_id}")]
    InsufficientStock {
        /// The variant that lost the stock check.
        variant_id: VariantId,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Coordinates the checkout transaction.
pub struct CheckoutService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Convert the user's cart into an order.
    ///
    /// Validates the cart, reserves stock line by line, creates the order
    /// with one item per cart line (copying each line's `price_at_add` into
    /// `unit_price`), and drains the cart. The total is the sum of
    /// `price_at_add x quantity` over the cart lines - snapshot prices, never
    /// re-fetched live ones.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] if the cart has no items,
    /// [`CheckoutError::VariantUnavailable`] if a line's variant no longer
    /// resolves, and [`CheckoutError::InsufficientStock`] if a line loses the
    /// stock check. All failures roll back the entire transaction.
    pub async fn checkout(&self, user_id: UserId) -> Result<Order, CheckoutError> {
        // Dropping the transaction on any early return rolls everything back.
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // Validate: the cart must exist, be non-empty, and every line's
        // variant must still resolve to a purchasable product.
        let cart_id = carts::find_cart_id(&mut *tx, user_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;

        let items = carts::items_for_cart(&mut *tx, cart_id).await?;
        if items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut currency = None;
        for item in &items {
            let resolved = products::resolve_variant(&mut *tx, item.variant_id)
                .await?
                .filter(|v| v.is_available())
                .ok_or(CheckoutError::VariantUnavailable {
                    variant_id: item.variant_id,
                })?;

            currency.get_or_insert(resolved.variant.price.currency);
        }

        tracing::debug!(%cart_id, lines = items.len(), "cart validated");

        // Reserve: conditional decrement per line; one loser aborts them all.
        for item in &items {
            let reservation = InventoryLedger::check_and_decrement(
                &mut tx,
                item.variant_id,
                item.quantity,
                RESERVE_REASON,
            )
            .await?;

            if reservation == StockReservation::Insufficient {
                return Err(CheckoutError::InsufficientStock {
                    variant_id: item.variant_id,
                });
            }
        }

        // Commit: totals from the snapshots, order + items, cart drained.
        let total_amount: Decimal = items
            .iter()
            .map(|item| item.price_at_add * Decimal::from(item.quantity))
            .sum();
        let total = Price::new(total_amount, currency.unwrap_or_default());

        let order_id = orders::insert_order(&mut tx, user_id, total).await?;
        for item in &items {
            orders::insert_order_item(
                &mut tx,
                order_id,
                item.variant_id,
                item.quantity,
                item.price_at_add,
            )
            .await?;
        }

        // The drain doubles as an optimistic guard: if another writer touched
        // the cart since validation, the line count no longer matches and the
        // whole transaction is abandoned.
        let drained = carts::clear_items(&mut tx, cart_id).await?;
        if drained != items.len() as u64 {
            return Err(
                RepositoryError::Conflict("cart changed during checkout".to_owned()).into(),
            );
        }

        let order = orders::fetch_order(&mut tx, order_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption("order missing inside its own transaction".to_owned())
        })?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(%order_id, %user_id, total = %order.total, "checkout committed");

        Ok(order)
    }
}
