//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use mitienda_core::{CartId, CartItemId, UserId, VariantId};

/// A user's mutable shopping cart.
///
/// There is at most one cart per user; it is created lazily on first access
/// and survives checkout as an empty container.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Whether the cart has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One line of a cart: a variant and how many of it.
///
/// `price_at_add` is captured from the variant when the line is inserted and
/// never re-synced; it is the price the customer was shown.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub variant_id: VariantId,
    pub quantity: i64,
    pub price_at_add: Decimal,
    pub added_at: DateTime<Utc>,
}
