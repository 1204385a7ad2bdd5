//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use mitienda_core::{OrderId, OrderItemId, OrderStatus, Price, UserId, VariantId};

/// An immutable record of a completed checkout.
///
/// Line items never change after creation; only `status` transitions.
/// `total` equals the sum of the items' `total_price` values.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order.
///
/// `unit_price` is copied from the cart line's `price_at_add` at checkout, so
/// later catalog price changes never alter historical orders.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub variant_id: VariantId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}
