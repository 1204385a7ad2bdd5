//! Order repository for database operations.
//!
//! Orders are written exactly once, inside the checkout coordinator's
//! transaction; afterwards only the status column changes. Customer reads are
//! always scoped by the requesting user, so a foreign order is
//! indistinguishable from a missing one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use mitienda_core::{OrderId, OrderItemId, OrderStatus, Price, UserId, VariantId};

use super::{RepositoryError, parse_currency, parse_decimal, parse_status};
use crate::models::{Order, OrderItem};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    status: String,
    total_amount: String,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let amount = parse_decimal(&self.total_amount)?;
        let currency = parse_currency(&self.currency)?;
        let status = parse_status(&self.status)?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            status,
            total: Price::new(amount, currency),
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i64,
    order_id: i64,
    variant_id: i64,
    quantity: i64,
    unit_price: String,
    total_price: String,
}

impl OrderItemRow {
    fn into_item(self) -> Result<OrderItem, RepositoryError> {
        Ok(OrderItem {
            id: OrderItemId::new(self.id),
            order_id: OrderId::new(self.order_id),
            variant_id: VariantId::new(self.variant_id),
            quantity: self.quantity,
            unit_price: parse_decimal(&self.unit_price)?,
            total_price: parse_decimal(&self.total_price)?,
        })
    }
}

// =============================================================================
// Executor-level queries
// =============================================================================
//
// The checkout coordinator calls these with its own transaction so the order
// write commits or rolls back together with the stock decrements.

/// Insert a new order with status `pending` and return its id.
pub(crate) async fn insert_order(
    conn: &mut SqliteConnection,
    user_id: UserId,
    total: Price,
) -> Result<OrderId, RepositoryError> {
    let id: i64 = sqlx::query_scalar(
        r"
        INSERT INTO orders (user_id, status, total_amount, currency, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(OrderStatus::Pending.to_string())
    .bind(total.amount.to_string())
    .bind(total.currency.as_str())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?;

    Ok(OrderId::new(id))
}

/// Insert one order line, copying the cart line's price snapshot.
pub(crate) async fn insert_order_item(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    variant_id: VariantId,
    quantity: i64,
    unit_price: Decimal,
) -> Result<(), RepositoryError> {
    let total_price = unit_price * Decimal::from(quantity);

    sqlx::query(
        r"
        INSERT INTO order_items (order_id, variant_id, quantity, unit_price, total_price)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
    )
    .bind(order_id)
    .bind(variant_id)
    .bind(quantity)
    .bind(unit_price.to_string())
    .bind(total_price.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

/// Load an order with its items, unscoped.
pub(crate) async fn fetch_order(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, user_id, status, total_amount, currency, created_at, updated_at
        FROM orders
        WHERE id = ?1
        ",
    )
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items = items_for_order(&mut *conn, order_id).await?;
    Ok(Some(row.into_order(items)?))
}

/// Load all items of an order.
pub(crate) async fn items_for_order(
    executor: impl SqliteExecutor<'_>,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, order_id, variant_id, quantity, unit_price, total_price
        FROM order_items
        WHERE order_id = ?1
        ORDER BY id ASC
        ",
    )
    .bind(order_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(OrderItemRow::into_item).collect()
}

/// Read an order's current status, unscoped.
pub(crate) async fn order_status(
    conn: &mut SqliteConnection,
    order_id: OrderId,
) -> Result<Option<OrderStatus>, RepositoryError> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;

    status.as_deref().map(parse_status).transpose()
}

/// Persist a new order status.
pub(crate) async fn set_order_status(
    conn: &mut SqliteConnection,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(order_id)
        .bind(status.to_string())
        .bind(Utc::now())
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List a user's orders with items, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if order data is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, total_amount, currency, created_at, updated_at
            FROM orders
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Get one of the user's orders with items.
    ///
    /// A foreign order is reported as absent, not as a permission error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if order data is invalid.
    pub async fn get_for_user(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, total_amount, currency, created_at, updated_at
            FROM orders
            WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = items_for_order(self.pool, OrderId::new(row.id)).await?;
        Ok(Some(row.into_order(items)?))
    }

    /// List every order in the system with items, newest first (staff only).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if order data is invalid.
    pub async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, total_amount, currency, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        self.attach_items(rows).await
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, order_id, variant_id, quantity, unit_price, total_price \
             FROM order_items WHERE order_id IN (",
        );

        let mut separated = builder.separated(", ");
        for row in &rows {
            separated.push_bind(row.id);
        }
        builder.push(") ORDER BY id ASC");

        let item_rows = builder
            .build_query_as::<OrderItemRow>()
            .fetch_all(self.pool)
            .await?;

        let mut items = Vec::with_capacity(item_rows.len());
        for item_row in item_rows {
            items.push(item_row.into_item()?);
        }

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_items = items
                .iter()
                .filter(|i| i.order_id.as_i64() == row.id)
                .cloned()
                .collect();
            orders.push(row.into_order(order_items)?);
        }

        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_row_rejects_bad_status() {
        let row = OrderRow {
            id: 1,
            user_id: 1,
            status: "refunded".to_owned(),
            total_amount: "10.00".to_owned(),
            currency: "USD".to_owned(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(matches!(
            row.into_order(Vec::new()),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
