//! Cart repository for database operations.
//!
//! Cart rows are only ever mutated through these queries; item-level writes
//! are scoped to the owning user by joining through the parent cart, never by
//! trusting a client-supplied cart id.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

use mitienda_core::{CartId, CartItemId, UserId, VariantId};

use super::{RepositoryError, parse_decimal};
use crate::models::{Cart, CartItem};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CartRow {
    fn into_cart(self, items: Vec<CartItem>) -> Cart {
        Cart {
            id: CartId::new(self.id),
            user_id: UserId::new(self.user_id),
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for cart item queries.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    cart_id: i64,
    variant_id: i64,
    quantity: i64,
    price_at_add: String,
    added_at: DateTime<Utc>,
}

impl CartItemRow {
    fn into_item(self) -> Result<CartItem, RepositoryError> {
        Ok(CartItem {
            id: CartItemId::new(self.id),
            cart_id: CartId::new(self.cart_id),
            variant_id: VariantId::new(self.variant_id),
            quantity: self.quantity,
            price_at_add: parse_decimal(&self.price_at_add)?,
            added_at: self.added_at,
        })
    }
}

// =============================================================================
// Executor-level queries
// =============================================================================
//
// These take any executor so the checkout coordinator and the cart service
// can run them inside their own transactions.

/// Get the id of the user's cart, creating the cart row if absent.
///
/// `INSERT OR IGNORE` makes the create-on-miss race-free: a concurrent first
/// touch loses against the UNIQUE(user_id) constraint and both callers see
/// the same row.
pub(crate) async fn ensure_cart(
    conn: &mut SqliteConnection,
    user_id: UserId,
) -> Result<CartId, RepositoryError> {
    let now = Utc::now();

    sqlx::query(
        r"
        INSERT OR IGNORE INTO carts (user_id, created_at, updated_at)
        VALUES (?1, ?2, ?2)
        ",
    )
    .bind(user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
        .bind(user_id)
        .fetch_one(conn)
        .await?;

    Ok(CartId::new(id))
}

/// Get the id of the user's cart, if it exists.
pub(crate) async fn find_cart_id(
    executor: impl SqliteExecutor<'_>,
    user_id: UserId,
) -> Result<Option<CartId>, RepositoryError> {
    let id: Option<i64> = sqlx::query_scalar("SELECT id FROM carts WHERE user_id = ?1")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(id.map(CartId::new))
}

/// Load all items of a cart, oldest first.
pub(crate) async fn items_for_cart(
    executor: impl SqliteExecutor<'_>,
    cart_id: CartId,
) -> Result<Vec<CartItem>, RepositoryError> {
    let rows = sqlx::query_as::<_, CartItemRow>(
        r"
        SELECT id, cart_id, variant_id, quantity, price_at_add, added_at
        FROM cart_items
        WHERE cart_id = ?1
        ORDER BY added_at ASC, id ASC
        ",
    )
    .bind(cart_id)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(CartItemRow::into_item).collect()
}

/// Find the id of the cart line holding `variant_id`, if any.
pub(crate) async fn find_item_by_variant(
    executor: impl SqliteExecutor<'_>,
    cart_id: CartId,
    variant_id: VariantId,
) -> Result<Option<CartItemId>, RepositoryError> {
    let id: Option<i64> =
        sqlx::query_scalar("SELECT id FROM cart_items WHERE cart_id = ?1 AND variant_id = ?2")
            .bind(cart_id)
            .bind(variant_id)
            .fetch_optional(executor)
            .await?;

    Ok(id.map(CartItemId::new))
}

/// Insert a new cart line with the price snapshot taken at this moment.
pub(crate) async fn insert_item(
    conn: &mut SqliteConnection,
    cart_id: CartId,
    variant_id: VariantId,
    quantity: i64,
    price_at_add: Decimal,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO cart_items (cart_id, variant_id, quantity, price_at_add, added_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ",
    )
    .bind(cart_id)
    .bind(variant_id)
    .bind(quantity)
    .bind(price_at_add.to_string())
    .bind(Utc::now())
    .execute(conn)
    .await?;

    Ok(())
}

/// Add `quantity` to an existing cart line. The price snapshot is untouched.
pub(crate) async fn increment_item(
    conn: &mut SqliteConnection,
    item_id: CartItemId,
    quantity: i64,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE cart_items SET quantity = quantity + ?2 WHERE id = ?1")
        .bind(item_id)
        .bind(quantity)
        .execute(conn)
        .await?;

    Ok(())
}

/// Set the quantity of a cart line owned by `user_id`.
///
/// Returns the number of rows affected: zero means the item doesn't exist or
/// belongs to another user's cart.
pub(crate) async fn set_item_quantity(
    executor: impl SqliteExecutor<'_>,
    item_id: CartItemId,
    user_id: UserId,
    quantity: i64,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE cart_items
        SET quantity = ?3
        WHERE id = ?1
          AND cart_id IN (SELECT id FROM carts WHERE user_id = ?2)
        ",
    )
    .bind(item_id)
    .bind(user_id)
    .bind(quantity)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Delete a cart line owned by `user_id`.
///
/// Returns the number of rows affected: zero means the item doesn't exist or
/// belongs to another user's cart.
pub(crate) async fn delete_item(
    executor: impl SqliteExecutor<'_>,
    item_id: CartItemId,
    user_id: UserId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query(
        r"
        DELETE FROM cart_items
        WHERE id = ?1
          AND cart_id IN (SELECT id FROM carts WHERE user_id = ?2)
        ",
    )
    .bind(item_id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Delete every item of a cart, leaving the cart row itself in place.
///
/// Returns the number of lines deleted so the caller can verify the cart
/// still holds exactly what it validated.
pub(crate) async fn clear_items(
    conn: &mut SqliteConnection,
    cart_id: CartId,
) -> Result<u64, RepositoryError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    touch_cart(conn, cart_id).await?;

    Ok(result.rows_affected())
}

/// Bump a cart's `updated_at`.
pub(crate) async fn touch_cart(
    conn: &mut SqliteConnection,
    cart_id: CartId,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
        .bind(cart_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's cart with its items, creating an empty cart if absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if item data is invalid.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = ensure_cart(&mut tx, user_id).await?;
        tx.commit().await?;

        self.get(cart_id).await
    }

    /// Load a cart with its items by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn get(&self, cart_id: CartId) -> Result<Cart, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            r"
            SELECT id, user_id, created_at, updated_at
            FROM carts
            WHERE id = ?1
            ",
        )
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let items = items_for_cart(self.pool, cart_id).await?;
        Ok(row.into_cart(items))
    }
}
