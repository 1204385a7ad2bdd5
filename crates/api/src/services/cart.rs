//! Cart service: the mutation surface of a user's cart.
//!
//! Each operation resolves ownership through the parent cart, so a foreign
//! item id behaves exactly like a missing one.

use sqlx::SqlitePool;
use thiserror::Error;

use mitienda_core::{CartItemId, UserId, VariantId};

use crate::db::{CartRepository, RepositoryError, carts, products};
use crate::models::Cart;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced variant doesn't exist or is no longer purchasable.
    #[error("variant not found")]
    VariantNotFound,

    /// The referenced cart item doesn't exist or belongs to another user.
    #[error("cart item not found")]
    ItemNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Service for cart reads and mutations.
pub struct CartService<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, CartError> {
        Ok(CartRepository::new(self.pool).get_or_create(user_id).await?)
    }

    /// Add a variant to the user's cart.
    ///
    /// If the variant is already in the cart its quantity is incremented and
    /// the original price snapshot is kept; otherwise a new line is inserted
    /// with the variant's current price as `price_at_add`. The resolution and
    /// the write happen in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `CartError::VariantNotFound` if the variant doesn't resolve or
    /// its product has been deactivated.
    pub async fn add_item(
        &self,
        user_id: UserId,
        variant_id: VariantId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        let cart_id = carts::ensure_cart(&mut tx, user_id).await?;

        let resolved = products::resolve_variant(&mut *tx, variant_id)
            .await?
            .ok_or(CartError::VariantNotFound)?;
        if !resolved.is_available() {
            return Err(CartError::VariantNotFound);
        }

        match carts::find_item_by_variant(&mut *tx, cart_id, variant_id).await? {
            Some(item_id) => carts::increment_item(&mut tx, item_id, quantity).await?,
            None => {
                carts::insert_item(
                    &mut tx,
                    cart_id,
                    variant_id,
                    quantity,
                    resolved.variant.price.amount,
                )
                .await?;
            }
        }

        carts::touch_cart(&mut tx, cart_id).await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        Ok(CartRepository::new(self.pool).get(cart_id).await?)
    }

    /// Set a cart line's quantity; a quantity of zero or less deletes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the item doesn't exist or belongs
    /// to another user.
    pub async fn update_item_quantity(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<Cart, CartError> {
        let affected = if quantity <= 0 {
            carts::delete_item(self.pool, item_id, user_id).await?
        } else {
            carts::set_item_quantity(self.pool, item_id, user_id, quantity).await?
        };

        if affected == 0 {
            return Err(CartError::ItemNotFound);
        }

        self.get_or_create(user_id).await
    }

    /// Remove a cart line. Removing a line that is already gone succeeds.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<(), CartError> {
        carts::delete_item(self.pool, item_id, user_id).await?;
        Ok(())
    }
}
