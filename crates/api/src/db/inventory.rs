//! Inventory ledger: stock reads and atomic stock mutations.
//!
//! Every mutation takes the caller's connection so it joins whatever
//! transaction the caller holds: the checkout coordinator's order writes and
//! its stock decrements commit or roll back together. Each mutation also
//! appends a row to `inventory_events`, the append-only stock journal.

use chrono::Utc;
use sqlx::SqliteConnection;

use mitienda_core::VariantId;

use super::RepositoryError;

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockReservation {
    /// Stock was sufficient and has been decremented.
    Reserved,
    /// Stock was below the requested quantity; nothing changed.
    Insufficient,
}

/// Stock operations against the `product_variants.stock` column.
pub struct InventoryLedger;

impl InventoryLedger {
    /// Atomically check `stock >= quantity` and decrement by `quantity`.
    ///
    /// The check and the write are a single conditional UPDATE, so two
    /// transactions racing for the same units cannot both pass the check:
    /// the losing side sees zero rows affected and gets
    /// [`StockReservation::Insufficient`]. Stock can never go negative.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn check_and_decrement(
        conn: &mut SqliteConnection,
        variant_id: VariantId,
        quantity: i64,
        reason: &str,
    ) -> Result<StockReservation, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_variants
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            ",
        )
        .bind(variant_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(StockReservation::Insufficient);
        }

        Self::record_event(conn, variant_id, -quantity, reason).await?;

        Ok(StockReservation::Reserved)
    }

    /// Increment a variant's stock (restock, cancellation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn increment(
        conn: &mut SqliteConnection,
        variant_id: VariantId,
        quantity: i64,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_variants
            SET stock = stock + ?2, updated_at = ?3
            WHERE id = ?1
            ",
        )
        .bind(variant_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Self::record_event(conn, variant_id, quantity, reason).await?;

        Ok(())
    }

    async fn record_event(
        conn: &mut SqliteConnection,
        variant_id: VariantId,
        delta: i64,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO inventory_events (variant_id, delta, reason, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(variant_id)
        .bind(delta)
        .bind(reason)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        Ok(())
    }
}
