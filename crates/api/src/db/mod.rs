//! Database operations for the MiTienda `SQLite` store.
//!
//! # Tables
//!
//! - `users` - Site authentication and account data
//! - `products` / `product_variants` - Catalog with live price and stock
//! - `inventory_events` - Append-only journal of stock mutations
//! - `carts` / `cart_items` - One mutable cart per user
//! - `orders` / `order_items` - Immutable order records with price snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/`, embedded at compile
//! time via [`MIGRATOR`], and run via:
//! ```bash
//! cargo run -p mitienda-cli -- migrate
//! ```

pub mod carts;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

use mitienda_core::{CurrencyCode, OrderStatus};

pub use carts::CartRepository;
pub use inventory::InventoryLedger;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// The database file is created if missing; foreign keys are enforced and a
/// busy timeout absorbs short write contention between connections.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection fails.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Parse a decimal column stored as text.
pub(crate) fn parse_decimal(value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid decimal in database: {e}")))
}

/// Parse a currency column stored as an ISO 4217 code.
pub(crate) fn parse_currency(value: &str) -> Result<CurrencyCode, RepositoryError> {
    value
        .parse::<CurrencyCode>()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid currency in database: {e}")))
}

/// Parse an order status column.
pub(crate) fn parse_status(value: &str) -> Result<OrderStatus, RepositoryError> {
    value
        .parse::<OrderStatus>()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid status in database: {e}")))
}
