//! Database migration command.
//!
//! # Environment Variables
//!
//! - `MITIENDA_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)

use secrecy::SecretString;
use tracing::info;

use mitienda_api::db;

/// Run database migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails to apply.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;

    info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}

/// Read the database URL, preferring the app-specific variable.
pub(crate) fn database_url_from_env() -> Result<SecretString, Box<dyn std::error::Error>> {
    if let Ok(value) = std::env::var("MITIENDA_DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err("MITIENDA_DATABASE_URL not set".into())
}
