//! Seed the database with a demo catalog.
//!
//! Creates a handful of products with variants so the storefront has
//! something to sell, and - when `MITIENDA_ADMIN_PASSWORD` is set - an
//! `admin@mitienda.example` staff account for the admin surface.
//!
//! Seeding is additive and skips anything that already exists, so it is safe
//! to run more than once.

use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::info;

use mitienda_api::db::products::{CreateProductInput, CreateVariantInput};
use mitienda_api::db::{ProductRepository, RepositoryError, UserRepository};
use mitienda_api::services::AuthService;
use mitienda_core::{CurrencyCode, Email};

use super::migrate::database_url_from_env;

/// Seed demo data.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a write fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;
    let pool = mitienda_api::db::create_pool(&database_url).await?;

    info!("Running migrations...");
    mitienda_api::db::MIGRATOR.run(&pool).await?;

    seed_catalog(&pool).await?;
    seed_admin(&pool).await?;

    info!("Seeding complete!");
    Ok(())
}

async fn seed_catalog(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let products = ProductRepository::new(pool);

    let demo = [
        CreateProductInput {
            sku: Some("CAF-01".to_owned()),
            title: "Cafetera Italiana".to_owned(),
            description: Some("Stovetop espresso maker, 6 cups.".to_owned()),
            variants: vec![CreateVariantInput {
                sku: "CAF-01-STD".to_owned(),
                price: Decimal::new(3499, 2),
                currency: CurrencyCode::USD,
                stock: 25,
            }],
        },
        CreateProductInput {
            sku: Some("TAZ-01".to_owned()),
            title: "Taza Ceramica".to_owned(),
            description: Some("Hand-glazed ceramic mug.".to_owned()),
            variants: vec![
                CreateVariantInput {
                    sku: "TAZ-01-BLU".to_owned(),
                    price: Decimal::new(1250, 2),
                    currency: CurrencyCode::USD,
                    stock: 40,
                },
                CreateVariantInput {
                    sku: "TAZ-01-RED".to_owned(),
                    price: Decimal::new(1250, 2),
                    currency: CurrencyCode::USD,
                    stock: 40,
                },
            ],
        },
    ];

    for input in demo {
        match products.create(&input).await {
            Ok(product) => info!(slug = %product.slug, "Seeded product"),
            Err(RepositoryError::Conflict(_)) => {
                info!(title = %input.title, "Product already seeded, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), Box<dyn std::error::Error>> {
    let Ok(password) = std::env::var("MITIENDA_ADMIN_PASSWORD") else {
        info!("MITIENDA_ADMIN_PASSWORD not set, skipping admin account");
        return Ok(());
    };

    let email = Email::parse("admin@mitienda.example")?;

    if UserRepository::new(pool).get_by_email(&email).await?.is_some() {
        info!("Admin account already exists, skipping");
        return Ok(());
    }

    let user = AuthService::new(pool)
        .register(email.as_str(), &password, Some("Store Admin"))
        .await?;

    sqlx::query("UPDATE users SET is_staff = 1 WHERE id = ?1")
        .bind(user.id)
        .execute(pool)
        .await?;

    info!(%user.id, "Seeded admin account");
    Ok(())
}
