//! Catalog repository for database operations.
//!
//! Storefront reads only see active products; the admin surface mutates them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use mitienda_core::{CurrencyCode, Price, ProductId, VariantId};

use super::{RepositoryError, parse_currency, parse_decimal};
use crate::models::{Product, ProductVariant, ResolvedVariant};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    sku: Option<String>,
    title: String,
    slug: String,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, variants: Vec<ProductVariant>) -> Product {
        Product {
            id: ProductId::new(self.id),
            sku: self.sku,
            title: self.title,
            slug: self.slug,
            description: self.description,
            is_active: self.is_active,
            variants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type for variant queries.
#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    sku: String,
    price: String,
    currency: String,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VariantRow {
    fn into_variant(self) -> Result<ProductVariant, RepositoryError> {
        let amount = parse_decimal(&self.price)?;
        let currency = parse_currency(&self.currency)?;

        Ok(ProductVariant {
            id: VariantId::new(self.id),
            product_id: ProductId::new(self.product_id),
            sku: self.sku,
            price: Price::new(amount, currency),
            stock: self.stock,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Input for creating a product with its variants.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductInput {
    pub sku: Option<String>,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variants: Vec<CreateVariantInput>,
}

/// Input for creating one variant of a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVariantInput {
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub currency: CurrencyCode,
    #[serde(default)]
    pub stock: i64,
}

/// Input for updating a product. `None` fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProductInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Derive a URL slug from a product title.
fn slugify(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "-")
}

// =============================================================================
// Executor-level queries
// =============================================================================

/// Resolve a variant together with its parent product's availability.
///
/// Takes any executor so checkout can call it inside its own transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if price or currency data is invalid.
pub(crate) async fn resolve_variant(
    executor: impl SqliteExecutor<'_>,
    id: VariantId,
) -> Result<Option<ResolvedVariant>, RepositoryError> {
    #[derive(sqlx::FromRow)]
    struct ResolvedRow {
        #[sqlx(flatten)]
        variant: VariantRow,
        product_active: bool,
    }

    let row = sqlx::query_as::<_, ResolvedRow>(
        r"
        SELECT v.id, v.product_id, v.sku, v.price, v.currency, v.stock,
               v.created_at, v.updated_at,
               p.is_active AS product_active
        FROM product_variants v
        INNER JOIN products p ON p.id = v.product_id
        WHERE v.id = ?1
        ",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    match row {
        Some(r) => Ok(Some(ResolvedVariant {
            variant: r.variant.into_variant()?,
            product_active: r.product_active,
        })),
        None => Ok(None),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List active products with their variants, paginated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if variant data is invalid.
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, sku, title, slug, description, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
            ORDER BY id ASC
            LIMIT ?1 OFFSET ?2
            ",
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let variants = self.variants_for_products(&rows).await?;

        let mut products = Vec::with_capacity(rows.len());
        for row in rows {
            let product_variants = variants
                .iter()
                .filter(|v| v.product_id.as_i64() == row.id)
                .cloned()
                .collect();
            products.push(row.into_product(product_variants));
        }

        Ok(products)
    }

    /// Get an active product by its slug, with variants.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if variant data is invalid.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, sku, title, slug, description, is_active, created_at, updated_at
            FROM products
            WHERE slug = ?1 AND is_active = 1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let variants = self.variants_for_product(ProductId::new(row.id)).await?;
        Ok(Some(row.into_product(variants)))
    }

    /// Create a product and its variants in one transaction.
    ///
    /// The slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug or a variant SKU already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, input: &CreateProductInput) -> Result<Product, RepositoryError> {
        let now = Utc::now();
        let slug = slugify(&input.title);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (sku, title, slug, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            RETURNING id, sku, title, slug, description, is_active, created_at, updated_at
            ",
        )
        .bind(input.sku.as_deref())
        .bind(&input.title)
        .bind(&slug)
        .bind(input.description.as_deref())
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(unique_to_conflict)?;

        let product_id = ProductId::new(row.id);
        let mut variants = Vec::with_capacity(input.variants.len());

        for variant in &input.variants {
            let variant_row = sqlx::query_as::<_, VariantRow>(
                r"
                INSERT INTO product_variants (product_id, sku, price, currency, stock,
                                              created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                RETURNING id, product_id, sku, price, currency, stock, created_at, updated_at
                ",
            )
            .bind(product_id)
            .bind(&variant.sku)
            .bind(variant.price.to_string())
            .bind(variant.currency.as_str())
            .bind(variant.stock)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(unique_to_conflict)?;

            variants.push(variant_row.into_variant()?);
        }

        tx.commit().await?;

        Ok(row.into_product(variants))
    }

    /// Update a product. The slug is re-derived when the title changes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        input: &UpdateProductInput,
    ) -> Result<Product, RepositoryError> {
        let slug = input.title.as_deref().map(slugify);

        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET title = COALESCE(?2, title),
                slug = COALESCE(?3, slug),
                description = COALESCE(?4, description),
                is_active = COALESCE(?5, is_active),
                updated_at = ?6
            WHERE id = ?1
            RETURNING id, sku, title, slug, description, is_active, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(input.title.as_deref())
        .bind(slug.as_deref())
        .bind(input.description.as_deref())
        .bind(input.is_active)
        .bind(Utc::now())
        .fetch_optional(self.pool)
        .await
        .map_err(unique_to_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        let variants = self.variants_for_product(ProductId::new(row.id)).await?;
        Ok(row.into_product(variants))
    }

    /// Update a variant's live price. Existing cart lines keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_variant_price(
        &self,
        id: VariantId,
        price: Decimal,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_variants
            SET price = ?2, updated_at = ?3
            WHERE id = ?1
            ",
        )
        .bind(id)
        .bind(price.to_string())
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn variants_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, product_id, sku, price, currency, stock, created_at, updated_at
            FROM product_variants
            WHERE product_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(VariantRow::into_variant).collect()
    }

    async fn variants_for_products(
        &self,
        products: &[ProductRow],
    ) -> Result<Vec<ProductVariant>, RepositoryError> {
        let mut builder: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
            "SELECT id, product_id, sku, price, currency, stock, created_at, updated_at \
             FROM product_variants WHERE product_id IN (",
        );

        let mut separated = builder.separated(", ");
        for product in products {
            separated.push_bind(product.id);
        }
        builder.push(") ORDER BY id ASC");

        let rows = builder
            .build_query_as::<VariantRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(VariantRow::into_variant).collect()
    }
}

/// Map unique-constraint violations to `RepositoryError::Conflict`.
fn unique_to_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("sku or slug already exists".to_owned());
    }
    RepositoryError::Database(e)
}
