//! Catalog domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mitienda_core::{Price, ProductId, VariantId};

/// A catalog product with its sellable variants.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: Option<String>,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub variants: Vec<ProductVariant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A sellable variant of a product.
///
/// `price` is the live catalog price; carts snapshot it at add-time and never
/// re-read it. `stock` is the authoritative on-hand count.
#[derive(Debug, Clone, Serialize)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub price: Price,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A variant resolved together with its parent product's availability.
///
/// Cart insertion and checkout validation both need to know whether the
/// product is still purchasable, not just whether the variant row exists.
#[derive(Debug, Clone)]
pub struct ResolvedVariant {
    pub variant: ProductVariant,
    pub product_active: bool,
}

impl ResolvedVariant {
    /// Whether the variant can currently be sold.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.product_active
    }
}
