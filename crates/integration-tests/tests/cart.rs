//! Cart aggregate behavior: lazy creation, merge-on-add, price snapshots,
//! ownership scoping, and idempotent removal.

use rust_decimal::Decimal;
use sqlx::SqlitePool;

use mitienda_api::db::ProductRepository;
use mitienda_api::services::{CartError, CartService};
use mitienda_core::CartItemId;
use mitienda_integration_tests::{create_product, create_user, test_pool};

async fn cart_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM carts")
        .fetch_one(pool)
        .await
        .expect("count carts")
}

#[tokio::test]
async fn get_or_create_persists_one_cart_per_user() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let carts = CartService::new(&pool);

    assert_eq!(cart_count(&pool).await, 0);

    let first = carts.get_or_create(user.id).await.expect("create cart");
    assert!(first.is_empty());
    assert_eq!(cart_count(&pool).await, 1);

    // Second access returns the same cart instead of creating another.
    let second = carts.get_or_create(user.id).await.expect("get cart");
    assert_eq!(second.id, first.id);
    assert_eq!(cart_count(&pool).await, 1);
}

#[tokio::test]
async fn adding_same_variant_twice_merges_quantities() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    carts.add_item(user.id, variant_id, 2).await.expect("add 2");
    let cart = carts.add_item(user.id, variant_id, 3).await.expect("add 3");

    assert_eq!(cart.items.len(), 1);
    let item = &cart.items[0];
    assert_eq!(item.quantity, 5);
    assert_eq!(item.price_at_add, Decimal::new(1999, 2));
}

#[tokio::test]
async fn price_snapshot_survives_catalog_price_change() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    carts.add_item(user.id, variant_id, 1).await.expect("add");

    ProductRepository::new(&pool)
        .set_variant_price(variant_id, Decimal::new(2999, 2))
        .await
        .expect("raise price");

    let cart = carts.get_or_create(user.id).await.expect("reload cart");
    assert_eq!(cart.items[0].price_at_add, Decimal::new(1999, 2));

    // A fresh line for another shopper snapshots the new price.
    let other = create_user(&pool, "other@example.com").await;
    let other_cart = carts.add_item(other.id, variant_id, 1).await.expect("add");
    assert_eq!(other_cart.items[0].price_at_add, Decimal::new(2999, 2));
}

#[tokio::test]
async fn add_unknown_variant_fails() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;

    let result = CartService::new(&pool)
        .add_item(user.id, mitienda_core::VariantId::new(999), 1)
        .await;

    assert!(matches!(result, Err(CartError::VariantNotFound)));
}

#[tokio::test]
async fn add_deactivated_product_fails() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (product, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;

    sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
        .bind(product.id)
        .execute(&pool)
        .await
        .expect("deactivate product");

    let result = CartService::new(&pool).add_item(user.id, variant_id, 1).await;
    assert!(matches!(result, Err(CartError::VariantNotFound)));
}

#[tokio::test]
async fn update_quantity_zero_deletes_the_line() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    let cart = carts.add_item(user.id, variant_id, 2).await.expect("add");
    let item_id = cart.items[0].id;

    let cart = carts
        .update_item_quantity(user.id, item_id, 0)
        .await
        .expect("delete on zero");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn update_quantity_sets_the_new_value() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    let cart = carts.add_item(user.id, variant_id, 2).await.expect("add");
    let item_id = cart.items[0].id;

    let cart = carts
        .update_item_quantity(user.id, item_id, 7)
        .await
        .expect("set quantity");
    assert_eq!(cart.items[0].quantity, 7);
}

#[tokio::test]
async fn update_missing_or_foreign_item_fails_identically() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let intruder = create_user(&pool, "intruder@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    let cart = carts.add_item(owner.id, variant_id, 2).await.expect("add");
    let item_id = cart.items[0].id;

    // Foreign item: reported as missing, not as a permission error.
    let foreign = carts.update_item_quantity(intruder.id, item_id, 5).await;
    assert!(matches!(foreign, Err(CartError::ItemNotFound)));

    // Nonexistent item: the same error.
    let missing = carts
        .update_item_quantity(owner.id, CartItemId::new(999), 5)
        .await;
    assert!(matches!(missing, Err(CartError::ItemNotFound)));

    // The owner's line is untouched.
    let cart = carts.get_or_create(owner.id).await.expect("reload");
    assert_eq!(cart.items[0].quantity, 2);
}

#[tokio::test]
async fn remove_item_is_idempotent() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    let cart = carts.add_item(user.id, variant_id, 1).await.expect("add");
    let item_id = cart.items[0].id;

    carts.remove_item(user.id, item_id).await.expect("remove");
    // Removing again is a no-op success.
    carts.remove_item(user.id, item_id).await.expect("remove again");

    let cart = carts.get_or_create(user.id).await.expect("reload");
    assert!(cart.is_empty());
}

#[tokio::test]
async fn remove_foreign_item_leaves_it_in_place() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let intruder = create_user(&pool, "intruder@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "19.99", 100).await;
    let carts = CartService::new(&pool);

    let cart = carts.add_item(owner.id, variant_id, 1).await.expect("add");
    let item_id = cart.items[0].id;

    // A foreign delete succeeds as a no-op.
    carts
        .remove_item(intruder.id, item_id)
        .await
        .expect("foreign remove is a no-op");

    let cart = carts.get_or_create(owner.id).await.expect("reload");
    assert_eq!(cart.items.len(), 1);
}
