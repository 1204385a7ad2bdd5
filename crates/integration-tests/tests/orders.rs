//! Order aggregate behavior: ownership-scoped reads, the status state
//! machine, and cancellation restocking.

use mitienda_api::db::OrderRepository;
use mitienda_api::services::{CartService, CheckoutService, OrderError, OrderService};
use mitienda_core::{OrderId, OrderStatus};
use mitienda_integration_tests::{
    create_product, create_user, journal_total, stock_of, test_pool,
};

use sqlx::SqlitePool;

use mitienda_api::models::Order;
use mitienda_core::{UserId, VariantId};

async fn place_order(pool: &SqlitePool, user_id: UserId, variant_id: VariantId) -> Order {
    CartService::new(pool)
        .add_item(user_id, variant_id, 2)
        .await
        .expect("add to cart");

    CheckoutService::new(pool)
        .checkout(user_id)
        .await
        .expect("checkout")
}

#[tokio::test]
async fn order_reads_are_scoped_to_the_owner() {
    let pool = test_pool().await;
    let owner = create_user(&pool, "owner@example.com").await;
    let intruder = create_user(&pool, "intruder@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 10).await;

    let order = place_order(&pool, owner.id, variant_id).await;
    let repo = OrderRepository::new(&pool);

    // The owner sees the order.
    let found = repo
        .get_for_user(order.id, owner.id)
        .await
        .expect("query")
        .expect("owner sees own order");
    assert_eq!(found.id, order.id);
    assert_eq!(found.items.len(), 1);

    // Another user sees nothing, indistinguishable from a missing order.
    let hidden = repo.get_for_user(order.id, intruder.id).await.expect("query");
    assert!(hidden.is_none());

    assert_eq!(repo.list_for_user(owner.id).await.expect("list").len(), 1);
    assert!(repo.list_for_user(intruder.id).await.expect("list").is_empty());
}

#[tokio::test]
async fn fulfillment_line_transitions_succeed() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 10).await;

    let order = place_order(&pool, user.id, variant_id).await;
    let service = OrderService::new(&pool);

    let order = service
        .transition_status(order.id, OrderStatus::Paid)
        .await
        .expect("pending -> paid");
    assert_eq!(order.status, OrderStatus::Paid);

    let order = service
        .transition_status(order.id, OrderStatus::Shipped)
        .await
        .expect("paid -> shipped");
    assert_eq!(order.status, OrderStatus::Shipped);

    let order = service
        .transition_status(order.id, OrderStatus::Delivered)
        .await
        .expect("shipped -> delivered");
    assert_eq!(order.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn disallowed_edges_are_rejected_and_persist_nothing() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 10).await;

    let order = place_order(&pool, user.id, variant_id).await;
    let service = OrderService::new(&pool);

    // Skipping ahead is not allowed.
    let result = service
        .transition_status(order.id, OrderStatus::Delivered)
        .await;
    assert!(matches!(result, Err(OrderError::Transition(_))));

    // The stored status is unchanged.
    let stored = OrderRepository::new(&pool)
        .get_for_user(order.id, user.id)
        .await
        .expect("query")
        .expect("order exists");
    assert_eq!(stored.status, OrderStatus::Pending);

    // Cancellation after shipping is also rejected.
    service
        .transition_status(order.id, OrderStatus::Paid)
        .await
        .expect("pending -> paid");
    service
        .transition_status(order.id, OrderStatus::Shipped)
        .await
        .expect("paid -> shipped");
    let result = service
        .transition_status(order.id, OrderStatus::Cancelled)
        .await;
    assert!(matches!(result, Err(OrderError::Transition(_))));
}

#[tokio::test]
async fn cancelling_a_paid_order_restocks_its_lines() {
    let pool = test_pool().await;
    let user = create_user(&pool, "shopper@example.com").await;
    let (_, variant_id) = create_product(&pool, "Lamp", "10.00", 10).await;

    let order = place_order(&pool, user.id, variant_id).await;
    assert_eq!(stock_of(&pool, variant_id).await, 8);

    let service = OrderService::new(&pool);
    service
        .transition_status(order.id, OrderStatus::Paid)
        .await
        .expect("pending -> paid");
    let order = service
        .transition_status(order.id, OrderStatus::Cancelled)
        .await
        .expect("paid -> cancelled");

    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&pool, variant_id).await, 10);
    assert_eq!(journal_total(&pool, variant_id, "order_cancelled").await, 2);

    // The order's line items are untouched by cancellation.
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 2);
}

#[tokio::test]
async fn transition_on_missing_order_fails() {
    let pool = test_pool().await;

    let result = OrderService::new(&pool)
        .transition_status(OrderId::new(999), OrderStatus::Paid)
        .await;

    assert!(matches!(result, Err(OrderError::NotFound)));
}
