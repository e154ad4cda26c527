//! Concurrency tests for the stock coordinator: many sellers hammering accept on orders that compete
//! for the same product's head count.
mod support;

use std::sync::Arc;

use ganado_common::Money;
use ganado_engine::{
    db_types::{NewOrder, OrderStatusType, ProductStatus},
    events::EventProducers,
    OrderFlowApi,
    OrderFlowError,
    SqliteDatabase,
};
use log::*;
use support::{
    prepare_env::{prepare_test_env, random_db_path},
    seed::{seed_marketplace, Fixture},
};
use tokio::task::JoinSet;

async fn place_pending_order(
    api: &OrderFlowApi<SqliteDatabase>,
    fx: &Fixture,
    quantity: i64,
) -> ganado_engine::db_types::OrderId {
    let new_order = NewOrder::new(
        fx.product_id,
        fx.buyer_profile_id,
        fx.seller_profile_id,
        fx.ranch_id,
        quantity,
        Money::from_major(10_000),
    );
    api.create_order(new_order).await.expect("Error creating order").id
}

// Two orders of 3 head race for a stock of 5. Exactly one accept must win; the loser fails with
// InsufficientStock and its order stays Pending.
#[tokio::test(flavor = "multi_thread")]
async fn racing_accepts_never_oversell() {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let pool = db.pool().clone();
    let api = Arc::new(OrderFlowApi::new(db, EventProducers::default()));
    let fx = seed_marketplace(&pool, 5, Money::from_major(10_000)).await;

    let first = place_pending_order(&api, &fx, 3).await;
    let second = place_pending_order(&api, &fx, 3).await;

    let mut set = JoinSet::new();
    for order_id in [first, second] {
        let api = Arc::clone(&api);
        set.spawn(async move { (order_id, api.accept_order(&order_id).await) });
    }

    let mut winners = vec![];
    let mut losers = vec![];
    while let Some(res) = set.join_next().await {
        let (order_id, outcome) = res.expect("Accept task panicked");
        match outcome {
            Ok(order) => winners.push(order),
            Err(OrderFlowError::InsufficientStock { requested, available, .. }) => {
                debug!("🐂️ Order {order_id} lost the race: wanted {requested}, {available} left");
                losers.push(order_id);
            },
            Err(e) => panic!("Unexpected error accepting order {order_id}: {e}"),
        }
    }
    assert_eq!(winners.len(), 1, "exactly one accept should win");
    assert_eq!(losers.len(), 1, "exactly one accept should lose");
    assert_eq!(winners[0].status, OrderStatusType::Accepted);
    assert!(winners[0].receipt_number.is_some());

    let loser = api.fetch_order(&losers[0]).await.unwrap().unwrap();
    assert_eq!(loser.status, OrderStatusType::Pending);
    assert!(loser.receipt_number.is_none());

    let stock = api.product_stock(fx.product_id).await.unwrap().unwrap();
    assert_eq!(stock.quantity, 2);
    assert_eq!(stock.status, ProductStatus::Active);
}

// A burst of single-head orders against a smaller stock. However the scheduler interleaves them,
// successes must number exactly the initial stock, the listing must end depleted and Sold, and the
// rest must fail cleanly.
#[tokio::test(flavor = "multi_thread")]
async fn burst_accepts_drain_stock_exactly() {
    const STOCK: i64 = 8;
    const ORDERS: i64 = 20;

    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    let pool = db.pool().clone();
    let api = Arc::new(OrderFlowApi::new(db, EventProducers::default()));
    let fx = seed_marketplace(&pool, STOCK, Money::from_major(4_000)).await;

    let mut order_ids = vec![];
    for _ in 0..ORDERS {
        order_ids.push(place_pending_order(&api, &fx, 1).await);
    }

    info!("🚀️ Injecting {ORDERS} competing accepts against a stock of {STOCK}");
    let mut set = JoinSet::new();
    for order_id in order_ids {
        let api = Arc::clone(&api);
        set.spawn(async move { api.accept_order(&order_id).await });
    }

    let mut accepted = 0_i64;
    let mut starved = 0_i64;
    while let Some(res) = set.join_next().await {
        match res.expect("Accept task panicked") {
            Ok(_) => accepted += 1,
            Err(OrderFlowError::InsufficientStock { .. }) => starved += 1,
            Err(e) => panic!("Unexpected error during burst accept: {e}"),
        }
    }
    assert_eq!(accepted, STOCK);
    assert_eq!(starved, ORDERS - STOCK);

    let stock = api.product_stock(fx.product_id).await.unwrap().unwrap();
    assert_eq!(stock.quantity, 0);
    assert_eq!(stock.status, ProductStatus::Sold);
    info!("🚀️ Burst accept test complete");
}
