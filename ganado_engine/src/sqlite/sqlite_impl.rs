//! `SqliteDatabase` is a concrete implementation of a Ganado order engine backend.
//!
//! Every lifecycle transition runs inside a single sqlx transaction with the same discipline:
//! 1. Touch the order row first, so the transaction takes the writer lock up front and concurrent
//!    transitions serialize here (the SQLite rendering of "lock the order row for update").
//! 2. Fetch the order and hand it to the pure planner.
//! 3. Apply the status change with a compare-and-swap on the old status. Zero matched rows means another
//!    transition won the race; the caller observes `InvalidTransition`.
//! 4. Execute the plan's stock intent against the product row.
//! 5. For accepts, assemble and attach the receipt snapshot.
//! 6. Commit. Any error before this point drops the transaction and rolls the whole unit of work back,
//!    so no partial effect is ever observable.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, parties, reviews, stock};
use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderId, ProductStock, RatingSummary},
    receipts,
    traits::{OrderFlowDatabase, OrderFlowError},
    transitions::{self, OrderAction, StockIntent},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::insert_order(order, &mut conn).await?;
        debug!("🗃️ Order {} has been saved in the DB for {} head of product {}", order.id, order.quantity, order.product_id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn accept_order(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderFlowError> {
        self.execute_transition(order_id, OrderAction::Accept, now).await
    }

    async fn reject_order(
        &self,
        order_id: &OrderId,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError> {
        let action = OrderAction::Reject { reason: reason.map(String::from) };
        self.execute_transition(order_id, action, now).await
    }

    async fn mark_delivered(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderFlowError> {
        self.execute_transition(order_id, OrderAction::MarkDelivered, now).await
    }

    async fn complete_order(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderFlowError> {
        self.execute_transition(order_id, OrderAction::Complete, now).await
    }

    async fn cancel_order(
        &self,
        order_id: &OrderId,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError> {
        let action = OrderAction::Cancel { reason: reason.map(String::from) };
        self.execute_transition(order_id, action, now).await
    }

    async fn fetch_product_stock(&self, product_id: i64) -> Result<Option<ProductStock>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let result = stock::fetch_stock(product_id, &mut conn).await?;
        Ok(result)
    }

    async fn recompute_ratings(&self, product_id: i64, ranch_id: i64) -> Result<RatingSummary, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let product_rating = reviews::recompute_product_rating(product_id, &mut tx).await?;
        let ranch_rating = reviews::recompute_ranch_rating(ranch_id, &mut tx).await?;
        tx.commit().await?;
        Ok(RatingSummary { product_id, ranch_id, product_rating, ranch_rating })
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn close(&mut self) -> Result<(), OrderFlowError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The shared transition skeleton. See the module docs for the step-by-step locking discipline.
    async fn execute_transition(
        &self,
        order_id: &OrderId,
        action: OrderAction,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        if !orders::lock_for_update(order_id, &mut tx).await? {
            return Err(OrderFlowError::OrderNotFound(*order_id));
        }
        let order = orders::fetch_order(order_id, &mut tx).await?.ok_or(OrderFlowError::OrderNotFound(*order_id))?;
        let plan = transitions::plan(&order, &action, now)?;
        let updated = orders::apply_transition(&order, &plan, &mut tx).await?.ok_or(
            // The CAS missed: another transition moved the order off its old status under us.
            OrderFlowError::InvalidTransition { from: order.status, action: action.name() },
        )?;
        match plan.stock {
            Some(StockIntent::Reserve(amount)) => {
                stock::reserve(order.product_id, amount, &mut tx).await?;
            },
            Some(StockIntent::Release(amount)) => {
                stock::release(order.product_id, amount, &mut tx).await?;
            },
            None => {},
        }
        let updated = if plan.build_receipt && updated.receipt_number.is_none() {
            let number = receipts::receipt_number(&updated);
            let product = parties::fetch_product(updated.product_id, &mut tx).await?;
            let buyer = parties::fetch_profile(updated.buyer_profile_id, &mut tx).await?;
            let seller = parties::fetch_profile(updated.seller_profile_id, &mut tx).await?;
            let ranch = parties::fetch_ranch(updated.ranch_id, &mut tx).await?;
            let snapshot = receipts::build_receipt(
                &updated,
                product.as_ref(),
                buyer.as_ref(),
                seller.as_ref(),
                ranch.as_ref(),
                number.clone(),
                plan.now,
            );
            orders::attach_receipt(&updated.id, &number, &snapshot, &mut tx).await?
        } else {
            updated
        };
        tx.commit().await?;
        debug!("🗃️ Order {} is now {} ({})", updated.id, updated.status, action.name());
        Ok(updated)
    }
}
