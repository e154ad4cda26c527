use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderId, OrderStatusType, ProductStock, RatingSummary},
};

/// This trait defines the behaviour of backends supporting the Ganado order engine.
///
/// This behaviour includes:
/// * Creating and fetching order records.
/// * Executing the five lifecycle transitions, each inside one atomic unit of work that serializes
///   against concurrent transitions on the same order and the same product stock row.
/// * Rating aggregation after completed transactions.
///
/// Transition methods take the current instant as an argument so the caller owns the clock; backends must
/// never read wall-clock time themselves.
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in `Pending` state. The total price is locked in here as
    /// `quantity * unit_price` and never recomputed.
    async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    /// Returns the order record, or `None` if it does not exist.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError>;

    /// `Pending` → `Accepted`. In one atomic unit of work: stamps `accepted_at`, reserves the ordered
    /// quantity against the product stock (failing with [`OrderFlowError::InsufficientStock`] if the
    /// decrement would go negative), flips the product to `Sold` on depletion, generates the receipt
    /// number if absent, and attaches the receipt snapshot.
    ///
    /// Exactly one of any number of concurrent accept calls succeeds; the rest observe
    /// [`OrderFlowError::InvalidTransition`].
    async fn accept_order(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderFlowError>;

    /// `Pending` → `Rejected`. Stamps `rejected_at` and appends the reason, if any, to the seller notes.
    /// No stock was reserved, so none is touched.
    async fn reject_order(
        &self,
        order_id: &OrderId,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError>;

    /// `Accepted` → `Delivered`. Stamps `delivered_at` and records `actual_pickup_date`.
    async fn mark_delivered(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderFlowError>;

    /// `Delivered` → `Completed`. Stamps `completed_at`. Rating recomputation is **not** part of this
    /// unit of work; callers trigger [`Self::recompute_ratings`] after the completion has committed, and
    /// treat its failure as non-fatal.
    async fn complete_order(&self, order_id: &OrderId, now: DateTime<Utc>) -> Result<Order, OrderFlowError>;

    /// `{Pending|Accepted|Delivered}` → `Cancelled`. Stamps `cancelled_at` and appends the reason, if
    /// any, to the buyer notes. If stock had been reserved (the order was `Accepted` or `Delivered`),
    /// restores it and reverts a depletion-driven `Sold` status back to `Active`. Cancelling from
    /// `Pending` must not touch stock.
    async fn cancel_order(
        &self,
        order_id: &OrderId,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderFlowError>;

    /// Reads the current sellable quantity and availability status for a product.
    async fn fetch_product_stock(&self, product_id: i64) -> Result<Option<ProductStock>, OrderFlowError>;

    /// Recomputes the arithmetic mean of all approved reviews for the product and for the selling ranch,
    /// persists both averages, and returns them.
    async fn recompute_ratings(&self, product_id: i64, ranch_id: i64) -> Result<RatingSummary, OrderFlowError>;

    /// Fetches orders according to criteria specified in the filter, ordered by creation time.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), OrderFlowError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    /// The requested edge is not legal from the order's current state. Recoverable; the caller should
    /// re-read the order and decide again.
    #[error("No '{action}' transition is legal from the {from} state")]
    InvalidTransition { from: OrderStatusType, action: &'static str },
    /// Accepting would have driven the sellable quantity negative. The whole transition was rolled back
    /// and the order is still pending.
    #[error("Product {product_id} has {available} unit(s) left, cannot reserve {requested}")]
    InsufficientStock { product_id: i64, requested: i64, available: i64 },
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    /// Underlying storage failure. The unit of work was rolled back; retryable.
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}
