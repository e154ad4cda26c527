use std::{fmt::Debug, sync::Arc};

use log::*;

use crate::{
    api::order_objects::OrderQueryFilter,
    clock::{Clock, SystemClock},
    db_types::{NewOrder, Order, OrderId, ProductStock, RatingSummary},
    events::{EventProducers, OrderAcceptedEvent, OrderAnnulledEvent, OrderCompletedEvent},
    traits::{OrderFlowDatabase, OrderFlowError},
};

/// `OrderFlowApi` is the primary API for driving the order lifecycle in response to buyer and seller
/// actions.
///
/// It owns the clock (so transition timestamps are deterministic in tests), delegates each of the five
/// operations to the backend, and fires the corresponding event hooks after a transition has committed.
/// Hook delivery and rating recomputation are best-effort: neither can fail a transition that has already
/// been durably committed.
pub struct OrderFlowApi<B> {
    db: B,
    clock: Arc<dyn Clock>,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, clock: Arc::new(SystemClock), producers }
    }

    /// Replaces the system clock, typically with a fixed one in tests.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<B> OrderFlowApi<B>
where B: OrderFlowDatabase
{
    /// Places a brand-new order in `Pending` state. The total price is locked in at this moment.
    pub async fn create_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let order = self.db.create_order(order).await?;
        debug!("🔄️📦️ Order {} created. {} head at {} each", order.id, order.quantity, order.unit_price);
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, OrderFlowError> {
        self.db.fetch_order(order_id).await
    }

    /// The seller accepts a pending order. On success the stock has been reserved, the receipt issued,
    /// and the accepted-order hook notified.
    pub async fn accept_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.accept_order(order_id, self.clock.now()).await?;
        debug!("🔄️📦️ Order {} accepted. Receipt {} issued", order.id, order.receipt_number.as_deref().unwrap_or("<none>"));
        for emitter in &self.producers.order_accepted_producer {
            trace!("🔄️📦️ Notifying order accepted hook subscribers");
            emitter.publish_event(OrderAcceptedEvent::new(order.clone())).await;
        }
        Ok(order)
    }

    /// The seller declines a pending order. The reason, if given, is appended to the seller notes.
    pub async fn reject_order(&self, order_id: &OrderId, reason: Option<&str>) -> Result<Order, OrderFlowError> {
        let order = self.db.reject_order(order_id, reason, self.clock.now()).await?;
        debug!("🔄️📦️ Order {} rejected", order.id);
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    /// Records the physical handover of an accepted order.
    pub async fn mark_delivered(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.mark_delivered(order_id, self.clock.now()).await?;
        debug!("🔄️📦️ Order {} marked as delivered", order.id);
        Ok(order)
    }

    /// Concludes a delivered order. After the completion has committed, the product and ranch ratings
    /// are recomputed best-effort: a rating failure is logged and swallowed, never surfaced as a
    /// transition failure.
    pub async fn complete_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        let order = self.db.complete_order(order_id, self.clock.now()).await?;
        debug!("🔄️📦️ Order {} completed", order.id);
        let ratings = match self.db.recompute_ratings(order.product_id, order.ranch_id).await {
            Ok(summary) => {
                trace!(
                    "⭐️ Ratings recomputed for product {} ({:?}) and ranch {} ({:?})",
                    summary.product_id,
                    summary.product_rating,
                    summary.ranch_id,
                    summary.ranch_rating
                );
                Some(summary)
            },
            Err(e) => {
                warn!("⭐️ Rating recompute after completion of order {} failed: {e}. The completion stands.", order.id);
                None
            },
        };
        for emitter in &self.producers.order_completed_producer {
            trace!("🔄️📦️ Notifying order completed hook subscribers");
            emitter.publish_event(OrderCompletedEvent::new(order.clone(), ratings.clone())).await;
        }
        Ok(order)
    }

    /// Calls off an order that has not completed yet. Reserved stock, if any, is restored. The reason,
    /// if given, is appended to the buyer notes.
    pub async fn cancel_order(&self, order_id: &OrderId, reason: Option<&str>) -> Result<Order, OrderFlowError> {
        let order = self.db.cancel_order(order_id, reason, self.clock.now()).await?;
        debug!("🔄️📦️ Order {} cancelled", order.id);
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    pub async fn product_stock(&self, product_id: i64) -> Result<Option<ProductStock>, OrderFlowError> {
        self.db.fetch_product_stock(product_id).await
    }

    /// Forces a rating recompute outside the completion flow, e.g. after a review moderation decision.
    pub async fn recompute_ratings(&self, product_id: i64, ranch_id: i64) -> Result<RatingSummary, OrderFlowError> {
        self.db.recompute_ratings(product_id, ranch_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderFlowError> {
        self.db.search_orders(query).await
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            trace!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }
}
