use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType, RatingSummary};

/// Emitted after an accept transition has committed. The order carries the freshly issued receipt.
#[derive(Debug, Clone)]
pub struct OrderAcceptedEvent {
    pub order: Order,
}

impl OrderAcceptedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted after a complete transition has committed. `ratings` is the result of the best-effort
/// recompute, or `None` if the recompute failed (the completion stands regardless).
#[derive(Debug, Clone)]
pub struct OrderCompletedEvent {
    pub order: Order,
    pub ratings: Option<RatingSummary>,
}

impl OrderCompletedEvent {
    pub fn new(order: Order, ratings: Option<RatingSummary>) -> Self {
        Self { order, ratings }
    }
}

/// Emitted after an order reaches a terminal state without completing (rejected or cancelled).
#[derive(Debug, Clone)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    OrderAccepted,
    OrderCompleted,
    OrderAnnulled,
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use ganado_common::Money;

    use super::*;
    use crate::db_types::{DeliveryMethod, OrderId, PickupLocation};

    fn cancelled_order() -> Order {
        let created_at = Utc.with_ymd_and_hms(2024, 8, 1, 10, 0, 0).unwrap();
        Order {
            id: OrderId(42),
            product_id: 7,
            buyer_profile_id: 1,
            seller_profile_id: 2,
            ranch_id: 3,
            conversation_id: None,
            quantity: 5,
            unit_price: Money::from_major(12_000),
            total_price: Money::from_major(60_000),
            currency: "MXN".to_string(),
            status: OrderStatusType::Cancelled,
            delivery_method: DeliveryMethod::BuyerTransport,
            pickup_location: PickupLocation::Ranch,
            pickup_address: None,
            delivery_address: None,
            delivery_cost: None,
            delivery_cost_currency: None,
            delivery_provider: None,
            delivery_tracking_number: None,
            expected_pickup_date: None,
            actual_pickup_date: None,
            buyer_notes: None,
            seller_notes: None,
            receipt_number: None,
            receipt_data: None,
            accepted_at: None,
            rejected_at: None,
            delivered_at: None,
            completed_at: None,
            cancelled_at: Some(created_at),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn annulled_event_captures_the_terminal_status() {
        let event = OrderAnnulledEvent::new(cancelled_order());
        assert_eq!(event.status, OrderStatusType::Cancelled);
        // Events are cloned once per subscriber; the payload must survive that.
        let copy = event.clone();
        assert_eq!(copy.order.id, event.order.id);
        assert_eq!(copy.status, event.status);
    }

    #[test]
    fn completed_event_carries_the_rating_outcome() {
        let mut order = cancelled_order();
        order.status = OrderStatusType::Completed;
        let summary =
            RatingSummary { product_id: 7, ranch_id: 3, product_rating: Some(4.5), ranch_rating: Some(4.0) };
        let event = OrderCompletedEvent::new(order, Some(summary.clone()));
        assert_eq!(event.ratings, Some(summary));
        let without_ratings = OrderCompletedEvent::new(event.order.clone(), None);
        assert!(without_ratings.ratings.is_none());
    }
}
