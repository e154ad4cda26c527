use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{OrderId, OrderStatusType};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub order_id: Option<OrderId>,
    pub product_id: Option<i64>,
    pub buyer_profile_id: Option<i64>,
    pub seller_profile_id: Option<i64>,
    pub ranch_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<Vec<OrderStatusType>>,
}

impl OrderQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_product_id(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_buyer_profile_id(mut self, profile_id: i64) -> Self {
        self.buyer_profile_id = Some(profile_id);
        self
    }

    pub fn with_seller_profile_id(mut self, profile_id: i64) -> Self {
        self.seller_profile_id = Some(profile_id);
        self
    }

    pub fn with_ranch_id(mut self, ranch_id: i64) -> Self {
        self.ranch_id = Some(ranch_id);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.product_id.is_none() &&
            self.buyer_profile_id.is_none() &&
            self.seller_profile_id.is_none() &&
            self.ranch_id.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}
