use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use ganado_common::{Money, DEFAULT_CURRENCY_CODE};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

use crate::receipts::ReceiptSnapshot;

//--------------------------------------        OrderId        -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub i64);

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for OrderId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse::<i64>().map(Self)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:08}", self.0)
    }
}

impl OrderId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been placed by the buyer and awaits a seller decision.
    Pending,
    /// The seller has accepted the order. Stock is reserved and the receipt snapshot is frozen.
    Accepted,
    /// The seller declined the order. Terminal.
    Rejected,
    /// The animals have been handed over or shipped.
    Delivered,
    /// The transaction concluded successfully. Terminal.
    Completed,
    /// The order was called off by either party. Terminal.
    Cancelled,
}

impl OrderStatusType {
    /// Terminal states are final resting states. No transition is legal from them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Rejected | OrderStatusType::Completed | OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Accepted => write!(f, "Accepted"),
            OrderStatusType::Rejected => write!(f, "Rejected"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Accepted" => Ok(Self::Accepted),
            "Rejected" => Ok(Self::Rejected),
            "Delivered" => Ok(Self::Delivered),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    DeliveryMethod     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum DeliveryMethod {
    BuyerTransport,
    SellerTransport,
    ExternalDelivery,
    PlatformDelivery,
}

impl DeliveryMethod {
    /// The human-readable rendering used on receipts.
    pub fn description(&self) -> &'static str {
        match self {
            DeliveryMethod::BuyerTransport => "Buyer collects with own transport",
            DeliveryMethod::SellerTransport => "Seller delivers with own transport",
            DeliveryMethod::ExternalDelivery => "Third-party livestock carrier",
            DeliveryMethod::PlatformDelivery => "Platform-arranged delivery",
        }
    }
}

impl Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryMethod::BuyerTransport => write!(f, "BuyerTransport"),
            DeliveryMethod::SellerTransport => write!(f, "SellerTransport"),
            DeliveryMethod::ExternalDelivery => write!(f, "ExternalDelivery"),
            DeliveryMethod::PlatformDelivery => write!(f, "PlatformDelivery"),
        }
    }
}

impl FromStr for DeliveryMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BuyerTransport" => Ok(Self::BuyerTransport),
            "SellerTransport" => Ok(Self::SellerTransport),
            "ExternalDelivery" => Ok(Self::ExternalDelivery),
            "PlatformDelivery" => Ok(Self::PlatformDelivery),
            s => Err(ConversionError(format!("Invalid delivery method: {s}"))),
        }
    }
}

//--------------------------------------    PickupLocation     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PickupLocation {
    Ranch,
    Other,
}

impl Display for PickupLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PickupLocation::Ranch => write!(f, "Ranch"),
            PickupLocation::Other => write!(f, "Other"),
        }
    }
}

impl FromStr for PickupLocation {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ranch" => Ok(Self::Ranch),
            "Other" => Ok(Self::Other),
            s => Err(ConversionError(format!("Invalid pickup location: {s}"))),
        }
    }
}

//--------------------------------------    ProductStatus      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ProductStatus {
    /// The listing is live and the product can be ordered.
    Active,
    /// Stock reached zero as a direct result of an order transition.
    Sold,
    /// The seller paused the listing.
    Paused,
    /// The listing expired.
    Expired,
}

impl Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "Active"),
            ProductStatus::Sold => write!(f, "Sold"),
            ProductStatus::Paused => write!(f, "Paused"),
            ProductStatus::Expired => write!(f, "Expired"),
        }
    }
}

impl FromStr for ProductStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Sold" => Ok(Self::Sold),
            "Paused" => Ok(Self::Paused),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid product status: {s}"))),
        }
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub product_id: i64,
    pub buyer_profile_id: i64,
    pub seller_profile_id: i64,
    pub ranch_id: i64,
    pub conversation_id: Option<i64>,
    pub quantity: i64,
    pub unit_price: Money,
    /// Locked at creation time as `quantity * unit_price`. Never recomputed, even if the product's price
    /// later changes.
    pub total_price: Money,
    pub currency: String,
    pub status: OrderStatusType,
    pub delivery_method: DeliveryMethod,
    pub pickup_location: PickupLocation,
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_cost: Option<Money>,
    pub delivery_cost_currency: Option<String>,
    pub delivery_provider: Option<String>,
    pub delivery_tracking_number: Option<String>,
    pub expected_pickup_date: Option<DateTime<Utc>>,
    pub actual_pickup_date: Option<DateTime<Utc>>,
    pub buyer_notes: Option<String>,
    pub seller_notes: Option<String>,
    pub receipt_number: Option<String>,
    /// JSON rendering of the [`ReceiptSnapshot`], populated exactly once at acceptance.
    pub receipt_data: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Parses the stored receipt snapshot, if one has been issued.
    pub fn receipt(&self) -> Option<ReceiptSnapshot> {
        self.receipt_data.as_deref().and_then(|data| serde_json::from_str(data).ok())
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub product_id: i64,
    pub buyer_profile_id: i64,
    pub seller_profile_id: i64,
    pub ranch_id: i64,
    /// The conversation the order originated from, if it was negotiated in chat.
    pub conversation_id: Option<i64>,
    /// Number of head ordered. Must be positive.
    pub quantity: i64,
    /// The per-unit price at the time the order is placed. The total is locked in from this value.
    pub unit_price: Money,
    pub currency: String,
    pub delivery_method: DeliveryMethod,
    pub pickup_location: PickupLocation,
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    pub delivery_cost: Option<Money>,
    pub delivery_cost_currency: Option<String>,
    pub delivery_provider: Option<String>,
    pub expected_pickup_date: Option<DateTime<Utc>>,
    pub buyer_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(product_id: i64, buyer_profile_id: i64, seller_profile_id: i64, ranch_id: i64, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id,
            buyer_profile_id,
            seller_profile_id,
            ranch_id,
            conversation_id: None,
            quantity,
            unit_price,
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            delivery_method: DeliveryMethod::BuyerTransport,
            pickup_location: PickupLocation::Ranch,
            pickup_address: None,
            delivery_address: None,
            delivery_cost: None,
            delivery_cost_currency: None,
            delivery_provider: None,
            expected_pickup_date: None,
            buyer_notes: None,
            created_at: Utc::now(),
        }
    }

    /// The price-locked contract total.
    pub fn total_price(&self) -> Money {
        self.unit_price * self.quantity
    }

    pub fn with_delivery(mut self, method: DeliveryMethod, cost: Money, currency: &str) -> Self {
        self.delivery_method = method;
        self.delivery_cost = Some(cost);
        self.delivery_cost_currency = Some(currency.to_string());
        self
    }

    pub fn with_pickup_address(mut self, location: PickupLocation, address: &str) -> Self {
        self.pickup_location = location;
        self.pickup_address = Some(address.to_string());
        self
    }

    pub fn with_delivery_address(mut self, address: &str) -> Self {
        self.delivery_address = Some(address.to_string());
        self
    }

    pub fn with_buyer_notes(mut self, notes: &str) -> Self {
        self.buyer_notes = Some(notes.to_string());
        self
    }

    pub fn with_conversation(mut self, conversation_id: i64) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn with_expected_pickup_date(mut self, date: DateTime<Utc>) -> Self {
        self.expected_pickup_date = Some(date);
        self
    }
}

//--------------------------------------     ProductStock      -------------------------------------------------------
/// The sellable-quantity counter and availability status of a product. This is the one resource that
/// concurrent order transitions contend over.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct ProductStock {
    pub id: i64,
    pub quantity: i64,
    pub status: ProductStatus,
}

//--------------------------------------       Product         -------------------------------------------------------
/// Read model of a product listing, used for receipt assembly.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: i64,
    pub ranch_id: i64,
    pub title: String,
    pub animal_type: Option<String>,
    pub breed: Option<String>,
    pub quantity: i64,
    pub status: ProductStatus,
    pub unit_price: Money,
    pub currency: String,
    pub average_rating: Option<f64>,
}

//--------------------------------------       Profile         -------------------------------------------------------
/// Read model of a marketplace profile, used for receipt assembly.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: i64,
    pub display_name: String,
    pub business_name: Option<String>,
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    pub identity_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

//--------------------------------------        Ranch          -------------------------------------------------------
/// Read model of the selling ranch, used for receipt assembly and rating aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct Ranch {
    pub id: i64,
    pub owner_profile_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub average_rating: Option<f64>,
}

//--------------------------------------    RatingSummary      -------------------------------------------------------
/// Result of a rating recompute after an order completes. `None` means no approved reviews exist yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub product_id: i64,
    pub ranch_id: i64,
    pub product_rating: Option<f64>,
    pub ranch_rating: Option<f64>,
}
