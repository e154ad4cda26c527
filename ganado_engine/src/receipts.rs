//! Receipt assembly.
//!
//! A receipt is an immutable, deterministic snapshot of the transaction captured at acceptance time. It is
//! denormalized on purpose: profiles, products and ranches keep changing after the sale, but the receipt
//! must keep reading the way it did the day the seller accepted.
//!
//! Assembly is a pure function and is null-safe throughout. A missing collaborator record yields a receipt
//! with empty blocks; it never fails the accept transition.
use chrono::{DateTime, Utc};
use ganado_common::Money;
use serde::{Deserialize, Serialize};

use crate::db_types::{DeliveryMethod, Order, PickupLocation, Product, Profile, Ranch};

/// Bumped when the snapshot shape changes, so old receipts stay parseable.
pub const RECEIPT_VERSION: u32 = 1;
pub const RECEIPT_PREFIX: &str = "REC";

/// The receipt number is a pure function of the order id and its creation date, so regenerating it for the
/// same order always yields the same value: `REC-{zero-padded id}-{YYYYMMDD}`.
pub fn receipt_number(order: &Order) -> String {
    format!("{RECEIPT_PREFIX}-{:08}-{}", order.id.value(), order.created_at.format("%Y%m%d"))
}

//--------------------------------------    ReceiptSnapshot    -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptSnapshot {
    pub version: u32,
    pub receipt_number: String,
    pub issued_at: DateTime<Utc>,
    pub seller: SellerBlock,
    pub buyer: BuyerBlock,
    pub product: ProductBlock,
    pub delivery: DeliveryBlock,
    pub notes: NotesBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SellerBlock {
    pub name: Option<String>,
    pub business_name: Option<String>,
    pub legal_name: Option<String>,
    pub tax_id: Option<String>,
    pub ranch_name: Option<String>,
    pub pickup_address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuyerBlock {
    pub name: Option<String>,
    pub identity_number: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductBlock {
    pub title: Option<String>,
    pub animal_type: Option<String>,
    pub breed: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub currency: String,
    /// Human-readable total (`$60,000.00 MXN`), printed on the receipt as-is.
    pub total_display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryBlock {
    pub method: DeliveryMethod,
    pub method_description: String,
    pub pickup_location: PickupLocation,
    pub pickup_address: Option<String>,
    pub delivery_address: Option<String>,
    pub cost: Option<Money>,
    pub cost_currency: Option<String>,
    pub provider: Option<String>,
    pub tracking_number: Option<String>,
    pub expected_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotesBlock {
    pub buyer_notes: Option<String>,
    pub seller_notes: Option<String>,
}

/// Assembles the snapshot from the order and whichever collaborator records could be fetched.
pub fn build_receipt(
    order: &Order,
    product: Option<&Product>,
    buyer: Option<&Profile>,
    seller: Option<&Profile>,
    ranch: Option<&Ranch>,
    receipt_number: String,
    issued_at: DateTime<Utc>,
) -> ReceiptSnapshot {
    let ranch_address = ranch.and_then(|r| {
        let parts: Vec<&str> = [r.address.as_deref(), r.city.as_deref(), r.state.as_deref()]
            .into_iter()
            .flatten()
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    });
    let seller_block = SellerBlock {
        name: seller.map(|s| s.display_name.clone()),
        business_name: seller.and_then(|s| s.business_name.clone()),
        legal_name: seller.and_then(|s| s.legal_name.clone()),
        tax_id: seller.and_then(|s| s.tax_id.clone()),
        ranch_name: ranch.map(|r| r.name.clone()),
        pickup_address: order.pickup_address.clone().or(ranch_address),
        phone: seller.and_then(|s| s.phone.clone()),
        email: seller.and_then(|s| s.email.clone()),
    };
    let buyer_block = BuyerBlock {
        name: buyer.map(|b| b.display_name.clone()),
        identity_number: buyer.and_then(|b| b.identity_number.clone()),
        delivery_address: order.delivery_address.clone(),
    };
    let product_block = ProductBlock {
        title: product.map(|p| p.title.clone()),
        animal_type: product.and_then(|p| p.animal_type.clone()),
        breed: product.and_then(|p| p.breed.clone()),
        quantity: order.quantity,
        unit_price: order.unit_price,
        total_price: order.total_price,
        currency: order.currency.clone(),
        total_display: order.total_price.format_with(&order.currency),
    };
    let delivery_block = DeliveryBlock {
        method: order.delivery_method,
        method_description: order.delivery_method.description().to_string(),
        pickup_location: order.pickup_location,
        pickup_address: order.pickup_address.clone(),
        delivery_address: order.delivery_address.clone(),
        cost: order.delivery_cost,
        cost_currency: order.delivery_cost_currency.clone(),
        provider: order.delivery_provider.clone(),
        tracking_number: order.delivery_tracking_number.clone(),
        expected_date: order.expected_pickup_date,
    };
    let notes_block = NotesBlock { buyer_notes: order.buyer_notes.clone(), seller_notes: order.seller_notes.clone() };
    ReceiptSnapshot {
        version: RECEIPT_VERSION,
        receipt_number,
        issued_at,
        seller: seller_block,
        buyer: buyer_block,
        product: product_block,
        delivery: delivery_block,
        notes: notes_block,
    }
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;

    use super::*;
    use crate::db_types::{OrderId, OrderStatusType, ProductStatus};

    fn test_order() -> Order {
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
            status: OrderStatusType::Pending,
            delivery_method: DeliveryMethod::SellerTransport,
            pickup_location: PickupLocation::Ranch,
            pickup_address: None,
            delivery_address: Some("Km 4 Carretera Norte".to_string()),
            delivery_cost: Some(Money::from_major(1_500)),
            delivery_cost_currency: Some("MXN".to_string()),
            delivery_provider: None,
            delivery_tracking_number: None,
            expected_pickup_date: None,
            actual_pickup_date: None,
            buyer_notes: Some("Please call ahead".to_string()),
            seller_notes: None,
            receipt_number: None,
            receipt_data: None,
            accepted_at: None,
            rejected_at: None,
            delivered_at: None,
            completed_at: None,
            cancelled_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn receipt_number_is_deterministic() {
        let order = test_order();
        assert_eq!(receipt_number(&order), "REC-00000042-20240801");
        assert_eq!(receipt_number(&order), receipt_number(&order));
    }

    #[test]
    fn missing_collaborators_produce_a_partial_receipt() {
        let order = test_order();
        let number = receipt_number(&order);
        let issued_at = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        let receipt = build_receipt(&order, None, None, None, None, number.clone(), issued_at);
        assert_eq!(receipt.version, RECEIPT_VERSION);
        assert_eq!(receipt.receipt_number, number);
        assert!(receipt.seller.name.is_none());
        assert!(receipt.buyer.name.is_none());
        assert!(receipt.product.title.is_none());
        // The order's own fields still make it into the snapshot.
        assert_eq!(receipt.product.quantity, 5);
        assert_eq!(receipt.product.total_price, Money::from_major(60_000));
        assert_eq!(receipt.product.total_display, "$60,000.00 MXN");
        assert_eq!(receipt.delivery.method_description, "Seller delivers with own transport");
        assert_eq!(receipt.notes.buyer_notes.as_deref(), Some("Please call ahead"));
    }

    #[test]
    fn full_receipt_reads_from_all_collaborators() {
        let order = test_order();
        let product = Product {
            id: 7,
            ranch_id: 3,
            title: "Charolais heifers".to_string(),
            animal_type: Some("Bovine".to_string()),
            breed: Some("Charolais".to_string()),
            quantity: 10,
            status: ProductStatus::Active,
            unit_price: Money::from_major(12_000),
            currency: "MXN".to_string(),
            average_rating: None,
        };
        let buyer = Profile {
            id: 1,
            display_name: "Carlos M.".to_string(),
            business_name: None,
            legal_name: None,
            tax_id: None,
            identity_number: Some("CURP123".to_string()),
            phone: None,
            email: None,
        };
        let seller = Profile {
            id: 2,
            display_name: "Rancho El Paso".to_string(),
            business_name: Some("El Paso SA de CV".to_string()),
            legal_name: Some("Ganadería El Paso".to_string()),
            tax_id: Some("RFC456".to_string()),
            identity_number: None,
            phone: Some("+52 555 000 1111".to_string()),
            email: None,
        };
        let ranch = Ranch {
            id: 3,
            owner_profile_id: 2,
            name: "El Paso".to_string(),
            address: Some("Rancho El Paso s/n".to_string()),
            city: Some("Durango".to_string()),
            state: Some("Durango".to_string()),
            average_rating: Some(4.5),
        };
        let issued_at = Utc.with_ymd_and_hms(2024, 8, 2, 9, 0, 0).unwrap();
        let receipt = build_receipt(
            &order,
            Some(&product),
            Some(&buyer),
            Some(&seller),
            Some(&ranch),
            receipt_number(&order),
            issued_at,
        );
        assert_eq!(receipt.seller.name.as_deref(), Some("Rancho El Paso"));
        assert_eq!(receipt.seller.tax_id.as_deref(), Some("RFC456"));
        assert_eq!(receipt.seller.pickup_address.as_deref(), Some("Rancho El Paso s/n, Durango, Durango"));
        assert_eq!(receipt.buyer.identity_number.as_deref(), Some("CURP123"));
        assert_eq!(receipt.product.breed.as_deref(), Some("Charolais"));
        // Round-trips through JSON unchanged.
        let json = serde_json::to_string(&receipt).unwrap();
        let back: ReceiptSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, receipt);
    }
}
