//! Product stock coordination.
//!
//! All quantity mutations for a product go through the two conditional updates in this module, inside the
//! caller's transaction. The `quantity >= $1` guard on [`reserve`] is what makes overselling impossible:
//! two accepts racing for the last units serialize on the writer lock, and the loser's update matches zero
//! rows. Quantity can never go negative.
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::ProductStock, traits::OrderFlowError};

/// Subtracts `amount` from the product's sellable quantity. Depleting the stock flips the status to
/// `Sold`, unless the listing was paused or expired by the seller in the meantime.
///
/// Fails with [`OrderFlowError::InsufficientStock`] if the product has fewer than `amount` units left.
pub async fn reserve(product_id: i64, amount: i64, conn: &mut SqliteConnection) -> Result<ProductStock, OrderFlowError> {
    let updated: Option<ProductStock> = sqlx::query_as(
        r#"
        UPDATE products
        SET quantity = quantity - $1,
            status = CASE WHEN quantity - $1 <= 0 AND status = 'Active' THEN 'Sold' ELSE status END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2 AND quantity >= $1
        RETURNING id, quantity, status
        "#,
    )
    .bind(amount)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match updated {
        Some(stock) => {
            debug!("🐂️ Reserved {amount} unit(s) of product {product_id}. {} left ({})", stock.quantity, stock.status);
            Ok(stock)
        },
        None => match fetch_stock(product_id, conn).await? {
            Some(stock) => Err(OrderFlowError::InsufficientStock {
                product_id,
                requested: amount,
                available: stock.quantity,
            }),
            None => Err(OrderFlowError::ProductNotFound(product_id)),
        },
    }
}

/// Adds `amount` back to the product's sellable quantity. A `Sold` status is reverted to `Active`, since
/// `Sold` is only ever set by depletion; `Paused` and `Expired` reflect a seller decision and stand.
pub async fn release(product_id: i64, amount: i64, conn: &mut SqliteConnection) -> Result<ProductStock, OrderFlowError> {
    let updated: Option<ProductStock> = sqlx::query_as(
        r#"
        UPDATE products
        SET quantity = quantity + $1,
            status = CASE WHEN status = 'Sold' THEN 'Active' ELSE status END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $2
        RETURNING id, quantity, status
        "#,
    )
    .bind(amount)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;
    let stock = updated.ok_or(OrderFlowError::ProductNotFound(product_id))?;
    debug!("🐂️ Released {amount} unit(s) of product {product_id}. {} available ({})", stock.quantity, stock.status);
    Ok(stock)
}

pub async fn fetch_stock(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<ProductStock>, sqlx::Error> {
    let stock = sqlx::query_as("SELECT id, quantity, status FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(stock)
}
