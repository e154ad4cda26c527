use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderId},
    receipts::ReceiptSnapshot,
    traits::OrderFlowError,
    transitions::{timestamp_column, TransitionPlan},
};

/// Inserts a new order in `Pending` state using the given connection. This is not atomic by itself. You
/// can embed this call inside a transaction if you need atomicity, and pass `&mut *tx` as the connection
/// argument.
///
/// The total price is computed here, once, from the quantity and unit price.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderFlowError> {
    let total_price = order.total_price();
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                product_id,
                buyer_profile_id,
                seller_profile_id,
                ranch_id,
                conversation_id,
                quantity,
                unit_price,
                total_price,
                currency,
                delivery_method,
                pickup_location,
                pickup_address,
                delivery_address,
                delivery_cost,
                delivery_cost_currency,
                delivery_provider,
                expected_pickup_date,
                buyer_notes,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *;
        "#,
    )
    .bind(order.product_id)
    .bind(order.buyer_profile_id)
    .bind(order.seller_profile_id)
    .bind(order.ranch_id)
    .bind(order.conversation_id)
    .bind(order.quantity)
    .bind(order.unit_price)
    .bind(total_price)
    .bind(order.currency)
    .bind(order.delivery_method.to_string())
    .bind(order.pickup_location.to_string())
    .bind(order.pickup_address)
    .bind(order.delivery_address)
    .bind(order.delivery_cost)
    .bind(order.delivery_cost_currency)
    .bind(order.delivery_provider)
    .bind(order.expected_pickup_date)
    .bind(order.buyer_notes)
    .bind(order.created_at)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order {} inserted for product {}", order.id, order.product_id);
    Ok(order)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Touches the order row as the first statement of a transition transaction. SQLite has no row-level
/// `FOR UPDATE`; writing the row up front makes this transaction a writer immediately, so concurrent
/// transitions on any order serialize here instead of failing later on a read-to-write upgrade.
///
/// Returns `false` if the order does not exist.
pub async fn lock_for_update(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE orders SET updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Applies a validated transition plan to the order row. The `status` guard in the WHERE clause is the
/// compare-and-swap that guarantees a transition executes at most once: a concurrent caller that already
/// moved the order off its old status makes this update match zero rows, and `None` is returned.
///
/// Transition timestamps are written exactly once; notes are appended, never overwritten.
pub async fn apply_transition(
    order: &Order,
    plan: &TransitionPlan,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderFlowError> {
    let mut builder = QueryBuilder::new("UPDATE orders SET updated_at = ");
    builder.push_bind(plan.now);
    builder.push(", status = ");
    builder.push_bind(plan.new_status.to_string());
    if let Some(column) = timestamp_column(plan.new_status) {
        builder.push(format!(", {column} = COALESCE({column}, "));
        builder.push_bind(plan.now);
        builder.push(")");
    }
    if plan.new_status == crate::db_types::OrderStatusType::Delivered {
        builder.push(", actual_pickup_date = ");
        builder.push_bind(plan.now);
    }
    if let Some(note) = &plan.seller_note {
        builder.push(", seller_notes = CASE WHEN seller_notes IS NULL OR seller_notes = '' THEN ");
        builder.push_bind(note.clone());
        builder.push(" ELSE seller_notes || char(10) || ");
        builder.push_bind(note.clone());
        builder.push(" END");
    }
    if let Some(note) = &plan.buyer_note {
        builder.push(", buyer_notes = CASE WHEN buyer_notes IS NULL OR buyer_notes = '' THEN ");
        builder.push_bind(note.clone());
        builder.push(" ELSE buyer_notes || char(10) || ");
        builder.push_bind(note.clone());
        builder.push(" END");
    }
    builder.push(" WHERE id = ");
    builder.push_bind(order.id);
    builder.push(" AND status = ");
    builder.push_bind(order.status.to_string());
    builder.push(" RETURNING *");
    trace!("📝️ Executing query: {}", builder.sql());
    let updated = builder.build_query_as::<Order>().fetch_optional(conn).await?;
    Ok(updated)
}

/// Attaches the receipt number and snapshot to the order. `COALESCE` keeps an already-issued receipt
/// untouched, so a retried accept cannot overwrite the original snapshot.
pub async fn attach_receipt(
    order_id: &OrderId,
    receipt_number: &str,
    receipt: &ReceiptSnapshot,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderFlowError> {
    let data = serde_json::to_string(receipt).map_err(|e| OrderFlowError::DatabaseError(e.to_string()))?;
    let order: Option<Order> = sqlx::query_as(
        "UPDATE orders SET receipt_number = COALESCE(receipt_number, $1), receipt_data = COALESCE(receipt_data, $2) \
         WHERE id = $3 RETURNING *",
    )
    .bind(receipt_number)
    .bind(data)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    order.ok_or(OrderFlowError::OrderNotFound(*order_id))
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("product_id = ");
        where_clause.push_bind_unseparated(product_id);
    }
    if let Some(buyer) = query.buyer_profile_id {
        where_clause.push("buyer_profile_id = ");
        where_clause.push_bind_unseparated(buyer);
    }
    if let Some(seller) = query.seller_profile_id {
        where_clause.push("seller_profile_id = ");
        where_clause.push_bind_unseparated(seller);
    }
    if let Some(ranch_id) = query.ranch_id {
        where_clause.push("ranch_id = ");
        where_clause.push_bind_unseparated(ranch_id);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let statuses =
            query.status.iter().flatten().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("status IN ({statuses})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
