//! Rating aggregation. Only approved reviews count towards an average.
use log::debug;
use sqlx::SqliteConnection;

pub async fn recompute_product_rating(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<f64>, sqlx::Error> {
    let rating: Option<Option<f64>> = sqlx::query_scalar(
        r#"
        UPDATE products
        SET average_rating = (SELECT AVG(rating) FROM reviews WHERE product_id = $1 AND status = 'Approved'),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING average_rating
        "#,
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    let rating = rating.flatten();
    debug!("⭐️ Product {product_id} average rating recomputed: {rating:?}");
    Ok(rating)
}

pub async fn recompute_ranch_rating(ranch_id: i64, conn: &mut SqliteConnection) -> Result<Option<f64>, sqlx::Error> {
    let rating: Option<Option<f64>> = sqlx::query_scalar(
        r#"
        UPDATE ranches
        SET average_rating = (SELECT AVG(rating) FROM reviews WHERE ranch_id = $1 AND status = 'Approved'),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $1
        RETURNING average_rating
        "#,
    )
    .bind(ranch_id)
    .fetch_optional(conn)
    .await?;
    let rating = rating.flatten();
    debug!("⭐️ Ranch {ranch_id} average rating recomputed: {rating:?}");
    Ok(rating)
}
