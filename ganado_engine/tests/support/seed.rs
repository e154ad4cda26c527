//! Fixture data for lifecycle tests: one buyer, one seller with a ranch, and one product listing.
use ganado_common::Money;
use sqlx::SqlitePool;

pub struct Fixture {
    pub buyer_profile_id: i64,
    pub seller_profile_id: i64,
    pub ranch_id: i64,
    pub product_id: i64,
}

pub async fn seed_marketplace(pool: &SqlitePool, stock: i64, unit_price: Money) -> Fixture {
    let buyer_profile_id: i64 = sqlx::query_scalar(
        "INSERT INTO profiles (display_name, identity_number) VALUES ('Carlos M.', 'CURP-123') RETURNING id",
    )
    .fetch_one(pool)
    .await
    .expect("Error seeding buyer profile");
    let seller_profile_id: i64 = sqlx::query_scalar(
        "INSERT INTO profiles (display_name, business_name, legal_name, tax_id, phone) \
         VALUES ('Rancho El Paso', 'El Paso SA de CV', 'Ganadería El Paso', 'RFC-456', '+52 555 000 1111') \
         RETURNING id",
    )
    .fetch_one(pool)
    .await
    .expect("Error seeding seller profile");
    let ranch_id: i64 = sqlx::query_scalar(
        "INSERT INTO ranches (owner_profile_id, name, address, city, state) \
         VALUES ($1, 'El Paso', 'Rancho El Paso s/n', 'Durango', 'Durango') RETURNING id",
    )
    .bind(seller_profile_id)
    .fetch_one(pool)
    .await
    .expect("Error seeding ranch");
    let product_id: i64 = sqlx::query_scalar(
        "INSERT INTO products (ranch_id, title, animal_type, breed, quantity, unit_price) \
         VALUES ($1, 'Charolais heifers', 'Bovine', 'Charolais', $2, $3) RETURNING id",
    )
    .bind(ranch_id)
    .bind(stock)
    .bind(unit_price)
    .fetch_one(pool)
    .await
    .expect("Error seeding product");
    Fixture { buyer_profile_id, seller_profile_id, ranch_id, product_id }
}

pub async fn seed_review(pool: &SqlitePool, product_id: i64, ranch_id: i64, rating: i64, status: &str) {
    sqlx::query("INSERT INTO reviews (product_id, ranch_id, rating, status) VALUES ($1, $2, $3, $4)")
        .bind(product_id)
        .bind(ranch_id)
        .bind(rating)
        .bind(status)
        .execute(pool)
        .await
        .expect("Error seeding review");
}
