//! Read-only collaborator lookups used for receipt assembly. The engine never mutates these records
//! (stock fields and rating averages excepted, which have their own modules).
use sqlx::SqliteConnection;

use crate::db_types::{Product, Profile, Ranch};

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, ranch_id, title, animal_type, breed, quantity, status, unit_price, currency, average_rating \
         FROM products WHERE id = $1",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_profile(profile_id: i64, conn: &mut SqliteConnection) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, display_name, business_name, legal_name, tax_id, identity_number, phone, email \
         FROM profiles WHERE id = $1",
    )
    .bind(profile_id)
    .fetch_optional(conn)
    .await
}

pub async fn fetch_ranch(ranch_id: i64, conn: &mut SqliteConnection) -> Result<Option<Ranch>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, owner_profile_id, name, address, city, state, average_rating FROM ranches WHERE id = $1",
    )
    .bind(ranch_id)
    .fetch_optional(conn)
    .await
}
