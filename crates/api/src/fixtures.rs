//! Rows for database tests.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{CategoryId, Email, SizePrice, UserRole};

use crate::db::{CatalogRepository, ProductRepository, UserRepository};
use crate::models::address::AddressInput;
use crate::models::catalog::{Category, CategoryInput};
use crate::models::product::{ProductInput, ProductView};
use crate::models::user::User;

/// A customer account. The stored hash is not a real one.
pub async fn customer(pool: &PgPool, email: &str) -> User {
    let email = Email::parse(email).unwrap();
    UserRepository::new(pool)
        .create("Test Customer", &email, "unused", UserRole::Customer)
        .await
        .unwrap()
}

pub async fn category(pool: &PgPool, name: &str) -> Category {
    let input = CategoryInput {
        name: name.to_owned(),
        image_url: None,
    };
    CatalogRepository::new(pool)
        .create_category(&input)
        .await
        .unwrap()
}

/// Product input with one `(size, price in cents, stock)` entry per size.
pub fn product_input(
    category_id: CategoryId,
    name: &str,
    sizes: &[(&str, i64, i32)],
) -> ProductInput {
    ProductInput {
        name: name.to_owned(),
        description: String::new(),
        category_id,
        type_id: None,
        images: Vec::new(),
        sizes: sizes
            .iter()
            .map(|&(size, cents, stock)| SizePrice {
                size: size.to_owned(),
                price: Decimal::new(cents, 2),
                stock,
            })
            .collect(),
        discount_percent: None,
        promo_start: None,
        promo_end: None,
    }
}

pub async fn product(
    pool: &PgPool,
    category_id: CategoryId,
    name: &str,
    sizes: &[(&str, i64, i32)],
) -> ProductView {
    ProductRepository::new(pool)
        .create(&product_input(category_id, name, sizes), Utc::now())
        .await
        .unwrap()
}

pub fn address(full_name: &str) -> AddressInput {
    AddressInput {
        full_name: full_name.to_owned(),
        phone: "0812345678".to_owned(),
        line1: "1 Market Street".to_owned(),
        line2: None,
        city: "Bangkok".to_owned(),
        province: String::new(),
        postal_code: "10200".to_owned(),
        country: "TH".to_owned(),
    }
}
