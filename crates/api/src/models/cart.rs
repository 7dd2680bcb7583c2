//! Shopping cart lines and the priced cart view.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{ProductId, PromoWindow, calculate_product_status, final_price};

/// A cart line joined with its product and size.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartLineDetail {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
    pub name: String,
    pub images: Vec<String>,
    pub discount_percent: Option<i16>,
    pub promo_start: Option<DateTime<Utc>>,
    pub promo_end: Option<DateTime<Utc>>,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub size: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub available_stock: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: Decimal,
    pub item_count: i64,
}

impl CartView {
    /// Price every line at `now` and total the cart.
    #[must_use]
    pub fn build(lines: Vec<CartLineDetail>, now: DateTime<Utc>) -> Self {
        let items: Vec<CartItemView> = lines
            .into_iter()
            .map(|line| {
                let promo = PromoWindow {
                    discount_percent: line.discount_percent,
                    starts_at: line.promo_start,
                    ends_at: line.promo_end,
                };
                let unit_price =
                    final_price(line.price, &promo, calculate_product_status(&promo, now));
                CartItemView {
                    product_id: line.product_id,
                    image: line.images.into_iter().next(),
                    name: line.name,
                    size: line.size,
                    quantity: line.quantity,
                    unit_price,
                    line_total: unit_price * Decimal::from(line.quantity),
                    available_stock: line.stock,
                    added_at: line.added_at,
                }
            })
            .collect();

        Self {
            subtotal: items.iter().map(|item| item.line_total).sum(),
            item_count: items.iter().map(|item| i64::from(item.quantity)).sum(),
            items,
        }
    }
}

/// Add/set request body for a cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemInput {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}

/// Identifies one cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemKey {
    pub product_id: ProductId,
    pub size: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn line(price_cents: i64, quantity: i32, discount: Option<i16>) -> CartLineDetail {
        CartLineDetail {
            product_id: ProductId::new(1),
            size: "M".to_owned(),
            quantity,
            added_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            name: "Linen Shirt".to_owned(),
            images: vec!["https://img.example.com/shirt.jpg".to_owned()],
            discount_percent: discount,
            promo_start: None,
            promo_end: None,
            price: Decimal::new(price_cents, 2),
            stock: 10,
        }
    }

    #[test]
    fn test_cart_totals_use_final_price() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let cart = CartView::build(vec![line(2000, 2, Some(25)), line(999, 1, None)], now);

        assert_eq!(cart.items[0].unit_price, Decimal::new(1500, 2));
        assert_eq!(cart.items[0].line_total, Decimal::new(3000, 2));
        assert_eq!(cart.subtotal, Decimal::new(3999, 2));
        assert_eq!(cart.item_count, 3);
        assert_eq!(
            cart.items[0].image.as_deref(),
            Some("https://img.example.com/shirt.jpg")
        );
    }

    #[test]
    fn test_empty_cart() {
        let cart = CartView::build(vec![], Utc::now());
        assert!(cart.items.is_empty());
        assert_eq!(cart.subtotal, Decimal::ZERO);
        assert_eq!(cart.item_count, 0);
    }
}
