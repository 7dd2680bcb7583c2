//! Orders and their item/address snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use bazaar_core::{AddressId, OrderId, OrderStatus, ProductId, UserId};

use super::address::AddressInput;
use crate::db::Pagination;

/// One purchased line, frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub size: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub code: String,
    pub user_id: UserId,
    pub items: Json<Vec<OrderItem>>,
    pub shipping_address: Json<AddressInput>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemInput {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}

/// Checkout request body. Either `address_id` or `shipping_address` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub items: Vec<OrderItemInput>,
    pub address_id: Option<AddressId>,
    pub shipping_address: Option<AddressInput>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderQuery {
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

/// Status change request body.
///
/// Kept as a string so unknown values produce a readable 400.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_create_order_input_accepts_address_id() {
        let body = r#"{"items":[{"product_id":3,"size":"L","quantity":2}],"address_id":5}"#;
        let input: CreateOrderInput = serde_json::from_str(body).unwrap();
        assert_eq!(input.items[0].product_id, ProductId::new(3));
        assert_eq!(input.address_id, Some(AddressId::new(5)));
        assert!(input.shipping_address.is_none());
    }

    #[test]
    fn test_order_item_snapshot_serializes() {
        let item = OrderItem {
            product_id: ProductId::new(1),
            name: "Tee".to_owned(),
            size: "S".to_owned(),
            quantity: 2,
            unit_price: Decimal::new(1250, 2),
            line_total: Decimal::new(2500, 2),
            image: None,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["unit_price"], "12.50");
        let back: OrderItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }
}
