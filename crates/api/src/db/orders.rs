//! Order repository.
//!
//! Placing an order runs in one transaction: each line decrements stock with
//! a conditional update (`stock >= quantity`), so two concurrent orders can
//! never sell the same unit twice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use bazaar_core::{
    OrderId, OrderStatus, ProductId, PromoWindow, UserId, calculate_product_status, final_price,
};

use super::{Pagination, RepositoryError};
use crate::config::ShippingPolicy;
use crate::models::address::AddressInput;
use crate::models::order::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, code, user_id, items, shipping_address, subtotal, shipping_fee, \
                             total, status, note, created_at, updated_at";

/// A requested line after duplicates have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: i32,
}

/// Everything needed to write an order.
#[derive(Debug, Clone)]
pub struct OrderDraft<'a> {
    pub code: &'a str,
    pub user_id: UserId,
    pub lines: &'a [OrderLine],
    pub shipping_address: &'a AddressInput,
    pub note: Option<&'a str>,
    pub shipping: ShippingPolicy,
    pub now: DateTime<Utc>,
}

/// Reasons an order could not be placed.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("product {product_id} has no size {size}")]
    MissingItem { product_id: ProductId, size: String },

    #[error("not enough stock for {name} ({size}): {available} left")]
    OutOfStock {
        name: String,
        size: String,
        available: i32,
    },

    #[error("order code already used")]
    CodeTaken,
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

#[derive(sqlx::FromRow)]
struct SoldProduct {
    name: String,
    images: Vec<String>,
    discount_percent: Option<i16>,
    promo_start: Option<DateTime<Utc>>,
    promo_end: Option<DateTime<Utc>>,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reserve stock, snapshot prices, write the order and drop the ordered
    /// lines from the user's cart, all in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `PlaceOrderError::MissingItem` or `PlaceOrderError::OutOfStock`
    /// for an unfillable line, `PlaceOrderError::CodeTaken` on an order code
    /// collision. Nothing is written on error.
    pub async fn place(&self, draft: &OrderDraft<'_>) -> Result<Order, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let mut items = Vec::with_capacity(draft.lines.len());
        for line in draft.lines {
            items.push(reserve_line(&mut tx, line, draft.now).await?);
        }

        let subtotal: Decimal = items.iter().map(|item: &OrderItem| item.line_total).sum();
        let shipping_fee = draft.shipping.fee_for(subtotal);

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders
                 (code, user_id, items, shipping_address, subtotal, shipping_fee, total, status, note)
             VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(draft.code)
        .bind(draft.user_id)
        .bind(Json(&items))
        .bind(Json(draft.shipping_address))
        .bind(subtotal)
        .bind(shipping_fee)
        .bind(subtotal + shipping_fee)
        .bind(draft.note)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => PlaceOrderError::CodeTaken,
            other => other.into(),
        })?;

        let product_ids: Vec<ProductId> = draft.lines.iter().map(|l| l.product_id).collect();
        let sizes: Vec<String> = draft.lines.iter().map(|l| l.size.clone()).collect();
        sqlx::query(
            "DELETE FROM cart_items c
             USING UNNEST($2::int[], $3::text[]) AS ordered(product_id, size)
             WHERE c.user_id = $1 AND c.product_id = ordered.product_id AND c.size = ordered.size",
        )
        .bind(draft.user_id)
        .bind(&product_ids)
        .bind(&sizes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .bind(status)
        .fetch_all(self.pool)
        .await?;
        Ok(orders)
    }

    /// All orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        page: Pagination,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE ($1::order_status IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Move an order from `from` to `to` and notify its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order is no longer in
    /// `from` (changed concurrently).
    pub async fn transition(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        notification: (&str, &str),
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $3, updated_at = NOW()
             WHERE id = $1 AND status = $2
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| RepositoryError::Conflict("Order status was changed".to_owned()))?;

        let (title, message) = notification;
        sqlx::query("INSERT INTO notifications (user_id, title, message) VALUES ($1, $2, $3)")
            .bind(order.user_id)
            .bind(title)
            .bind(message)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }
}

/// Decrement stock for one line and return its snapshot.
async fn reserve_line(
    conn: &mut PgConnection,
    line: &OrderLine,
    now: DateTime<Utc>,
) -> Result<OrderItem, PlaceOrderError> {
    let price = sqlx::query_scalar::<_, Decimal>(
        "UPDATE product_sizes SET stock = stock - $3
         WHERE product_id = $1 AND size = $2 AND stock >= $3
         RETURNING price",
    )
    .bind(line.product_id)
    .bind(&line.size)
    .bind(line.quantity)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(price) = price else {
        return Err(explain_shortage(conn, line).await);
    };

    let product = sqlx::query_as::<_, SoldProduct>(
        "UPDATE products SET sold = sold + $2 WHERE id = $1
         RETURNING name, images, discount_percent, promo_start, promo_end",
    )
    .bind(line.product_id)
    .bind(line.quantity)
    .fetch_one(&mut *conn)
    .await?;

    let promo = PromoWindow {
        discount_percent: product.discount_percent,
        starts_at: product.promo_start,
        ends_at: product.promo_end,
    };
    let unit_price = final_price(price, &promo, calculate_product_status(&promo, now));

    Ok(OrderItem {
        product_id: line.product_id,
        name: product.name,
        size: line.size.clone(),
        quantity: line.quantity,
        unit_price,
        line_total: unit_price * Decimal::from(line.quantity),
        image: product.images.into_iter().next(),
    })
}

/// Work out why a conditional stock decrement matched no row.
async fn explain_shortage(conn: &mut PgConnection, line: &OrderLine) -> PlaceOrderError {
    let found = sqlx::query_as::<_, (String, i32)>(
        "SELECT p.name, s.stock FROM product_sizes s
         JOIN products p ON p.id = s.product_id
         WHERE s.product_id = $1 AND s.size = $2",
    )
    .bind(line.product_id)
    .bind(&line.size)
    .fetch_optional(conn)
    .await;

    match found {
        Ok(Some((name, available))) => PlaceOrderError::OutOfStock {
            name,
            size: line.size.clone(),
            available,
        },
        Ok(None) => PlaceOrderError::MissingItem {
            product_id: line.product_id,
            size: line.size.clone(),
        },
        Err(e) => e.into(),
    }
}
