//! Checkout and order lifecycle.

use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{DomainError, OrderId, OrderStatus, ProductId, Quantity};
use tracing::{info, warn};

use crate::config::ShippingPolicy;
use crate::db::orders::{OrderDraft, OrderLine, PlaceOrderError};
use crate::db::{AddressRepository, OrderRepository, RepositoryError};
use crate::models::CurrentUser;
use crate::models::address::AddressInput;
use crate::models::order::{CreateOrderInput, Order, OrderItemInput};

const ORDER_CODE_PREFIX: &str = "ORD-";
const ORDER_CODE_LEN: usize = 8;
const ORDER_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_CODE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("A shipping address is required")]
    AddressRequired,

    #[error("Address not found")]
    AddressNotFound,

    #[error("Order not found")]
    NotFound,

    #[error("Product {product_id} has no size {size}")]
    ItemNotFound { product_id: ProductId, size: String },

    #[error("Not enough stock for {name} ({size}): {available} available")]
    OutOfStock {
        name: String,
        size: String,
        available: i32,
    },

    #[error("Invalid order status: {0}")]
    InvalidStatus(String),

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<PlaceOrderError> for OrderError {
    fn from(e: PlaceOrderError) -> Self {
        match e {
            PlaceOrderError::Repository(e) => Self::Repository(e),
            PlaceOrderError::MissingItem { product_id, size } => {
                Self::ItemNotFound { product_id, size }
            }
            PlaceOrderError::OutOfStock {
                name,
                size,
                available,
            } => Self::OutOfStock {
                name,
                size,
                available,
            },
            PlaceOrderError::CodeTaken => Self::Repository(RepositoryError::Conflict(
                "could not allocate an order code".to_owned(),
            )),
        }
    }
}

pub struct OrderService<'a> {
    pool: &'a PgPool,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(pool),
        }
    }

    /// Place an order for `user`.
    ///
    /// # Errors
    ///
    /// Returns an `OrderError` for invalid input, an unknown address, an
    /// unknown product size or insufficient stock.
    pub async fn place(
        &self,
        user: &CurrentUser,
        input: &CreateOrderInput,
        shipping: ShippingPolicy,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        let lines = merge_lines(&input.items)?;
        let address = self.resolve_address(user, input).await?;
        let note = input
            .note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let code = generate_order_code(&mut rand::rng());
            let draft = OrderDraft {
                code: &code,
                user_id: user.id,
                lines: &lines,
                shipping_address: &address,
                note,
                shipping,
                now,
            };

            match self.orders.place(&draft).await {
                Ok(order) => {
                    info!(order_id = %order.id, code = %order.code, total = %order.total, "Order placed");
                    return Ok(order);
                }
                Err(PlaceOrderError::CodeTaken) if attempt < MAX_CODE_ATTEMPTS => {
                    warn!(code = %code, "Order code collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Get an order visible to `user`: their own, or any for an admin.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist or is not
    /// visible to the user.
    pub async fn get_for(&self, user: &CurrentUser, id: OrderId) -> Result<Order, OrderError> {
        let order = self.get(id).await?;
        if order.user_id != user.id && !user.role.is_admin() {
            return Err(OrderError::NotFound);
        }
        Ok(order)
    }

    /// Move an order forward in its lifecycle and notify its owner.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidStatus` for an unknown status and
    /// `OrderError::InvalidTransition` for a backward or repeated move.
    pub async fn update_status(&self, id: OrderId, raw_status: &str) -> Result<Order, OrderError> {
        let next: OrderStatus = raw_status
            .trim()
            .parse()
            .map_err(|_| OrderError::InvalidStatus(raw_status.to_owned()))?;

        let order = self.get(id).await?;
        if !order.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: next,
            });
        }

        let (title, message) = status_notification(&order.code, next);
        let updated = self
            .orders
            .transition(id, order.status, next, (&title, &message))
            .await?;

        info!(order_id = %id, from = %order.status, to = %next, "Order status updated");
        Ok(updated)
    }

    async fn get(&self, id: OrderId) -> Result<Order, OrderError> {
        self.orders.get(id).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::NotFound,
            other => OrderError::Repository(other),
        })
    }

    async fn resolve_address(
        &self,
        user: &CurrentUser,
        input: &CreateOrderInput,
    ) -> Result<AddressInput, OrderError> {
        if let Some(address_id) = input.address_id {
            let address = AddressRepository::new(self.pool)
                .get(user.id, address_id)
                .await
                .map_err(|e| match e {
                    RepositoryError::NotFound => OrderError::AddressNotFound,
                    other => OrderError::Repository(other),
                })?;
            return Ok(AddressInput::from(&address));
        }

        match &input.shipping_address {
            Some(address) => Ok(address.normalized()?),
            None => Err(OrderError::AddressRequired),
        }
    }
}

/// Validate requested items and merge repeated product/size pairs.
///
/// Lines come back sorted by product then size, the order stock rows are
/// locked in at checkout, so concurrent orders never wait on each other in
/// a cycle.
///
/// # Errors
///
/// Returns `OrderError::EmptyOrder` for no items and a `DomainError` for a
/// quantity below 1 or a blank size.
pub fn merge_lines(items: &[OrderItemInput]) -> Result<Vec<OrderLine>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut lines: Vec<OrderLine> = Vec::with_capacity(items.len());
    for item in items {
        let quantity = Quantity::new(item.quantity)?;
        let size = item.size.trim();
        if size.is_empty() {
            return Err(DomainError::Invalid("Size is required".to_owned()).into());
        }

        match lines
            .iter_mut()
            .find(|l| l.product_id == item.product_id && l.size == size)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity.get()),
            None => lines.push(OrderLine {
                product_id: item.product_id,
                size: size.to_owned(),
                quantity: quantity.get(),
            }),
        }
    }
    lines.sort_by(|a, b| (a.product_id, &a.size).cmp(&(b.product_id, &b.size)));
    Ok(lines)
}

/// Generate an order code such as `ORD-7K2QX9AB`.
pub fn generate_order_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut code = String::with_capacity(ORDER_CODE_PREFIX.len() + ORDER_CODE_LEN);
    code.push_str(ORDER_CODE_PREFIX);
    for _ in 0..ORDER_CODE_LEN {
        let idx = rng.random_range(0..ORDER_CODE_CHARSET.len());
        code.push(char::from(ORDER_CODE_CHARSET.get(idx).copied().unwrap_or(b'X')));
    }
    code
}

fn status_notification(code: &str, status: OrderStatus) -> (String, String) {
    match status {
        OrderStatus::Pending => (
            "Order received".to_owned(),
            format!("Your order {code} has been received."),
        ),
        OrderStatus::Shipping => (
            "Order shipped".to_owned(),
            format!("Your order {code} is on its way."),
        ),
        OrderStatus::Delivered => (
            "Order delivered".to_owned(),
            format!("Your order {code} has been delivered."),
        ),
    }
}
