//! Cart operations with stock checks.
//!
//! A cart line can never hold more units than the size has in stock at the
//! time the line is written.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{DomainError, ProductId, Quantity, UserId};

use crate::db::{CartRepository, RepositoryError};
use crate::models::cart::{CartItemInput, CartItemKey, CartView};

#[derive(Debug, Error)]
pub enum CartError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Product size not found")]
    ItemNotFound,

    #[error("Not enough stock: {available} available")]
    NotEnoughStock { available: i32 },

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

pub struct CartService<'a> {
    cart: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            cart: CartRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartError> {
        let lines = self.cart.lines(user_id).await?;
        Ok(CartView::build(lines, Utc::now()))
    }

    /// Add units to a line, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotEnoughStock` if the resulting quantity exceeds
    /// stock, `CartError::ItemNotFound` for an unknown product or size.
    pub async fn add(&self, user_id: UserId, input: &CartItemInput) -> Result<CartView, CartError> {
        let quantity = Quantity::new(input.quantity)?;
        let size = input.size.trim();
        let stock = self.stock(input.product_id, size).await?;

        let existing = self.cart.quantity(user_id, input.product_id, size).await?;
        let wanted = existing.saturating_add(quantity.get());
        check_stock(wanted, stock)?;

        self.cart
            .set_quantity(user_id, input.product_id, size, wanted)
            .await?;
        self.view(user_id).await
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotEnoughStock` if the quantity exceeds stock,
    /// `CartError::ItemNotFound` for an unknown product or size.
    pub async fn set(&self, user_id: UserId, input: &CartItemInput) -> Result<CartView, CartError> {
        let size = input.size.trim();
        if input.quantity == 0 {
            self.cart.remove(user_id, input.product_id, size).await?;
            return self.view(user_id).await;
        }

        let quantity = Quantity::new(input.quantity)?;
        let stock = self.stock(input.product_id, size).await?;
        check_stock(quantity.get(), stock)?;

        self.cart
            .set_quantity(user_id, input.product_id, size, quantity.get())
            .await?;
        self.view(user_id).await
    }

    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in the cart.
    pub async fn remove(&self, user_id: UserId, key: &CartItemKey) -> Result<(), CartError> {
        if self
            .cart
            .remove(user_id, key.product_id, key.size.trim())
            .await?
        {
            Ok(())
        } else {
            Err(CartError::ItemNotFound)
        }
    }

    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        self.cart.clear(user_id).await?;
        Ok(())
    }

    async fn stock(&self, product_id: ProductId, size: &str) -> Result<i32, CartError> {
        self.cart
            .stock_for(product_id, size)
            .await?
            .ok_or(CartError::ItemNotFound)
    }
}

/// Check that `wanted` units fit in `stock`.
///
/// # Errors
///
/// Returns `CartError::NotEnoughStock` when they don't.
pub fn check_stock(wanted: i32, stock: i32) -> Result<(), CartError> {
    if wanted > stock {
        return Err(CartError::NotEnoughStock {
            available: stock.max(0),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_check_stock_allows_up_to_stock() {
        assert!(check_stock(5, 5).is_ok());
        assert!(check_stock(1, 5).is_ok());
    }

    #[test]
    fn test_check_stock_rejects_excess() {
        let err = check_stock(6, 5).unwrap_err();
        assert!(matches!(err, CartError::NotEnoughStock { available: 5 }));
        assert_eq!(err.to_string(), "Not enough stock: 5 available");
    }

    #[test]
    fn test_check_stock_out_of_stock() {
        assert!(matches!(
            check_stock(1, 0),
            Err(CartError::NotEnoughStock { available: 0 })
        ));
    }

    fn line(product_id: ProductId, size: &str, quantity: i32) -> CartItemInput {
        CartItemInput {
            product_id,
            size: size.to_owned(),
            quantity,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_counts_units_already_in_cart(pool: PgPool) {
        let user = fixtures::customer(&pool, "cart@example.com").await;
        let category = fixtures::category(&pool, "Shirts").await;
        let tee = fixtures::product(&pool, category.id, "Tee", &[("M", 1500, 5)]).await;
        let cart = CartService::new(&pool);

        let view = cart.add(user.id, &line(tee.id, "M", 3)).await.unwrap();
        assert_eq!(view.items.len(), 1);

        let err = cart.add(user.id, &line(tee.id, " M ", 3)).await.unwrap_err();
        assert!(matches!(err, CartError::NotEnoughStock { available: 5 }));

        let held = CartRepository::new(&pool)
            .quantity(user.id, tee.id, "M")
            .await
            .unwrap();
        assert_eq!(held, 3);

        cart.add(user.id, &line(tee.id, "M", 2)).await.unwrap();
        let held = CartRepository::new(&pool)
            .quantity(user.id, tee.id, "M")
            .await
            .unwrap();
        assert_eq!(held, 5);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_add_unknown_size(pool: PgPool) {
        let user = fixtures::customer(&pool, "cart@example.com").await;
        let category = fixtures::category(&pool, "Shirts").await;
        let tee = fixtures::product(&pool, category.id, "Tee", &[("M", 1500, 5)]).await;

        let err = CartService::new(&pool)
            .add(user.id, &line(tee.id, "XXL", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound));
    }
}
