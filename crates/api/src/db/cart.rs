//! Cart repository.

use sqlx::PgPool;

use bazaar_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::cart::CartLineDetail;

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's cart lines with product and size details, oldest first.
    ///
    /// Lines whose size was removed are deleted by the foreign key cascade,
    /// so every returned line refers to a purchasable size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLineDetail>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLineDetail>(
            "SELECT c.product_id, c.size, c.quantity, c.added_at,
                    p.name, p.images, p.discount_percent, p.promo_start, p.promo_end,
                    s.price, s.stock
             FROM cart_items c
             JOIN product_sizes s ON s.product_id = c.product_id AND s.size = c.size
             JOIN products p ON p.id = c.product_id
             WHERE c.user_id = $1
             ORDER BY c.added_at, c.product_id, c.size",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Available stock of a size, or `None` if the product or size does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock_for(
        &self,
        product_id: ProductId,
        size: &str,
    ) -> Result<Option<i32>, RepositoryError> {
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock FROM product_sizes WHERE product_id = $1 AND size = $2",
        )
        .bind(product_id)
        .bind(size)
        .fetch_optional(self.pool)
        .await?;
        Ok(stock)
    }

    /// Quantity already in the cart for a line (0 when absent).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
    ) -> Result<i32, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2 AND size = $3",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .fetch_optional(self.pool)
        .await?;
        Ok(quantity.unwrap_or(0))
    }

    /// Insert a line or overwrite its quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the size no longer exists.
    pub async fn set_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, size, quantity)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, product_id, size) DO UPDATE SET quantity = EXCLUDED.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .bind(quantity)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "Product size no longer exists"))?;
        Ok(())
    }

    /// Remove one line. Returns whether a line was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
        size: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2 AND size = $3",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(size)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
