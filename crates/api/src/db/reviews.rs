//! Review repository.
//!
//! Every write recomputes the product's `rating_average` and `rating_count`
//! in the same transaction.

use sqlx::{PgConnection, PgPool};

use bazaar_core::{ProductId, Rating, ReviewId, UserId};

use super::RepositoryError;
use crate::models::review::Review;

const REVIEW_SELECT: &str = "SELECT r.id, r.product_id, r.user_id, u.name AS author_name, r.rating, \
     r.content, r.created_at, r.updated_at
     FROM reviews r JOIN users u ON u.id = r.user_id";

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, product_id: ProductId) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.product_id = $1 ORDER BY r.created_at DESC, r.id DESC"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn get(&self, id: ReviewId) -> Result<Review, RepositoryError> {
        fetch_review(self.pool, id).await
    }

    /// Create a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the
    /// product, `RepositoryError::NotFound` if the product does not exist.
    pub async fn create(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: Rating,
        content: &str,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, ReviewId>(
            "INSERT INTO reviews (product_id, user_id, rating, content)
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating.get())
        .bind(content)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Conflict("You have already reviewed this product".to_owned())
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::NotFound
            }
            other => RepositoryError::Database(other),
        })?;

        refresh_rating(&mut tx, product_id).await?;
        let review = fetch_review(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(review)
    }

    /// Update the author's own review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review is not the user's.
    pub async fn update(
        &self,
        id: ReviewId,
        user_id: UserId,
        rating: Rating,
        content: &str,
    ) -> Result<Review, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query_scalar::<_, ProductId>(
            "UPDATE reviews SET rating = $3, content = $4, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING product_id",
        )
        .bind(id)
        .bind(user_id)
        .bind(rating.get())
        .bind(content)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        refresh_rating(&mut tx, product_id).await?;
        let review = fetch_review(&mut *tx, id).await?;
        tx.commit().await?;
        Ok(review)
    }

    /// Delete a review. Ownership is checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the review does not exist.
    pub async fn delete(&self, id: ReviewId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id = sqlx::query_scalar::<_, ProductId>(
            "DELETE FROM reviews WHERE id = $1 RETURNING product_id",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        refresh_rating(&mut tx, product_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

async fn fetch_review<'e, E>(executor: E, id: ReviewId) -> Result<Review, RepositoryError>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, Review>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(RepositoryError::NotFound)
}

async fn refresh_rating(conn: &mut PgConnection, product_id: ProductId) -> Result<(), RepositoryError> {
    sqlx::query(
        "UPDATE products p
         SET rating_count = agg.count, rating_average = agg.average
         FROM (
             SELECT COUNT(*)::int AS count,
                    COALESCE(ROUND(AVG(rating)::numeric, 2), 0) AS average
             FROM reviews WHERE product_id = $1
         ) agg
         WHERE p.id = $1",
    )
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::ProductRepository;
    use crate::fixtures;

    async fn rating_of(pool: &PgPool, product_id: ProductId) -> (Decimal, i32) {
        let product = ProductRepository::new(pool)
            .get(product_id, Utc::now())
            .await
            .unwrap();
        (product.rating_average, product.rating_count)
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_writes_recompute_product_rating(pool: PgPool) {
        let category = fixtures::category(&pool, "Shirts").await;
        let tee = fixtures::product(&pool, category.id, "Tee", &[("M", 1500, 5)]).await;
        let ana = fixtures::customer(&pool, "ana@example.com").await;
        let ben = fixtures::customer(&pool, "ben@example.com").await;
        let reviews = ReviewRepository::new(&pool);

        let first = reviews
            .create(tee.id, ana.id, Rating::new(5).unwrap(), "Great")
            .await
            .unwrap();
        assert_eq!(first.author_name, "Test Customer");
        reviews
            .create(tee.id, ben.id, Rating::new(2).unwrap(), "Shrank")
            .await
            .unwrap();
        assert_eq!(rating_of(&pool, tee.id).await, (Decimal::new(350, 2), 2));

        reviews
            .update(first.id, ana.id, Rating::new(3).unwrap(), "Fine")
            .await
            .unwrap();
        assert_eq!(rating_of(&pool, tee.id).await, (Decimal::new(250, 2), 2));

        reviews.delete(first.id).await.unwrap();
        assert_eq!(rating_of(&pool, tee.id).await, (Decimal::new(200, 2), 1));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_last_review_deleted_resets_rating(pool: PgPool) {
        let category = fixtures::category(&pool, "Shirts").await;
        let tee = fixtures::product(&pool, category.id, "Tee", &[("M", 1500, 5)]).await;
        let ana = fixtures::customer(&pool, "ana@example.com").await;
        let reviews = ReviewRepository::new(&pool);

        let review = reviews
            .create(tee.id, ana.id, Rating::new(4).unwrap(), "Good")
            .await
            .unwrap();
        reviews.delete(review.id).await.unwrap();

        assert_eq!(rating_of(&pool, tee.id).await, (Decimal::ZERO, 0));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_one_review_per_user(pool: PgPool) {
        let category = fixtures::category(&pool, "Shirts").await;
        let tee = fixtures::product(&pool, category.id, "Tee", &[("M", 1500, 5)]).await;
        let ana = fixtures::customer(&pool, "ana@example.com").await;
        let reviews = ReviewRepository::new(&pool);

        reviews
            .create(tee.id, ana.id, Rating::new(4).unwrap(), "Good")
            .await
            .unwrap();
        let err = reviews
            .create(tee.id, ana.id, Rating::new(1).unwrap(), "Changed my mind")
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(rating_of(&pool, tee.id).await, (Decimal::new(400, 2), 1));
    }
}
