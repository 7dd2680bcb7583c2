//! Product reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, ProductId, Rating, ReviewId, UserId};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    pub rating: i16,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    pub rating: i16,
    #[serde(default)]
    pub content: String,
}

impl ReviewInput {
    /// # Errors
    ///
    /// Returns `DomainError::RatingOutOfRange` outside `1..=5`.
    pub fn validated(&self) -> Result<(Rating, String), DomainError> {
        Ok((Rating::new(self.rating)?, self.content.trim().to_owned()))
    }
}
