//! Categories and product types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{CategoryId, DomainError, ProductTypeId};

use super::{optional_text, required_text};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A product type within a category (e.g. "Sneakers" under "Shoes").
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub category_id: CategoryId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub image_url: Option<String>,
}

impl CategoryInput {
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` for a blank name.
    pub fn normalized(&self) -> Result<Self, DomainError> {
        Ok(Self {
            name: required_text(&self.name, "Category name")?,
            image_url: optional_text(self.image_url.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProductTypeInput {
    pub category_id: CategoryId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProductTypeQuery {
    pub category: Option<CategoryId>,
}
