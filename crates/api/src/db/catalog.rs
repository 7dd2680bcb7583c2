//! Categories and product types.

use sqlx::PgPool;

use bazaar_core::{CategoryId, ProductTypeId};

use super::RepositoryError;
use crate::models::catalog::{Category, CategoryInput, ProductType};

pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, image_url, created_at FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    pub async fn get_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, image_url, created_at FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken.
    pub async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, image_url) VALUES ($1, $2)
             RETURNING id, name, image_url, created_at",
        )
        .bind(&input.name)
        .bind(input.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "Category name already exists"))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict`.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, image_url = $3 WHERE id = $1
             RETURNING id, name, image_url, created_at",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.image_url.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "Category name already exists"))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category and its product types.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while products still reference it.
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::from_constraint(e, "Category still has products")
            })?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_types(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<ProductType>, RepositoryError> {
        let types = sqlx::query_as::<_, ProductType>(
            "SELECT id, category_id, name FROM product_types
             WHERE ($1::int IS NULL OR category_id = $1)
             ORDER BY category_id, name",
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;
        Ok(types)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist.
    pub async fn get_type(&self, id: ProductTypeId) -> Result<ProductType, RepositoryError> {
        sqlx::query_as::<_, ProductType>(
            "SELECT id, category_id, name FROM product_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate name in the
    /// category or an unknown category.
    pub async fn create_type(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<ProductType, RepositoryError> {
        sqlx::query_as::<_, ProductType>(
            "INSERT INTO product_types (category_id, name) VALUES ($1, $2)
             RETURNING id, category_id, name",
        )
        .bind(category_id)
        .bind(name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_constraint(e, "Type already exists or category is unknown")
        })
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` or `RepositoryError::Conflict`.
    pub async fn update_type(
        &self,
        id: ProductTypeId,
        category_id: CategoryId,
        name: &str,
    ) -> Result<ProductType, RepositoryError> {
        sqlx::query_as::<_, ProductType>(
            "UPDATE product_types SET category_id = $2, name = $3 WHERE id = $1
             RETURNING id, category_id, name",
        )
        .bind(id)
        .bind(category_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::from_constraint(e, "Type already exists or category is unknown")
        })?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product type. Products of this type keep their category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist.
    pub async fn delete_type(&self, id: ProductTypeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_types WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
