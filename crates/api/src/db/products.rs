//! Product repository.
//!
//! Products are stored in `products` with one `product_sizes` row per size.
//! Reads return [`ProductView`]s priced at the `now` passed in by the caller.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use bazaar_core::{CategoryId, ProductId, PromoWindow, SizePrice};

use super::{Pagination, RepositoryError};
use crate::models::product::{ProductInput, ProductQuery, ProductRow, ProductSizeRow, ProductView};

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.description, p.category_id, p.type_id, \
     p.images, p.discount_percent, p.promo_start, p.promo_end, p.rating_average, \
     p.rating_count, p.sold, p.created_at, p.updated_at";

/// Catalog filters shared by the listing and its count.
/// `$1` category, `$2` type, `$3` name pattern, `$4` on-promo flag, `$5` now.
const LISTING_FILTER: &str = "($1::int IS NULL OR p.category_id = $1)
       AND ($2::int IS NULL OR p.type_id = $2)
       AND ($3::text IS NULL OR p.name ILIKE $3)
       AND ($4::bool IS NULL OR (
               p.discount_percent IS NOT NULL
               AND (p.promo_start IS NULL OR p.promo_start <= $5)
               AND (p.promo_end IS NULL OR p.promo_end >= $5)
           ) = $4)";

/// Cheapest size at the price a customer pays at `$5`. Promo bounds are
/// inclusive and rounding matches `round_money`.
const MIN_FINAL_PRICE: &str = "ROUND(
           (SELECT MIN(s.price) FROM product_sizes s WHERE s.product_id = p.id)
           * CASE WHEN p.discount_percent IS NOT NULL
                       AND (p.promo_start IS NULL OR p.promo_start <= $5)
                       AND (p.promo_end IS NULL OR p.promo_end >= $5)
                  THEN (100 - p.discount_percent) / 100.0
                  ELSE 1 END,
           2)";

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching the query filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        query: &ProductQuery,
        now: DateTime<Utc>,
    ) -> Result<(Vec<ProductView>, i64, Pagination), RepositoryError> {
        let page = query.pagination();
        let pattern = query.search_pattern();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS}, {MIN_FINAL_PRICE} AS min_price
             FROM products p
             WHERE {LISTING_FILTER}
             ORDER BY {}
             LIMIT $6 OFFSET $7",
            query.sort.order_by()
        ))
        .bind(query.category)
        .bind(query.type_id)
        .bind(pattern.as_deref())
        .bind(query.on_promo)
        .bind(now)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM products p WHERE {LISTING_FILTER}"
        ))
        .bind(query.category)
        .bind(query.type_id)
        .bind(pattern.as_deref())
        .bind(query.on_promo)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok((self.with_sizes(rows, now).await?, total, page))
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId, now: DateTime<Utc>) -> Result<ProductView, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        self.with_sizes(vec![row], now)
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn ensure_exists(&self, id: ProductId) -> Result<(), RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        if exists {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    /// Get several products, keeping the order of `ids`. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_many(
        &self,
        ids: &[ProductId],
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products p WHERE p.id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        let mut views: HashMap<ProductId, ProductView> = self
            .with_sizes(rows, now)
            .await?
            .into_iter()
            .map(|view| (view.id, view))
            .collect();
        Ok(ids.iter().filter_map(|id| views.remove(id)).collect())
    }

    /// Create a product with its sizes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for an unknown category or type,
    /// or a type from another category.
    pub async fn create(
        &self,
        input: &ProductInput,
        now: DateTime<Utc>,
    ) -> Result<ProductView, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        check_type_category(&mut tx, input).await?;

        let id = sqlx::query_scalar::<_, ProductId>(
            "INSERT INTO products
                 (name, description, category_id, type_id, images,
                  discount_percent, promo_start, promo_end)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.type_id)
        .bind(&input.images)
        .bind(input.discount_percent)
        .bind(input.promo_start)
        .bind(input.promo_end)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "Unknown category or type"))?;

        upsert_sizes(&mut tx, id, &input.sizes).await?;
        tx.commit().await?;

        self.get(id, now).await
    }

    /// Replace a product's fields and size list.
    ///
    /// Sizes not in `input` are removed (with any cart lines for them);
    /// remaining sizes keep their cart lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` for an unknown category or type, or a
    /// type from another category.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
        now: DateTime<Utc>,
    ) -> Result<ProductView, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        check_type_category(&mut tx, input).await?;

        let result = sqlx::query(
            "UPDATE products
             SET name = $2, description = $3, category_id = $4, type_id = $5, images = $6,
                 discount_percent = $7, promo_start = $8, promo_end = $9, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.category_id)
        .bind(input.type_id)
        .bind(&input.images)
        .bind(input.discount_percent)
        .bind(input.promo_start)
        .bind(input.promo_end)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "Unknown category or type"))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let labels: Vec<String> = input.sizes.iter().map(|s| s.size.clone()).collect();
        sqlx::query("DELETE FROM product_sizes WHERE product_id = $1 AND NOT (size = ANY($2))")
            .bind(id)
            .bind(&labels)
            .execute(&mut *tx)
            .await?;
        upsert_sizes(&mut tx, id, &input.sizes).await?;
        tx.commit().await?;

        self.get(id, now).await
    }

    /// Set or clear the promo window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_promo(
        &self,
        id: ProductId,
        promo: &PromoWindow,
        now: DateTime<Utc>,
    ) -> Result<ProductView, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products
             SET discount_percent = $2, promo_start = $3, promo_end = $4, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(promo.discount_percent)
        .bind(promo.starts_at)
        .bind(promo.ends_at)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id, now).await
    }

    /// Delete a product. Sizes, cart lines, wishlist entries, reviews and
    /// comments go with it; order snapshots are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn with_sizes(
        &self,
        rows: Vec<ProductRow>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProductView>, RepositoryError> {
        let ids: Vec<ProductId> = rows.iter().map(|r| r.id).collect();
        let mut sizes = load_sizes(self.pool, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let product_sizes = sizes.remove(&row.id).unwrap_or_default();
                ProductView::build(row, product_sizes, now)
            })
            .collect())
    }
}

/// Sizes for a set of products, in display order.
pub(crate) async fn load_sizes(
    pool: &PgPool,
    ids: &[ProductId],
) -> Result<HashMap<ProductId, Vec<SizePrice>>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, ProductSizeRow>(
        "SELECT product_id, size, price, stock FROM product_sizes
         WHERE product_id = ANY($1)
         ORDER BY product_id, position, size",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    let mut by_product: HashMap<ProductId, Vec<SizePrice>> = HashMap::new();
    for row in rows {
        by_product.entry(row.product_id).or_default().push(row.into());
    }
    Ok(by_product)
}

/// A product's type must belong to the product's category.
async fn check_type_category(
    conn: &mut PgConnection,
    input: &ProductInput,
) -> Result<(), RepositoryError> {
    let Some(type_id) = input.type_id else {
        return Ok(());
    };
    let category_id =
        sqlx::query_scalar::<_, CategoryId>("SELECT category_id FROM product_types WHERE id = $1")
            .bind(type_id)
            .fetch_optional(&mut *conn)
            .await?;
    match category_id {
        None => Err(RepositoryError::Conflict("Unknown category or type".to_owned())),
        Some(id) if id != input.category_id => Err(RepositoryError::Conflict(
            "Type does not belong to the category".to_owned(),
        )),
        Some(_) => Ok(()),
    }
}

async fn upsert_sizes(
    conn: &mut PgConnection,
    id: ProductId,
    sizes: &[SizePrice],
) -> Result<(), RepositoryError> {
    for (position, size) in sizes.iter().enumerate() {
        let position = i16::try_from(position)
            .map_err(|_| RepositoryError::Conflict("Too many sizes".to_owned()))?;
        sqlx::query(
            "INSERT INTO product_sizes (product_id, size, price, stock, position)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (product_id, size)
             DO UPDATE SET price = EXCLUDED.price, stock = EXCLUDED.stock,
                           position = EXCLUDED.position",
        )
        .bind(id)
        .bind(&size.size)
        .bind(size.price)
        .bind(size.stock)
        .bind(position)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::CatalogRepository;
    use crate::fixtures;
    use crate::models::product::ProductSort;

    async fn names_sorted(pool: &PgPool, sort: ProductSort) -> Vec<String> {
        let query = ProductQuery {
            sort,
            ..ProductQuery::default()
        };
        let (products, _, _) = ProductRepository::new(pool)
            .list(&query, Utc::now())
            .await
            .unwrap();
        products.into_iter().map(|p| p.name).collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_price_sort_uses_promo_price(pool: PgPool) {
        let category = fixtures::category(&pool, "Shirts").await;
        let repo = ProductRepository::new(&pool);
        let now = Utc::now();

        let mut on_sale = fixtures::product_input(category.id, "On sale", &[("M", 10000, 1)]);
        on_sale.discount_percent = Some(50);
        repo.create(&on_sale, now).await.unwrap();

        let mut expired = fixtures::product_input(category.id, "Expired", &[("M", 5500, 1)]);
        expired.discount_percent = Some(90);
        expired.promo_end = Some(now - Duration::days(1));
        repo.create(&expired, now).await.unwrap();

        fixtures::product(&pool, category.id, "Plain", &[("S", 6000, 1), ("L", 6500, 1)]).await;

        assert_eq!(
            names_sorted(&pool, ProductSort::PriceAsc).await,
            vec!["On sale", "Expired", "Plain"]
        );
        assert_eq!(
            names_sorted(&pool, ProductSort::PriceDesc).await,
            vec!["Plain", "Expired", "On sale"]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_type_must_match_category(pool: PgPool) {
        let shirts = fixtures::category(&pool, "Shirts").await;
        let shoes = fixtures::category(&pool, "Shoes").await;
        let sneakers = CatalogRepository::new(&pool)
            .create_type(shoes.id, "Sneakers")
            .await
            .unwrap();
        let repo = ProductRepository::new(&pool);

        let mut input = fixtures::product_input(shirts.id, "Tee", &[("M", 1500, 1)]);
        input.type_id = Some(sneakers.id);
        let err = repo.create(&input, Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref msg) if msg.contains("category")));

        input.category_id = shoes.id;
        let runner = repo.create(&input, Utc::now()).await.unwrap();
        assert_eq!(runner.type_id, Some(sneakers.id));

        input.category_id = shirts.id;
        let err = repo.update(runner.id, &input, Utc::now()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        let unchanged = repo.get(runner.id, Utc::now()).await.unwrap();
        assert_eq!(unchanged.category_id, shoes.id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_ensure_exists(pool: PgPool) {
        let category = fixtures::category(&pool, "Shirts").await;
        let tee = fixtures::product(&pool, category.id, "Tee", &[("M", 1500, 1)]).await;
        let repo = ProductRepository::new(&pool);

        assert!(repo.ensure_exists(tee.id).await.is_ok());
        repo.delete(tee.id).await.unwrap();
        assert!(matches!(
            repo.ensure_exists(tee.id).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
