//! Seed the catalog from a YAML file.
//!
//! Categories and types are matched by name (case-insensitive) and created
//! when missing. Products are skipped when their category already has a
//! product with the same name, so the command can be re-run.
//!
//! ```yaml
//! categories:
//!   - name: Shirts
//!     image_url: https://cdn.example.com/shirts.jpg
//!     types: [T-Shirt, Polo]
//!     products:
//!       - name: Basic Tee
//!         type: T-Shirt
//!         images: [https://cdn.example.com/tee.jpg]
//!         sizes:
//!           - { size: M, price: "19.99", stock: 40 }
//!           - { size: L, price: "19.99", stock: 25 }
//!         discount_percent: 10
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use bazaar_api::db::{CatalogRepository, ProductRepository, RepositoryError};
use bazaar_api::models::catalog::{Category, CategoryInput, ProductType};
use bazaar_api::models::product::ProductInput;
use bazaar_core::{CategoryId, DomainError, SizePrice};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid category {name:?}: {source}")]
    InvalidCategory { name: String, source: DomainError },

    #[error("Invalid product {name:?}: {source}")]
    InvalidProduct { name: String, source: DomainError },

    #[error("Unknown type {type_name:?} for product {product:?}")]
    UnknownType { product: String, type_name: String },

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Root of the seed file.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub sizes: Vec<SizePrice>,
    pub discount_percent: Option<i16>,
    pub promo_start: Option<DateTime<Utc>>,
    pub promo_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct SeedSummary {
    categories: usize,
    types: usize,
    products: usize,
    skipped: usize,
}

/// Parse and load a catalog seed file.
///
/// The file is fully parsed before connecting to the database.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or parsed, a product is
/// invalid, or a database operation fails.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog seed");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let seed = parse(&content)?;
    info!(categories = seed.categories.len(), "Parsed seed file");

    let pool = connect().await?;
    let summary = load(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories);
    info!("  Types created: {}", summary.types);
    info!("  Products created: {}", summary.products);
    info!("  Products skipped (already exist): {}", summary.skipped);
    Ok(())
}

fn parse(content: &str) -> Result<SeedFile, SeedError> {
    Ok(serde_yaml::from_str(content)?)
}

async fn load(pool: &PgPool, seed: &SeedFile) -> Result<SeedSummary, SeedError> {
    let catalog = CatalogRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut summary = SeedSummary::default();

    let mut categories = catalog.list_categories().await?;
    for entry in &seed.categories {
        let category = match find_category(&categories, &entry.name) {
            Some(existing) => existing.clone(),
            None => {
                let input = CategoryInput {
                    name: entry.name.clone(),
                    image_url: entry.image_url.clone(),
                }
                .normalized()
                .map_err(|source| SeedError::InvalidCategory {
                    name: entry.name.clone(),
                    source,
                })?;
                let created = catalog.create_category(&input).await?;
                summary.categories += 1;
                categories.push(created.clone());
                created
            }
        };

        let mut types = catalog.list_types(Some(category.id)).await?;
        for type_name in &entry.types {
            if find_type(&types, type_name).is_none() {
                types.push(catalog.create_type(category.id, type_name.trim()).await?);
                summary.types += 1;
            }
        }

        for product in &entry.products {
            if product_exists(pool, category.id, &product.name).await? {
                warn!(name = %product.name, "Product already exists, skipping");
                summary.skipped += 1;
                continue;
            }

            let type_id = match &product.type_name {
                Some(type_name) => Some(
                    find_type(&types, type_name)
                        .ok_or_else(|| SeedError::UnknownType {
                            product: product.name.clone(),
                            type_name: type_name.clone(),
                        })?
                        .id,
                ),
                None => None,
            };

            let input = ProductInput {
                name: product.name.clone(),
                description: product.description.clone(),
                category_id: category.id,
                type_id,
                images: product.images.clone(),
                sizes: product.sizes.clone(),
                discount_percent: product.discount_percent,
                promo_start: product.promo_start,
                promo_end: product.promo_end,
            }
            .normalized()
            .map_err(|source| SeedError::InvalidProduct {
                name: product.name.clone(),
                source,
            })?;

            products.create(&input, Utc::now()).await?;
            summary.products += 1;
        }
    }

    Ok(summary)
}

fn find_category<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
}

fn find_type<'a>(types: &'a [ProductType], name: &str) -> Option<&'a ProductType> {
    types.iter().find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

async fn product_exists(
    pool: &PgPool,
    category_id: CategoryId,
    name: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM products WHERE category_id = $1 AND LOWER(name) = LOWER($2))",
    )
    .bind(category_id)
    .bind(name.trim())
    .fetch_one(pool)
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Shirts
    types: [T-Shirt, Polo]
    products:
      - name: Basic Tee
        type: T-Shirt
        sizes:
          - { size: M, price: "19.99", stock: 40 }
        discount_percent: 10
  - name: Hats
"#;

    #[test]
    fn test_parse_sample() {
        let seed = parse(SAMPLE).unwrap();
        assert_eq!(seed.categories.len(), 2);

        let shirts = &seed.categories[0];
        assert_eq!(shirts.types, vec!["T-Shirt", "Polo"]);
        let tee = &shirts.products[0];
        assert_eq!(tee.type_name.as_deref(), Some("T-Shirt"));
        assert_eq!(tee.sizes[0].stock, 40);
        assert_eq!(tee.discount_percent, Some(10));

        assert!(seed.categories[1].products.is_empty());
    }

    #[test]
    fn test_parse_rejects_missing_sizes() {
        let bad = "categories:\n  - name: X\n    products:\n      - name: Y\n";
        assert!(matches!(parse(bad), Err(SeedError::Yaml(_))));
    }

    #[test]
    fn test_find_type_ignores_case() {
        let types = vec![ProductType {
            id: bazaar_core::ProductTypeId::new(1),
            category_id: CategoryId::new(1),
            name: "T-Shirt".to_owned(),
        }];
        assert!(find_type(&types, " t-shirt ").is_some());
        assert!(find_type(&types, "Polo").is_none());
    }
}
