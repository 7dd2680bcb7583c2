//! Products, their sizes, and the priced view returned to clients.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{
    CategoryId, DomainError, PricedProduct, ProductId, ProductTypeId, PromoWindow, SizePrice,
    attach_final_price,
};

use super::required_text;
use crate::db::Pagination;

/// A `products` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub type_id: Option<ProductTypeId>,
    pub images: Vec<String>,
    pub discount_percent: Option<i16>,
    pub promo_start: Option<DateTime<Utc>>,
    pub promo_end: Option<DateTime<Utc>>,
    pub rating_average: Decimal,
    pub rating_count: i32,
    pub sold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    #[must_use]
    pub const fn promo(&self) -> PromoWindow {
        PromoWindow {
            discount_percent: self.discount_percent,
            starts_at: self.promo_start,
            ends_at: self.promo_end,
        }
    }
}

/// A `product_sizes` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSizeRow {
    pub product_id: ProductId,
    pub size: String,
    pub price: Decimal,
    pub stock: i32,
}

impl From<ProductSizeRow> for SizePrice {
    fn from(row: ProductSizeRow) -> Self {
        Self {
            size: row.size,
            price: row.price,
            stock: row.stock,
        }
    }
}

/// Product as returned by the API, with pricing computed for the request time.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub category_id: CategoryId,
    pub type_id: Option<ProductTypeId>,
    pub images: Vec<String>,
    pub promo_start: Option<DateTime<Utc>>,
    pub promo_end: Option<DateTime<Utc>>,
    pub rating_average: Decimal,
    pub rating_count: i32,
    pub sold: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub pricing: PricedProduct,
}

impl ProductView {
    /// Combine a product row with its sizes, pricing them at `now`.
    #[must_use]
    pub fn build(row: ProductRow, sizes: Vec<SizePrice>, now: DateTime<Utc>) -> Self {
        let pricing = attach_final_price(&row.promo(), &sizes, now);
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            category_id: row.category_id,
            type_id: row.type_id,
            images: row.images,
            promo_start: row.promo_start,
            promo_end: row.promo_end,
            rating_average: row.rating_average,
            rating_count: row.rating_count,
            sold: row.sold,
            created_at: row.created_at,
            updated_at: row.updated_at,
            pricing,
        }
    }
}

/// Create/replace request body for a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: CategoryId,
    pub type_id: Option<ProductTypeId>,
    #[serde(default)]
    pub images: Vec<String>,
    pub sizes: Vec<SizePrice>,
    pub discount_percent: Option<i16>,
    pub promo_start: Option<DateTime<Utc>>,
    pub promo_end: Option<DateTime<Utc>>,
}

impl ProductInput {
    #[must_use]
    pub const fn promo(&self) -> PromoWindow {
        PromoWindow {
            discount_percent: self.discount_percent,
            starts_at: self.promo_start,
            ends_at: self.promo_end,
        }
    }

    /// Trim text, drop blank image URLs, and check sizes and promo.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` for a blank name, no sizes, duplicate size
    /// labels, an invalid size, or an invalid promo window.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let name = required_text(&self.name, "Product name")?;
        if self.sizes.is_empty() {
            return Err(DomainError::Invalid(
                "At least one size is required".to_owned(),
            ));
        }

        let promo = self.promo();
        let mut seen = HashSet::new();
        let mut sizes = Vec::with_capacity(self.sizes.len());
        for size in self.sizes {
            size.validate()?;
            let label = size.size.trim().to_owned();
            if !seen.insert(label.to_lowercase()) {
                return Err(DomainError::Invalid(format!("Duplicate size: {label}")));
            }
            sizes.push(SizePrice { size: label, ..size });
        }
        promo.validate()?;

        Ok(Self {
            name,
            description: self.description.trim().to_owned(),
            images: self
                .images
                .into_iter()
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty())
                .collect(),
            sizes,
            ..self
        })
    }
}

/// Promo set/clear request body. A missing `discount_percent` clears the promo.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PromoInput {
    pub discount_percent: Option<i16>,
    pub promo_start: Option<DateTime<Utc>>,
    pub promo_end: Option<DateTime<Utc>>,
}

impl From<PromoInput> for PromoWindow {
    fn from(input: PromoInput) -> Self {
        if input.discount_percent.is_none() {
            return Self::default();
        }
        Self {
            discount_percent: input.discount_percent,
            starts_at: input.promo_start,
            ends_at: input.promo_end,
        }
    }
}

/// Listing order for the product catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Rating,
    BestSelling,
}

impl ProductSort {
    /// `ORDER BY` clause for this sort. Values are fixed strings, never user input.
    ///
    /// Price sorts use each product's cheapest size after any promo active
    /// at request time (`min_price` in the listing query).
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id DESC",
            Self::PriceAsc => "min_price ASC NULLS LAST, p.id",
            Self::PriceDesc => "min_price DESC NULLS LAST, p.id",
            Self::Rating => "p.rating_average DESC, p.rating_count DESC, p.id",
            Self::BestSelling => "p.sold DESC, p.id",
        }
    }
}

/// Query parameters for `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub category: Option<CategoryId>,
    #[serde(rename = "type")]
    pub type_id: Option<ProductTypeId>,
    pub search: Option<String>,
    pub on_promo: Option<bool>,
    #[serde(default)]
    pub sort: ProductSort,
}

impl ProductQuery {
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    /// `ILIKE` pattern for the search term, with wildcards escaped.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{escaped}%"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn size(label: &str, cents: i64, stock: i32) -> SizePrice {
        SizePrice {
            size: label.to_owned(),
            price: Decimal::new(cents, 2),
            stock,
        }
    }

    fn input(sizes: Vec<SizePrice>) -> ProductInput {
        ProductInput {
            name: "  Canvas Tote ".to_owned(),
            description: String::new(),
            category_id: CategoryId::new(1),
            type_id: None,
            images: vec![" https://img.example.com/a.jpg ".to_owned(), "  ".to_owned()],
            sizes,
            discount_percent: None,
            promo_start: None,
            promo_end: None,
        }
    }

    #[test]
    fn test_normalized_trims() {
        let product = input(vec![size(" M ", 1000, 3)]).normalized().unwrap();
        assert_eq!(product.name, "Canvas Tote");
        assert_eq!(product.images, vec!["https://img.example.com/a.jpg"]);
        assert_eq!(product.sizes[0].size, "M");
    }

    #[test]
    fn test_normalized_requires_a_size() {
        assert!(input(vec![]).normalized().is_err());
    }

    #[test]
    fn test_normalized_rejects_duplicate_sizes() {
        let err = input(vec![size("M", 1000, 1), size("m ", 1200, 1)])
            .normalized()
            .unwrap_err();
        assert_eq!(err, DomainError::Invalid("Duplicate size: m".to_owned()));
    }

    #[test]
    fn test_normalized_rejects_negative_price() {
        let err = input(vec![size("M", -1, 1)]).normalized().unwrap_err();
        assert_eq!(err, DomainError::NegativePrice);
    }

    #[test]
    fn test_normalized_rejects_bad_discount() {
        let mut product = input(vec![size("M", 1000, 1)]);
        product.discount_percent = Some(0);
        assert_eq!(
            product.normalized().unwrap_err(),
            DomainError::DiscountOutOfRange
        );
    }

    #[test]
    fn test_promo_input_without_discount_clears_window() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let window = PromoWindow::from(PromoInput {
            discount_percent: None,
            promo_start: Some(start),
            promo_end: None,
        });
        assert_eq!(window, PromoWindow::default());
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let query = ProductQuery {
            search: Some(" 50%_off ".to_owned()),
            ..ProductQuery::default()
        };
        assert_eq!(query.search_pattern().as_deref(), Some("%50\\%\\_off%"));

        let blank = ProductQuery {
            search: Some("   ".to_owned()),
            ..ProductQuery::default()
        };
        assert_eq!(blank.search_pattern(), None);
    }

    #[test]
    fn test_sort_parses_snake_case() {
        let query: ProductQuery = serde_json::from_str(r#"{"sort":"best_selling"}"#).unwrap();
        assert_eq!(query.sort, ProductSort::BestSelling);
    }

    #[test]
    fn test_view_prices_active_promo() {
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap();
        let row = ProductRow {
            id: ProductId::new(7),
            name: "Tee".to_owned(),
            description: String::new(),
            category_id: CategoryId::new(1),
            type_id: None,
            images: vec![],
            discount_percent: Some(20),
            promo_start: Some(now - chrono::Duration::days(1)),
            promo_end: None,
            rating_average: Decimal::ZERO,
            rating_count: 0,
            sold: 0,
            created_at: now,
            updated_at: now,
        };
        let view = ProductView::build(row, vec![size("S", 1000, 2)], now);
        assert!(view.pricing.is_on_promo);
        assert_eq!(view.pricing.sizes[0].final_price, Decimal::new(800, 2));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["promo_status"], "active");
        assert_eq!(json["total_stock"], 2);
    }
}
