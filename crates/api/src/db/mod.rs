//! Database operations for the Bazaar `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users`, `addresses` - Accounts and shipping addresses
//! - `categories`, `product_types` - Catalog taxonomy
//! - `products`, `product_sizes` - Catalog with price and stock per size
//! - `cart_items`, `wishlist_items` - Per-user shopping state
//! - `orders` - Orders with item and address snapshots (JSONB)
//! - `reviews`, `comments`, `comment_reactions` - Product feedback
//! - `expenses`, `notifications` - Back office and user inbox
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```
//!
//! Queries are checked at runtime (`sqlx::query_as` + `FromRow`) so the
//! workspace builds without a live database.

pub mod addresses;
pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod comments;
pub mod expenses;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;
pub mod wishlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use analytics::AnalyticsRepository;
pub use cart::CartRepository;
pub use catalog::CatalogRepository;
pub use comments::CommentRepository;
pub use expenses::ExpenseRepository;
pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;
pub use wishlist::WishlistRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique or foreign-key violation to `Conflict`, anything else to `Database`.
    pub(crate) fn from_constraint(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Limit/offset pair for paginated queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: u32 = 20;
    pub const MAX_PER_PAGE: u32 = 100;

    /// Normalize raw query values: page starts at 1, `per_page` is clamped to `1..=100`.
    #[must_use]
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page
                .unwrap_or(Self::DEFAULT_PER_PAGE)
                .clamp(1, Self::MAX_PER_PAGE),
        }
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let p = Pagination::new(None, None);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 20);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::new(Some(0), Some(1000));
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);

        let p = Pagination::new(Some(3), Some(0));
        assert_eq!(p.per_page, 1);
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn test_pagination_offset() {
        let p = Pagination::new(Some(4), Some(25));
        assert_eq!(p.limit(), 25);
        assert_eq!(p.offset(), 75);
    }
}
