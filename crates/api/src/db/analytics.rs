//! Aggregate queries for the admin dashboard.
//!
//! Revenue only counts `delivered` orders. Timestamp windows are half-open,
//! `[from, to)`. Expenses are dated, so their window is the whole days
//! `(from::date, to::date]` and a window ending now includes today.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::analytics::{MonthBucket, PeriodTotals, StatusCount, TopProduct};

pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Revenue, order count, new customers and expenses for a window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn period_totals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PeriodTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, PeriodTotals>(
            "SELECT
                 (SELECT COALESCE(SUM(total), 0) FROM orders
                   WHERE status = 'delivered' AND created_at >= $1 AND created_at < $2) AS revenue,
                 (SELECT COUNT(*) FROM orders
                   WHERE created_at >= $1 AND created_at < $2) AS orders,
                 (SELECT COUNT(*) FROM users
                   WHERE role = 'customer' AND created_at >= $1 AND created_at < $2) AS customers,
                 (SELECT COALESCE(SUM(amount), 0) FROM expenses
                   WHERE spent_on > $1::date AND spent_on <= $2::date) AS expenses",
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.pool)
        .await?;
        Ok(totals)
    }

    /// Order counts per status for orders created in a window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_status(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StatusCount>, RepositoryError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM orders
             WHERE created_at >= $1 AND created_at < $2
             GROUP BY status",
        )
        .bind(from)
        .bind(to)
        .fetch_all(self.pool)
        .await?;
        Ok(counts)
    }

    /// Delivered revenue and order count per month of `year` (UTC).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_revenue(&self, year: i32) -> Result<Vec<MonthBucket>, RepositoryError> {
        let buckets = sqlx::query_as::<_, MonthBucket>(
            "SELECT EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int AS month,
                    COALESCE(SUM(total), 0) AS revenue,
                    COUNT(*) AS orders
             FROM orders
             WHERE status = 'delivered'
               AND EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int = $1
             GROUP BY month
             ORDER BY month",
        )
        .bind(year)
        .fetch_all(self.pool)
        .await?;
        Ok(buckets)
    }

    /// Best sellers by units sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProduct>, RepositoryError> {
        let products = sqlx::query_as::<_, TopProduct>(
            "SELECT id, name, images[1] AS image, sold, rating_average
             FROM products
             WHERE sold > 0
             ORDER BY sold DESC, id
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }
}
