//! Dashboard analytics with a short-lived summary cache.

use std::time::Duration;

use chrono::{DateTime, Datelike, Utc};
use moka::future::Cache;
use sqlx::PgPool;

use crate::db::{AnalyticsRepository, RepositoryError};
use crate::models::analytics::{
    AnalyticsRange, AnalyticsSummary, MonthlyRevenue, TopProduct, fill_months,
};

/// How long a computed summary is served from cache.
pub const SUMMARY_TTL: Duration = Duration::from_secs(60);

/// Summary cache keyed by range.
pub type SummaryCache = Cache<AnalyticsRange, AnalyticsSummary>;

#[must_use]
pub fn summary_cache() -> SummaryCache {
    Cache::builder()
        .max_capacity(16)
        .time_to_live(SUMMARY_TTL)
        .build()
}

pub struct AnalyticsService<'a> {
    analytics: AnalyticsRepository<'a>,
    cache: &'a SummaryCache,
}

impl<'a> AnalyticsService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a SummaryCache) -> Self {
        Self {
            analytics: AnalyticsRepository::new(pool),
            cache,
        }
    }

    /// Summary for the window ending at `now`, compared with the window
    /// before it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(
        &self,
        range: AnalyticsRange,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSummary, RepositoryError> {
        if let Some(cached) = self.cache.get(&range).await {
            return Ok(cached);
        }

        let (previous_start, current_start, end) = range.bounds(now);
        let current = self.analytics.period_totals(current_start, end).await?;
        let previous = self
            .analytics
            .period_totals(previous_start, current_start)
            .await?;
        let by_status = self.analytics.orders_by_status(current_start, end).await?;

        let summary = AnalyticsSummary::from_periods(
            range,
            (current_start, end),
            current,
            previous,
            &by_status,
        );
        self.cache.insert(range, summary.clone()).await;
        Ok(summary)
    }

    /// Twelve monthly buckets for `year` (defaults to the current year).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_revenue(
        &self,
        year: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<(i32, Vec<MonthlyRevenue>), RepositoryError> {
        let year = year.unwrap_or_else(|| now.year());
        let buckets = self.analytics.monthly_revenue(year).await?;
        Ok((year, fill_months(&buckets)))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_products(&self, limit: i64) -> Result<Vec<TopProduct>, RepositoryError> {
        self.analytics.top_products(limit).await
    }
}
