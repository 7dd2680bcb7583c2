//! Admin dashboard aggregates.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{OrderStatus, ProductId, percentage_change};

/// Reporting window for the summary endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalyticsRange {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "365d")]
    Year,
}

impl AnalyticsRange {
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
            Self::Quarter => 90,
            Self::Year => 365,
        }
    }

    /// `(previous_start, current_start, end)` for a window ending at `now`.
    #[must_use]
    pub fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>, DateTime<Utc>) {
        let span = Duration::days(self.days());
        let current_start = now - span;
        (current_start - span, current_start, now)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub range: AnalyticsRange,
}

/// Raw totals for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct PeriodTotals {
    pub revenue: Decimal,
    pub orders: i64,
    pub customers: i64,
    pub expenses: Decimal,
}

impl PeriodTotals {
    #[must_use]
    pub fn profit(&self) -> Decimal {
        self.revenue - self.expenses
    }
}

/// A metric for the current period and its change versus the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub value: Decimal,
    pub previous: Decimal,
    pub change_percent: Decimal,
}

impl Metric {
    #[must_use]
    pub fn new(value: Decimal, previous: Decimal) -> Self {
        Self {
            value,
            previous,
            change_percent: percentage_change(value, previous),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub range: AnalyticsRange,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub revenue: Metric,
    pub orders: Metric,
    pub customers: Metric,
    pub expenses: Metric,
    pub profit: Metric,
    pub orders_by_status: Vec<StatusCount>,
}

impl AnalyticsSummary {
    /// Compare two periods. `orders_by_status` is padded with zero counts.
    #[must_use]
    pub fn from_periods(
        range: AnalyticsRange,
        window: (DateTime<Utc>, DateTime<Utc>),
        current: PeriodTotals,
        previous: PeriodTotals,
        orders_by_status: &[StatusCount],
    ) -> Self {
        let orders_by_status = OrderStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: orders_by_status
                    .iter()
                    .find(|c| c.status == status)
                    .map_or(0, |c| c.count),
            })
            .collect();

        Self {
            range,
            from: window.0,
            to: window.1,
            revenue: Metric::new(current.revenue, previous.revenue),
            orders: Metric::new(current.orders.into(), previous.orders.into()),
            customers: Metric::new(current.customers.into(), previous.customers.into()),
            expenses: Metric::new(current.expenses, previous.expenses),
            profit: Metric::new(current.profit(), previous.profit()),
            orders_by_status,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RevenueQuery {
    pub year: Option<i32>,
}

/// A month's bucket as returned by the database (`month` is 1-12).
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct MonthBucket {
    pub month: i32,
    pub revenue: Decimal,
    pub orders: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub month: u32,
    pub revenue: Decimal,
    pub orders: i64,
}

/// Expand sparse buckets into all twelve months.
#[must_use]
pub fn fill_months(buckets: &[MonthBucket]) -> Vec<MonthlyRevenue> {
    (1..=12_u32)
        .map(|month| {
            let bucket = buckets
                .iter()
                .find(|b| u32::try_from(b.month).is_ok_and(|m| m == month));
            MonthlyRevenue {
                month,
                revenue: bucket.map_or(Decimal::ZERO, |b| b.revenue),
                orders: bucket.map_or(0, |b| b.orders),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TopProductsQuery {
    pub limit: Option<u32>,
}

impl TopProductsQuery {
    pub const DEFAULT_LIMIT: u32 = 5;
    pub const MAX_LIMIT: u32 = 50;

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(
            self.limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        )
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub sold: i32,
    pub rating_average: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_range_parses_and_bounds() {
        let query: SummaryQuery = serde_json::from_str(r#"{"range":"7d"}"#).unwrap();
        assert_eq!(query.range, AnalyticsRange::Week);
        assert!(serde_json::from_str::<SummaryQuery>(r#"{"range":"14d"}"#).is_err());

        let now = Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap();
        let (prev, start, end) = AnalyticsRange::Week.bounds(now);
        assert_eq!(end, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap());
        assert_eq!(prev, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_summary_compares_periods() {
        let current = PeriodTotals {
            revenue: Decimal::new(150, 0),
            orders: 3,
            customers: 0,
            expenses: Decimal::new(50, 0),
        };
        let previous = PeriodTotals {
            revenue: Decimal::new(100, 0),
            orders: 0,
            customers: 0,
            expenses: Decimal::new(50, 0),
        };
        let now = Utc::now();
        let summary = AnalyticsSummary::from_periods(
            AnalyticsRange::Month,
            (now, now),
            current,
            previous,
            &[StatusCount {
                status: OrderStatus::Delivered,
                count: 2,
            }],
        );

        assert_eq!(summary.revenue.change_percent, Decimal::new(50, 0));
        assert_eq!(summary.orders.change_percent, Decimal::ONE_HUNDRED);
        assert_eq!(summary.customers.change_percent, Decimal::ZERO);
        assert_eq!(summary.profit.value, Decimal::new(100, 0));
        assert_eq!(summary.profit.change_percent, Decimal::ONE_HUNDRED);
        assert_eq!(summary.orders_by_status.len(), 3);
        assert_eq!(summary.orders_by_status[0].count, 0);
        assert_eq!(summary.orders_by_status[2].count, 2);
    }

    #[test]
    fn test_fill_months_pads_missing() {
        let months = fill_months(&[
            MonthBucket {
                month: 2,
                revenue: Decimal::new(10, 0),
                orders: 1,
            },
            MonthBucket {
                month: 12,
                revenue: Decimal::new(5, 0),
                orders: 2,
            },
        ]);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].revenue, Decimal::ZERO);
        assert_eq!(months[1].orders, 1);
        assert_eq!(months[11].revenue, Decimal::new(5, 0));
    }

    #[test]
    fn test_top_products_limit_clamped() {
        assert_eq!(TopProductsQuery { limit: None }.limit(), 5);
        assert_eq!(TopProductsQuery { limit: Some(0) }.limit(), 1);
        assert_eq!(TopProductsQuery { limit: Some(500) }.limit(), 50);
    }
}
