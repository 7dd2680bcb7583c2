//! Product pricing and promo rules.
//!
//! A product has one price per size and an optional promo: a discount
//! percentage that applies only inside its `[starts_at, ends_at]` window.
//! Either bound may be missing, in which case that side of the window is
//! open. All money values are rounded to two decimal places with midpoint
//! values rounded away from zero.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{DiscountPercent, DomainError, validate_price, validate_stock};

/// Promo configuration stored on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromoWindow {
    /// Discount in percent (1-100); `None` means the product has no promo.
    pub discount_percent: Option<i16>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl PromoWindow {
    /// Check the discount range and window ordering.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DiscountOutOfRange` or
    /// `DomainError::PromoWindowInverted`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(discount) = self.discount_percent {
            DiscountPercent::new(discount)?;
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at)
            && end < start
        {
            return Err(DomainError::PromoWindowInverted);
        }
        Ok(())
    }
}

/// Where a product's promo stands relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromoStatus {
    /// No discount configured.
    None,
    /// Discount configured, window not started.
    Scheduled,
    /// Discount applies now.
    Active,
    /// Window has ended.
    Expired,
}

/// Compute the promo status of a product at `now`.
///
/// Both window bounds are inclusive.
#[must_use]
pub fn calculate_product_status(promo: &PromoWindow, now: DateTime<Utc>) -> PromoStatus {
    if promo.discount_percent.is_none() {
        return PromoStatus::None;
    }
    if promo.starts_at.is_some_and(|start| now < start) {
        return PromoStatus::Scheduled;
    }
    if promo.ends_at.is_some_and(|end| now > end) {
        return PromoStatus::Expired;
    }
    PromoStatus::Active
}

/// Round a money amount to cents, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price a customer pays for one unit.
///
/// The discount is applied only while `status` is [`PromoStatus::Active`].
#[must_use]
pub fn final_price(price: Decimal, promo: &PromoWindow, status: PromoStatus) -> Decimal {
    match (status, promo.discount_percent) {
        (PromoStatus::Active, Some(discount)) => {
            let remaining = Decimal::from(100 - i32::from(discount.clamp(0, 100)));
            round_money(price * remaining / Decimal::ONE_HUNDRED)
        }
        _ => round_money(price),
    }
}

/// One size of a product as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePrice {
    pub size: String,
    pub price: Decimal,
    pub stock: i32,
}

impl SizePrice {
    /// # Errors
    ///
    /// Returns a `DomainError` for an empty label, a negative price or
    /// negative stock.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.size.trim().is_empty() {
            return Err(DomainError::Invalid("Size label is required".to_owned()));
        }
        validate_price(self.price)?;
        validate_stock(self.stock)?;
        Ok(())
    }
}

/// One size of a product with its effective price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedSize {
    pub size: String,
    pub price: Decimal,
    pub final_price: Decimal,
    pub stock: i32,
}

/// Pricing fields attached to a product before it is returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricedProduct {
    pub promo_status: PromoStatus,
    pub is_on_promo: bool,
    pub discount_percent: Option<i16>,
    pub sizes: Vec<PricedSize>,
    pub min_price: Option<Decimal>,
    pub min_final_price: Option<Decimal>,
    pub total_stock: i64,
    pub in_stock: bool,
}

/// Compute promo status and per-size final prices for a product.
#[must_use]
pub fn attach_final_price(
    promo: &PromoWindow,
    sizes: &[SizePrice],
    now: DateTime<Utc>,
) -> PricedProduct {
    let status = calculate_product_status(promo, now);

    let sizes: Vec<PricedSize> = sizes
        .iter()
        .map(|s| PricedSize {
            size: s.size.clone(),
            price: round_money(s.price),
            final_price: final_price(s.price, promo, status),
            stock: s.stock,
        })
        .collect();

    let min_price = sizes.iter().map(|s| s.price).min();
    let min_final_price = sizes.iter().map(|s| s.final_price).min();
    let total_stock: i64 = sizes.iter().map(|s| i64::from(s.stock.max(0))).sum();

    PricedProduct {
        promo_status: status,
        is_on_promo: status == PromoStatus::Active,
        discount_percent: promo.discount_percent,
        sizes,
        min_price,
        min_final_price,
        total_stock,
        in_stock: total_stock > 0,
    }
}

/// Relative change between two period totals, in percent (1 dp).
///
/// With no previous value the change is reported as `100` when something
/// happened in the current period and `0` otherwise.
#[must_use]
pub fn percentage_change(current: Decimal, previous: Decimal) -> Decimal {
    if previous.is_zero() {
        return if current > Decimal::ZERO {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
    }
    ((current - previous) / previous.abs() * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap()
    }

    fn promo(discount: i16, start: Option<u32>, end: Option<u32>) -> PromoWindow {
        PromoWindow {
            discount_percent: Some(discount),
            starts_at: start.map(at),
            ends_at: end.map(at),
        }
    }

    fn size(label: &str, cents: i64, stock: i32) -> SizePrice {
        SizePrice {
            size: label.to_owned(),
            price: Decimal::new(cents, 2),
            stock,
        }
    }

    #[test]
    fn test_status_without_discount_is_none() {
        let window = PromoWindow {
            discount_percent: None,
            starts_at: Some(at(1)),
            ends_at: Some(at(30)),
        };
        assert_eq!(calculate_product_status(&window, at(10)), PromoStatus::None);
    }

    #[test]
    fn test_status_follows_window() {
        let window = promo(20, Some(5), Some(10));
        assert_eq!(calculate_product_status(&window, at(4)), PromoStatus::Scheduled);
        assert_eq!(calculate_product_status(&window, at(5)), PromoStatus::Active);
        assert_eq!(calculate_product_status(&window, at(10)), PromoStatus::Active);
        assert_eq!(
            calculate_product_status(&window, at(10) + Duration::seconds(1)),
            PromoStatus::Expired
        );
    }

    #[test]
    fn test_status_open_bounds() {
        assert_eq!(
            calculate_product_status(&promo(10, None, Some(10)), at(1)),
            PromoStatus::Active
        );
        assert_eq!(
            calculate_product_status(&promo(10, Some(10), None), at(28)),
            PromoStatus::Active
        );
        assert_eq!(
            calculate_product_status(&promo(10, None, None), at(28)),
            PromoStatus::Active
        );
    }

    #[test]
    fn test_final_price_applies_only_when_active() {
        let window = promo(15, Some(5), Some(10));
        let price = Decimal::new(1999, 2);
        assert_eq!(
            final_price(price, &window, PromoStatus::Active),
            Decimal::new(1699, 2)
        );
        assert_eq!(final_price(price, &window, PromoStatus::Scheduled), price);
        assert_eq!(final_price(price, &window, PromoStatus::Expired), price);
    }

    #[test]
    fn test_final_price_rounds_midpoint_away_from_zero() {
        let window = promo(50, None, None);
        assert_eq!(
            final_price(Decimal::new(5, 2), &window, PromoStatus::Active),
            Decimal::new(3, 2)
        );
    }

    #[test]
    fn test_full_discount_is_free() {
        let window = promo(100, None, None);
        assert_eq!(
            final_price(Decimal::new(4500, 2), &window, PromoStatus::Active),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_attach_final_price_aggregates_sizes() {
        let window = promo(10, Some(1), Some(20));
        let priced = attach_final_price(
            &window,
            &[size("M", 20000, 3), size("S", 18000, 0), size("L", 22000, 2)],
            at(10),
        );

        assert!(priced.is_on_promo);
        assert_eq!(priced.promo_status, PromoStatus::Active);
        assert_eq!(priced.min_price, Some(Decimal::new(18000, 2)));
        assert_eq!(priced.min_final_price, Some(Decimal::new(16200, 2)));
        assert_eq!(priced.total_stock, 5);
        assert!(priced.in_stock);
        assert_eq!(priced.sizes[2].final_price, Decimal::new(19800, 2));
    }

    #[test]
    fn test_attach_final_price_outside_window_keeps_base_prices() {
        let window = promo(10, Some(1), Some(2));
        let priced = attach_final_price(&window, &[size("One", 5000, 0)], at(15));
        assert!(!priced.is_on_promo);
        assert_eq!(priced.promo_status, PromoStatus::Expired);
        assert_eq!(priced.sizes[0].final_price, Decimal::new(5000, 2));
        assert!(!priced.in_stock);
    }

    #[test]
    fn test_attach_final_price_without_sizes() {
        let priced = attach_final_price(&PromoWindow::default(), &[], at(1));
        assert_eq!(priced.min_price, None);
        assert_eq!(priced.total_stock, 0);
        assert!(!priced.in_stock);
    }

    #[test]
    fn test_promo_window_validation() {
        assert!(promo(10, Some(1), Some(2)).validate().is_ok());
        assert!(PromoWindow::default().validate().is_ok());
        assert_eq!(
            promo(10, Some(5), Some(2)).validate(),
            Err(DomainError::PromoWindowInverted)
        );
        assert_eq!(
            promo(0, None, None).validate(),
            Err(DomainError::DiscountOutOfRange)
        );
    }

    #[test]
    fn test_size_validation() {
        assert!(size("M", 100, 1).validate().is_ok());
        assert!(size(" ", 100, 1).validate().is_err());
        assert_eq!(
            size("M", -100, 1).validate(),
            Err(DomainError::NegativePrice)
        );
        assert_eq!(size("M", 100, -1).validate(), Err(DomainError::NegativeStock));
    }

    #[test]
    fn test_percentage_change() {
        assert_eq!(
            percentage_change(Decimal::new(150, 0), Decimal::new(100, 0)),
            Decimal::new(500, 1)
        );
        assert_eq!(
            percentage_change(Decimal::new(50, 0), Decimal::new(200, 0)),
            Decimal::new(-750, 1)
        );
        assert_eq!(
            percentage_change(Decimal::new(1, 0), Decimal::new(3, 0)),
            Decimal::new(-667, 1)
        );
    }

    #[test]
    fn test_percentage_change_from_zero() {
        assert_eq!(
            percentage_change(Decimal::new(10, 0), Decimal::ZERO),
            Decimal::ONE_HUNDRED
        );
        assert_eq!(percentage_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }
}
