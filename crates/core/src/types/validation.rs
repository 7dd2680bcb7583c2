//! Validated input values.
//!
//! Request bodies carry plain numbers; handlers convert them through these
//! constructors so that an out-of-range value becomes a `400` with a
//! readable message instead of a deserialization failure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A domain rule was violated by caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Price must be greater than or equal to 0")]
    NegativePrice,
    #[error("Stock must be greater than or equal to 0")]
    NegativeStock,
    #[error("Discount must be between 1 and 100")]
    DiscountOutOfRange,
    #[error("Rating must be between 1 and 5")]
    RatingOutOfRange,
    #[error("Quantity must be at least 1")]
    QuantityTooSmall,
    #[error("Promo end date must not be before its start date")]
    PromoWindowInverted,
    #[error("{0}")]
    Invalid(String),
}

/// Validate a unit price.
///
/// # Errors
///
/// Returns `DomainError::NegativePrice` when `price < 0`.
pub fn validate_price(price: Decimal) -> Result<Decimal, DomainError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(DomainError::NegativePrice);
    }
    Ok(price)
}

/// Validate a stock level.
///
/// # Errors
///
/// Returns `DomainError::NegativeStock` when `stock < 0`.
pub const fn validate_stock(stock: i32) -> Result<i32, DomainError> {
    if stock < 0 {
        return Err(DomainError::NegativeStock);
    }
    Ok(stock)
}

/// Promo discount percentage (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiscountPercent(i16);

impl DiscountPercent {
    /// # Errors
    ///
    /// Returns `DomainError::DiscountOutOfRange` outside `1..=100`.
    pub const fn new(value: i16) -> Result<Self, DomainError> {
        if value < 1 || value > 100 {
            return Err(DomainError::DiscountOutOfRange);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }
}

/// Review rating (1-5 stars).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(i16);

impl Rating {
    /// # Errors
    ///
    /// Returns `DomainError::RatingOutOfRange` outside `1..=5`.
    pub const fn new(value: i16) -> Result<Self, DomainError> {
        if value < 1 || value > 5 {
            return Err(DomainError::RatingOutOfRange);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }
}

/// Quantity of a cart or order line (at least 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(i32);

impl Quantity {
    /// # Errors
    ///
    /// Returns `DomainError::QuantityTooSmall` when `value < 1`.
    pub const fn new(value: i32) -> Result<Self, DomainError> {
        if value < 1 {
            return Err(DomainError::QuantityTooSmall);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}
