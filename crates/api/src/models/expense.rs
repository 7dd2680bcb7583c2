//! Back-office expenses.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, ExpenseId};

use super::{optional_text, required_text};

const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub category: String,
    pub amount: Decimal,
    pub spent_on: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseInput {
    pub title: String,
    pub category: Option<String>,
    pub amount: Decimal,
    pub spent_on: NaiveDate,
    pub note: Option<String>,
}

impl ExpenseInput {
    /// # Errors
    ///
    /// Returns a `DomainError` for a blank title or a negative amount.
    pub fn normalized(self) -> Result<Self, DomainError> {
        if self.amount.is_sign_negative() && !self.amount.is_zero() {
            return Err(DomainError::Invalid(
                "Amount must be greater than or equal to 0".to_owned(),
            ));
        }
        Ok(Self {
            title: required_text(&self.title, "Title")?,
            category: Some(
                optional_text(self.category.as_deref())
                    .map_or_else(|| DEFAULT_CATEGORY.to_owned(), |c| c.to_lowercase()),
            ),
            note: optional_text(self.note.as_deref()),
            ..self
        })
    }

    /// Category after normalization.
    #[must_use]
    pub fn category(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Inclusive `spent_on` range filter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ExpenseQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl ExpenseQuery {
    /// # Errors
    ///
    /// Returns `DomainError::Invalid` when `from` is after `to`.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let (Some(from), Some(to)) = (self.from, self.to)
            && from > to
        {
            return Err(DomainError::Invalid(
                "`from` must not be after `to`".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(amount: Decimal) -> ExpenseInput {
        ExpenseInput {
            title: " Warehouse rent ".to_owned(),
            category: Some(" Rent ".to_owned()),
            amount,
            spent_on: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            note: Some(String::new()),
        }
    }

    #[test]
    fn test_expense_normalized() {
        let expense = input(Decimal::new(120_000, 2)).normalized().unwrap();
        assert_eq!(expense.title, "Warehouse rent");
        assert_eq!(expense.category(), "rent");
        assert_eq!(expense.note, None);
    }

    #[test]
    fn test_expense_default_category() {
        let mut raw = input(Decimal::ZERO);
        raw.category = None;
        assert_eq!(raw.normalized().unwrap().category(), "other");
    }

    #[test]
    fn test_expense_rejects_negative_amount() {
        assert!(input(Decimal::new(-1, 2)).normalized().is_err());
    }

    #[test]
    fn test_expense_query_range() {
        let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        let ok = ExpenseQuery {
            from: Some(day(1)),
            to: Some(day(1)),
        };
        assert!(ok.validate().is_ok());
        let inverted = ExpenseQuery {
            from: Some(day(2)),
            to: Some(day(1)),
        };
        assert!(inverted.validate().is_err());
    }
}
