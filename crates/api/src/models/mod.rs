//! Domain models for the API.
//!
//! Row types derive `sqlx::FromRow` and `Serialize` so they can be returned
//! directly; request bodies live next to the type they create.

pub mod address;
pub mod analytics;
pub mod cart;
pub mod catalog;
pub mod comment;
pub mod expense;
pub mod notification;
pub mod order;
pub mod product;
pub mod review;
pub mod session;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::db::Pagination;

pub use session::{CurrentUser, keys as session_keys};

/// Common `?page=&per_page=` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl PageQuery {
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

/// A page of results with the total row count.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        Self {
            data,
            total,
            page: pagination.page,
            per_page: pagination.per_page,
        }
    }
}

/// Trim a required text field, rejecting blanks.
pub(crate) fn required_text(value: &str, field: &str) -> Result<String, bazaar_core::DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bazaar_core::DomainError::Invalid(format!("{field} is required")));
    }
    Ok(trimmed.to_owned())
}

/// Trim an optional text field, mapping blanks to `None`.
pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
