//! Core types for Bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod status;
pub mod validation;

pub use email::{Email, EmailError};
pub use id::*;
pub use status::*;
pub use validation::{DiscountPercent, DomainError, Quantity, Rating, validate_price, validate_stock};
