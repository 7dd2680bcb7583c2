//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and password changes (argon2)
//! - `cart` - Cart lines with stock checks
//! - `orders` - Checkout transaction and status lifecycle
//! - `analytics` - Dashboard aggregates with a cached summary

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod orders;
