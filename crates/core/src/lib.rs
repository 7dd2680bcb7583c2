//! Bazaar Core - Shared domain types and pricing rules.
//!
//! This crate provides the types and pure business rules used across all
//! Bazaar components:
//! - `api` - REST backend consumed by the admin dashboard and mobile app
//! - `cli` - Command-line tools for migrations, seeding and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and functions - no I/O, no database
//! access, no HTTP. Database encoding for the ID and enum types is available
//! behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, statuses and validated inputs
//! - [`pricing`] - Promo status, final price and percentage arithmetic

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{
    PricedProduct, PricedSize, PromoStatus, PromoWindow, SizePrice, attach_final_price,
    calculate_product_status, final_price, percentage_change, round_money,
};
pub use types::*;
