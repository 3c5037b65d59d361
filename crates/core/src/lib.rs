//! TTD Core - shared domain library.
//!
//! This crate provides the types and pure logic used across all TTD shop
//! components:
//! - `ttd-store` - Seeded data store persisted to a JSON snapshot
//! - `ttd-storefront` - Public-facing e-commerce site
//! - `ttd-admin` - Back office for products, orders and customers
//! - `ttd-cli` - Command-line maintenance tools
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP,
//! no global state. Pricing, coupon and filtering rules live here so that
//! both web applications compute identical numbers.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, rupee prices, emails and status enums
//! - [`catalog`] - Products, categories and the listing filter pipeline
//! - [`cart`] / [`wishlist`] - Visitor baskets
//! - [`pricing`] - GST, delivery fee and cart totals
//! - [`coupon`] - Coupon validation and discounts
//! - [`address`] / [`user`] - Customer accounts and their forms
//! - [`order`] - Orders, status transitions and history queries
//! - [`stats`] - Dashboard aggregates
//! - [`validation`] - Field validators and [`validation::FieldErrors`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod format;
pub mod order;
pub mod pricing;
pub mod stats;
pub mod types;
pub mod user;
pub mod validation;
pub mod wishlist;

pub use types::*;
