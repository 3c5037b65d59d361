//! Business logic services for storefront.
//!
//! - `auth` - Email, phone OTP and registration sign-in (mock or remote API)
//! - `visitor` - Cart, wishlist and checkout state kept in the session

pub mod auth;
pub mod visitor;
