//! Repositories over the [`Store`](crate::Store).
//!
//! Each repository borrows the store and exposes the operations one area of
//! the application needs. Reads return owned copies; writes go through
//! [`Store::write`](crate::Store::write) so they are persisted.

mod coupons;
mod customers;
mod orders;
mod products;
mod settings;

pub use coupons::CouponRepository;
pub use customers::CustomerRepository;
pub use orders::{CheckoutError, OrderRepository, PlaceOrder};
pub use products::{ProductDraft, ProductRepository};
pub use settings::SettingsRepository;
