//! Visitor state kept in the session, and the cart summary built from it.
//!
//! The session only stores product ids, quantities and the coupon code.
//! Prices, stock and discounts are recomputed against the store on every
//! read so a price change in the admin shows up immediately.

use chrono::{DateTime, Utc};
use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;
use ttd_core::cart::{Cart, CartItem};
use ttd_core::coupon::apply_coupon;
use ttd_core::pricing::CartTotals;
use ttd_core::wishlist::Wishlist;
use ttd_core::{Price, Theme};
use ttd_store::{Store, StoreError};

use crate::models::session::{CheckoutDraft, keys};

/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn cart(session: &Session) -> Result<Cart, SessionError> {
    Ok(session.get(keys::CART).await?.unwrap_or_default())
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), SessionError> {
    session.insert(keys::CART, cart).await
}

/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn wishlist(session: &Session) -> Result<Wishlist, SessionError> {
    Ok(session.get(keys::WISHLIST).await?.unwrap_or_default())
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_wishlist(session: &Session, wishlist: &Wishlist) -> Result<(), SessionError> {
    session.insert(keys::WISHLIST, wishlist).await
}

/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn theme(session: &Session) -> Result<Theme, SessionError> {
    Ok(session.get(keys::THEME).await?.unwrap_or_default())
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_theme(session: &Session, theme: Theme) -> Result<(), SessionError> {
    session.insert(keys::THEME, theme).await
}

/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn checkout_draft(session: &Session) -> Result<CheckoutDraft, SessionError> {
    Ok(session.get(keys::CHECKOUT).await?.unwrap_or_default())
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_checkout_draft(session: &Session, draft: &CheckoutDraft) -> Result<(), SessionError> {
    session.insert(keys::CHECKOUT, draft).await
}

/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_checkout_draft(session: &Session) -> Result<(), SessionError> {
    session.remove::<CheckoutDraft>(keys::CHECKOUT).await?;
    Ok(())
}

/// A cart resolved and priced against the current catalog.
#[derive(Debug, Clone)]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    pub totals: CartTotals,
    /// The coupon code currently giving a discount.
    pub coupon_code: Option<String>,
    /// Set when a previously applied coupon stopped qualifying and was removed.
    pub coupon_notice: Option<String>,
    pub free_delivery_shortfall: Option<Price>,
}

impl CartSummary {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether every line can be fulfilled from current stock.
    #[must_use]
    pub fn all_available(&self) -> bool {
        self.items.iter().all(CartItem::is_available)
    }
}

/// Resolve `cart` against the store and price it.
///
/// Lines for deleted products are dropped and quantities re-clamped, and a
/// coupon that no longer qualifies is removed, so callers should save the
/// cart back to the session afterwards.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub async fn summarize(
    store: &Store,
    cart: &mut Cart,
    shipping_state: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CartSummary, StoreError> {
    store
        .read(|data| {
            let items = cart.resolve(&data.products);
            let subtotal: Price = items.iter().map(CartItem::line_total).sum();

            let mut coupon_notice = None;
            let mut discount = Price::ZERO;
            if let Some(code) = cart.coupon_code.clone() {
                match apply_coupon(&data.coupons, &code, subtotal, now) {
                    Ok(applied) => discount = applied.discount,
                    Err(err) => {
                        cart.remove_coupon();
                        coupon_notice = Some(format!("Coupon {code} was removed: {err}"));
                    }
                }
            }

            let pricing = &data.settings.pricing;
            CartSummary {
                totals: pricing.totals(&items, discount, shipping_state),
                free_delivery_shortfall: pricing.free_delivery_shortfall(subtotal),
                coupon_code: cart.coupon_code.clone(),
                coupon_notice,
                items,
            }
        })
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;
    use ttd_core::ProductId;
    use ttd_store::seed::seed_data;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_cart_defaults_to_empty_and_round_trips() {
        let session = session();
        let mut cart = cart(&session).await.unwrap();
        assert!(cart.is_empty());

        let store = Store::in_memory(seed_data(Utc::now()));
        let product = store
            .read(|d| d.product(ProductId::new(5)).cloned())
            .await
            .unwrap()
            .unwrap();
        cart.add(&product, 2).unwrap();
        save_cart(&session, &cart).await.unwrap();

        assert_eq!(super::cart(&session).await.unwrap().item_count(), 2);
    }

    #[tokio::test]
    async fn test_summary_prices_cart() {
        let now = Utc::now();
        let store = Store::in_memory(seed_data(now));
        let product = store
            .read(|d| d.product(ProductId::new(5)).cloned())
            .await
            .unwrap()
            .unwrap();
        let mut cart = Cart::default();
        cart.add(&product, 2).unwrap();

        let summary = summarize(&store, &mut cart, None, now).await.unwrap();
        // 2 x 1,299 = 2,598; GST 468; free delivery.
        assert_eq!(summary.totals.subtotal, Price::from_rupees(2_598));
        assert_eq!(summary.totals.gst.total_gst, Price::from_rupees(468));
        assert_eq!(summary.totals.delivery_charge, Price::ZERO);
        assert_eq!(summary.totals.total, Price::from_rupees(3_066));
        assert!(summary.free_delivery_shortfall.is_none());
        assert!(summary.all_available());
    }

    #[tokio::test]
    async fn test_summary_drops_coupon_that_no_longer_qualifies() {
        let now = Utc::now();
        let store = Store::in_memory(seed_data(now));
        let face_wash = store
            .read(|d| d.product(ProductId::new(18)).cloned())
            .await
            .unwrap()
            .unwrap();
        let mut cart = Cart::default();
        cart.add(&face_wash, 1).unwrap();
        cart.set_coupon("SAVE10");

        let summary = summarize(&store, &mut cart, None, now).await.unwrap();
        assert!(summary.coupon_code.is_none());
        assert!(summary.coupon_notice.is_some());
        assert_eq!(summary.totals.discount, Price::ZERO);
        assert_eq!(summary.free_delivery_shortfall, Some(Price::from_rupees(251)));
        assert!(cart.coupon_code.is_none());
    }
}
