//! HTTP route handlers for the storefront.
//!
//! Every mutation is a plain form post that answers with a redirect; the
//! outcome is reported through a toast on the next page.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                               - Home page
//! GET  /health                         - Health check
//! POST /theme                          - Toggle light/dark theme
//!
//! # Products
//! GET  /products                       - Listing (search, filters, sort, page)
//! GET  /products/{slug}                - Product detail (?pincode= delivery check)
//!
//! # Cart
//! GET  /cart                           - Cart page
//! POST /cart/add                       - Add to cart (buy_now=1 goes to checkout)
//! POST /cart/update                    - Change a line quantity
//! POST /cart/remove                    - Remove a line
//! POST /cart/clear                     - Empty the cart
//! POST /cart/coupon                    - Apply a coupon code
//! POST /cart/coupon/remove             - Remove the coupon
//!
//! # Wishlist
//! GET  /wishlist                       - Wishlist page
//! POST /wishlist/toggle                - Add or remove a product
//! POST /wishlist/remove                - Remove a product
//! POST /wishlist/move-to-cart          - Move a product to the cart
//! POST /wishlist/clear                 - Empty the wishlist
//!
//! # Checkout (requires auth)
//! GET  /checkout                       - Resume at the first incomplete step
//! GET  /checkout/address               - Step 1: delivery address
//! POST /checkout/address               - Choose a saved address
//! POST /checkout/address/new           - Add an address inline
//! GET  /checkout/payment               - Step 2: payment method
//! POST /checkout/payment               - Choose a payment method
//! GET  /checkout/review                - Step 3: review
//! POST /checkout/place                 - Place the order
//! GET  /orders/{id}/success            - Order confirmation
//!
//! # Auth (posts are rate limited per client IP)
//! GET  /auth/login                     - Login page (?redirect=, ?method=phone)
//! POST /auth/login                     - Email + password sign-in
//! POST /auth/otp/send                  - Send a one-time code
//! POST /auth/otp/verify                - Verify a one-time code
//! GET  /auth/register                  - Registration page
//! POST /auth/register                  - Create an account
//! POST /auth/logout                    - Sign out
//!
//! # Account (requires auth)
//! GET  /account                        - Overview
//! GET  /account/orders                 - Order history (?q=, ?status=, ?sort=)
//! GET  /account/orders/{id}            - Order detail
//! POST /account/orders/{id}/cancel     - Cancel an order
//! GET  /account/addresses              - Address book
//! GET  /account/addresses/new          - New address form
//! POST /account/addresses              - Create an address
//! GET  /account/addresses/{id}/edit    - Edit address form
//! POST /account/addresses/{id}         - Update an address
//! POST /account/addresses/{id}/delete  - Delete an address
//! POST /account/addresses/{id}/default - Make an address the default
//! GET  /account/payments               - Saved cards and UPI ids
//! POST /account/payments/cards         - Save a card
//! POST /account/payments/upi           - Save a UPI id
//! POST /account/payments/{id}/default  - Make a payment method the default
//! POST /account/payments/{id}/delete   - Delete a payment method
//! GET  /account/settings               - Profile, password, notifications
//! POST /account/settings/profile       - Update profile
//! POST /account/settings/password      - Change password
//! POST /account/settings/notifications - Update notification preferences
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod theme;
pub mod wishlist;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;

use crate::middleware::{auth::safe_redirect, auth_rate_limiter};
use crate::state::AppState;

/// Hidden `next` field carried by forms that return to the page they were
/// posted from.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    pub next: Option<String>,
}

/// Redirect to `next` when it is a local path, else to `fallback`.
pub(crate) fn back_to(next: Option<&str>, fallback: &str) -> Redirect {
    match next {
        Some(_) => Redirect::to(safe_redirect(next)),
        None => Redirect::to(fallback),
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/coupon", post(cart::apply_coupon))
        .route("/coupon/remove", post(cart::remove_coupon))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
        .route("/remove", post(wishlist::remove))
        .route("/move-to-cart", post(wishlist::move_to_cart))
        .route("/clear", post(wishlist::clear))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::start))
        .route(
            "/address",
            get(checkout::address_step).post(checkout::choose_address),
        )
        .route("/address/new", post(checkout::add_address))
        .route(
            "/payment",
            get(checkout::payment_step).post(checkout::choose_payment),
        )
        .route("/review", get(checkout::review_step))
        .route("/place", post(checkout::place_order))
}

/// Create the auth routes router.
///
/// Only the credential posts sit behind the rate limiter; one limiter is
/// shared by all of them.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/otp/send", post(auth::send_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/register", post(auth::register))
        .route_layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::overview))
        .route("/orders", get(account::orders::index))
        .route("/orders/{id}", get(account::orders::show))
        .route("/orders/{id}/cancel", post(account::orders::cancel))
        .route(
            "/addresses",
            get(account::addresses::index).post(account::addresses::create),
        )
        .route("/addresses/new", get(account::addresses::new))
        .route("/addresses/{id}", post(account::addresses::update))
        .route("/addresses/{id}/edit", get(account::addresses::edit))
        .route("/addresses/{id}/delete", post(account::addresses::delete))
        .route(
            "/addresses/{id}/default",
            post(account::addresses::set_default),
        )
        .route("/payments", get(account::payments::index))
        .route("/payments/cards", post(account::payments::add_card))
        .route("/payments/upi", post(account::payments::add_upi))
        .route(
            "/payments/{id}/default",
            post(account::payments::set_default),
        )
        .route("/payments/{id}/delete", post(account::payments::delete))
        .route("/settings", get(account::settings::show))
        .route("/settings/profile", post(account::settings::update_profile))
        .route(
            "/settings/password",
            post(account::settings::change_password),
        )
        .route(
            "/settings/notifications",
            post(account::settings::update_notifications),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/theme", post(theme::toggle))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders/{id}/success", get(checkout::success))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .fallback(not_found)
}

/// 404 page for unknown paths.
async fn not_found() -> crate::error::AppError {
    crate::error::AppError::NotFound("that page".to_owned())
}
