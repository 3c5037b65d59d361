//! Cart route handlers.
//!
//! The cart lives in the session as product ids and quantities. Each
//! mutation answers with a redirect and a toast describing what happened.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::ProductId;
use ttd_core::coupon::Coupon;
use ttd_store::{CouponRepository, ProductRepository};

use super::back_to;
use crate::error::Result;
use crate::filters;
use crate::models::{Chrome, Toast, flash};
use crate::services::visitor::{self, CartSummary};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
    /// Present on "Buy now" buttons.
    pub buy_now: Option<String>,
    pub next: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: ProductId,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    pub code: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub chrome: Chrome,
    pub cart: CartSummary,
    /// Coupons currently redeemable, shown as hints.
    pub offers: Vec<Coupon>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session, chrome))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
) -> Result<CartShowTemplate> {
    let now = Utc::now();
    let mut cart = visitor::cart(&session).await?;
    let summary = visitor::summarize(state.store(), &mut cart, None, now).await?;
    visitor::save_cart(&session, &cart).await?;

    let offers = CouponRepository::new(state.store())
        .list()
        .await?
        .into_iter()
        .filter(|c| c.valid_from <= now && now <= c.valid_to)
        .collect();

    Ok(CartShowTemplate {
        chrome,
        cart: summary,
        offers,
    })
}

/// Add a product to the cart.
///
/// Quantities are clamped to stock. "Buy now" continues to checkout.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let Some(product) = ProductRepository::new(state.store())
        .get(form.product_id)
        .await?
    else {
        flash::push(&session, Toast::error("This product is no longer available")).await?;
        return Ok(back_to(form.next.as_deref(), "/cart"));
    };

    let mut cart = visitor::cart(&session).await?;
    match cart.add(&product, form.quantity.unwrap_or(1)) {
        Ok(quantity) => {
            visitor::save_cart(&session, &cart).await?;
            tracing::info!(product_id = %product.id, quantity, "Added to cart");
            if form.buy_now.is_some() {
                return Ok(Redirect::to("/checkout"));
            }
            flash::push(
                &session,
                Toast::success("Added to cart").with_description(product.name),
            )
            .await?;
        }
        Err(e) => {
            flash::push(&session, Toast::error(e.to_string())).await?;
        }
    }
    Ok(back_to(form.next.as_deref(), "/cart"))
}

/// Change the quantity of a cart line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let mut cart = visitor::cart(&session).await?;
    let product = ProductRepository::new(state.store())
        .get(form.product_id)
        .await?;

    match product {
        Some(product) => match cart.update_quantity(&product, form.quantity) {
            Ok(quantity) if quantity < form.quantity => {
                flash::push(
                    &session,
                    Toast::info(format!("Only {quantity} available"))
                        .with_description(product.name.clone()),
                )
                .await?;
            }
            Ok(_) => {}
            Err(e) => flash::push(&session, Toast::error(e.to_string())).await?,
        },
        None => {
            cart.remove(form.product_id);
            flash::push(&session, Toast::error("This product is no longer available")).await?;
        }
    }

    visitor::save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = visitor::cart(&session).await?;
    if cart.remove(form.product_id) {
        visitor::save_cart(&session, &cart).await?;
        flash::push(&session, Toast::success("Item removed from cart")).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the cart, including any coupon.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    let mut cart = visitor::cart(&session).await?;
    cart.clear();
    visitor::save_cart(&session, &cart).await?;
    flash::push(&session, Toast::success("Cart cleared")).await?;
    Ok(Redirect::to("/cart"))
}

/// Validate a coupon against the current subtotal and attach it.
#[instrument(skip(state, session))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    let now = Utc::now();
    let mut cart = visitor::cart(&session).await?;
    let summary = visitor::summarize(state.store(), &mut cart, None, now).await?;
    if summary.is_empty() {
        flash::push(&session, Toast::error("Your cart is empty")).await?;
        return Ok(Redirect::to("/cart"));
    }

    match CouponRepository::new(state.store())
        .check(&form.code, summary.totals.subtotal, now)
        .await?
    {
        Ok(applied) => {
            tracing::info!(code = %applied.code, discount = %applied.discount, "Coupon applied");
            cart.set_coupon(applied.code.clone());
            flash::push(
                &session,
                Toast::success(format!("Coupon {} applied", applied.code))
                    .with_description(format!("You saved {}", applied.discount)),
            )
            .await?;
        }
        Err(e) => {
            flash::push(
                &session,
                Toast::error("Coupon not applied").with_description(e.to_string()),
            )
            .await?;
        }
    }

    visitor::save_cart(&session, &cart).await?;
    Ok(Redirect::to("/cart"))
}

/// Detach the coupon.
#[instrument(skip(session))]
pub async fn remove_coupon(session: Session) -> Result<Redirect> {
    let mut cart = visitor::cart(&session).await?;
    if let Some(code) = cart.remove_coupon() {
        visitor::save_cart(&session, &cart).await?;
        flash::push(&session, Toast::info(format!("Coupon {code} removed"))).await?;
    }
    Ok(Redirect::to("/cart"))
}
