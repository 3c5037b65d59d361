//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::ProductId;
use ttd_core::catalog::Product;
use ttd_store::ProductRepository;

use super::back_to;
use crate::error::Result;
use crate::filters;
use crate::models::{Chrome, Toast, flash};
use crate::services::visitor;
use crate::state::AppState;

/// Wishlist form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
    pub next: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub chrome: Chrome,
    pub products: Vec<Product>,
}

/// Display the wishlist.
///
/// Ids of deleted products are pruned from the session.
#[instrument(skip(state, session, chrome))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
) -> Result<WishlistTemplate> {
    let mut wishlist = visitor::wishlist(&session).await?;
    let products: Vec<Product> = state
        .store()
        .read(|d| wishlist.resolve(&d.products).into_iter().cloned().collect())
        .await?;

    if products.len() != wishlist.len() {
        wishlist.product_ids.retain(|id| products.iter().any(|p| p.id == *id));
        visitor::save_wishlist(&session, &wishlist).await?;
    }

    Ok(WishlistTemplate { chrome, products })
}

/// Add or remove a product.
#[instrument(skip(session))]
pub async fn toggle(session: Session, Form(form): Form<WishlistForm>) -> Result<Redirect> {
    let mut wishlist = visitor::wishlist(&session).await?;
    let added = wishlist.toggle(form.product_id);
    visitor::save_wishlist(&session, &wishlist).await?;

    let toast = if added {
        Toast::success("Added to wishlist")
    } else {
        Toast::info("Removed from wishlist")
    };
    flash::push(&session, toast).await?;
    Ok(back_to(form.next.as_deref(), "/wishlist"))
}

/// Remove a product.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<WishlistForm>) -> Result<Redirect> {
    let mut wishlist = visitor::wishlist(&session).await?;
    if wishlist.remove(form.product_id) {
        visitor::save_wishlist(&session, &wishlist).await?;
        flash::push(&session, Toast::info("Removed from wishlist")).await?;
    }
    Ok(back_to(form.next.as_deref(), "/wishlist"))
}

/// Add one unit to the cart and drop the product from the wishlist.
///
/// Out-of-stock products stay on the wishlist.
#[instrument(skip(state, session))]
pub async fn move_to_cart(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect> {
    let mut wishlist = visitor::wishlist(&session).await?;
    let Some(product) = ProductRepository::new(state.store())
        .get(form.product_id)
        .await?
    else {
        wishlist.remove(form.product_id);
        visitor::save_wishlist(&session, &wishlist).await?;
        flash::push(&session, Toast::error("This product is no longer available")).await?;
        return Ok(Redirect::to("/wishlist"));
    };

    let mut cart = visitor::cart(&session).await?;
    match cart.add(&product, 1) {
        Ok(_) => {
            wishlist.remove(product.id);
            visitor::save_cart(&session, &cart).await?;
            visitor::save_wishlist(&session, &wishlist).await?;
            flash::push(
                &session,
                Toast::success("Moved to cart").with_description(product.name),
            )
            .await?;
        }
        Err(e) => flash::push(&session, Toast::error(e.to_string())).await?,
    }
    Ok(back_to(form.next.as_deref(), "/wishlist"))
}

/// Empty the wishlist.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    let mut wishlist = visitor::wishlist(&session).await?;
    wishlist.clear();
    visitor::save_wishlist(&session, &wishlist).await?;
    flash::push(&session, Toast::success("Wishlist cleared")).await?;
    Ok(Redirect::to("/wishlist"))
}
