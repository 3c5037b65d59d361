//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::catalog::{Category, Product, SortBy, sort_products};

use super::products::ProductCard;
use crate::error::Result;
use crate::filters;
use crate::models::Chrome;
use crate::services::visitor;
use crate::state::AppState;

const DEALS: usize = 4;
const BESTSELLERS: usize = 8;
const NEW_ARRIVALS: usize = 4;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub chrome: Chrome,
    pub categories: Vec<Category>,
    pub deals: Vec<ProductCard>,
    pub bestsellers: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
}

/// The three product rails shown on the home page.
#[derive(Debug, Clone, Default)]
pub struct HomeRails {
    pub deals: Vec<Product>,
    pub bestsellers: Vec<Product>,
    pub new_arrivals: Vec<Product>,
}

impl HomeRails {
    /// Deals are the deepest discounts. Best sellers are products tagged
    /// `bestseller`, topped up by review count when there are too few.
    #[must_use]
    pub fn select(products: &[Product]) -> Self {
        let pick = |sort: SortBy, limit: usize| {
            let mut all: Vec<&Product> = products.iter().collect();
            sort_products(&mut all, sort);
            all.into_iter().take(limit).cloned().collect::<Vec<_>>()
        };

        let mut ranked: Vec<&Product> = products.iter().collect();
        sort_products(&mut ranked, SortBy::Popularity);
        let (tagged, untagged): (Vec<&Product>, Vec<&Product>) =
            ranked.into_iter().partition(|p| p.has_tag("bestseller"));
        let bestsellers = tagged
            .into_iter()
            .chain(untagged)
            .take(BESTSELLERS)
            .cloned()
            .collect();

        Self {
            deals: pick(SortBy::Discount, DEALS),
            bestsellers,
            new_arrivals: pick(SortBy::Newest, NEW_ARRIVALS),
        }
    }
}

/// Display the home page.
#[instrument(skip(state, session, chrome))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
) -> Result<HomeTemplate> {
    let (categories, rails) = state
        .store()
        .read(|d| (d.categories.clone(), HomeRails::select(&d.products)))
        .await?;
    let wishlist = visitor::wishlist(&session).await?;

    Ok(HomeTemplate {
        chrome,
        categories,
        deals: ProductCard::list(rails.deals, &wishlist),
        bestsellers: ProductCard::list(rails.bestsellers, &wishlist),
        new_arrivals: ProductCard::list(rails.new_arrivals, &wishlist),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use ttd_store::seed::seed_data;

    use super::*;

    #[test]
    fn test_rails_sizes_and_order() {
        let data = seed_data(Utc::now());
        let rails = HomeRails::select(&data.products);
        assert_eq!(rails.deals.len(), DEALS);
        assert_eq!(rails.bestsellers.len(), BESTSELLERS);
        assert_eq!(rails.new_arrivals.len(), NEW_ARRIVALS);

        assert!(rails.deals.windows(2).all(|w| w.first().map(|p| p.discount) >= w.last().map(|p| p.discount)));
        assert!(rails.new_arrivals.windows(2).all(|w| w.first().map(|p| p.created_at) >= w.last().map(|p| p.created_at)));
    }

    #[test]
    fn test_bestseller_tag_comes_first() {
        let data = seed_data(Utc::now());
        let rails = HomeRails::select(&data.products);
        let tagged = data.products.iter().filter(|p| p.has_tag("bestseller")).count();
        assert!(
            rails
                .bestsellers
                .iter()
                .take(tagged.min(BESTSELLERS))
                .all(|p| p.has_tag("bestseller"))
        );
    }
}
