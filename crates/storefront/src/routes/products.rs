//! Product listing and detail route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::Price;
use ttd_core::catalog::{
    Category, DEFAULT_MAX_PRICE, PAGE_SIZE, PRICE_RANGES, Page, PriceRange, Product,
    ProductFilter, SortBy, brands, paginate, related_products,
};
use ttd_core::format::format_date;
use ttd_core::order::delivery_days_for_pincode;
use ttd_core::pricing::GstBreakdown;
use ttd_core::validation::is_valid_pincode;
use ttd_core::wishlist::Wishlist;
use ttd_core::StockLevel;

use crate::error::{AppError, Result};
use crate::filters;
use crate::models::Chrome;
use crate::services::visitor;
use crate::state::AppState;

const RELATED_LIMIT: usize = 4;

/// Most units offered in the quantity picker.
const MAX_PICKER_QUANTITY: u32 = 10;

/// "N stars and up" choices in the rating filter.
const RATING_OPTIONS: [u8; 3] = [4, 3, 2];

// =============================================================================
// View Types
// =============================================================================

/// A product tile in a grid.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub product: Product,
    pub wishlisted: bool,
}

impl ProductCard {
    #[must_use]
    pub fn list(products: Vec<Product>, wishlist: &Wishlist) -> Vec<Self> {
        products
            .into_iter()
            .map(|product| Self {
                wishlisted: wishlist.contains(product.id),
                product,
            })
            .collect()
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Listing parameters parsed from the query string.
///
/// Brands arrive as repeated `brand=` pairs, so the raw pairs are parsed by
/// hand instead of through a flat struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingParams {
    pub filter: ProductFilter,
    pub page: usize,
}

impl ListingParams {
    #[must_use]
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut filter = ProductFilter::default();
        let mut page = 1;

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "q" => filter.search = Some(value.to_owned()),
                "category" => filter.category = Some(value.to_owned()),
                "subcategory" => filter.subcategory = Some(value.to_owned()),
                "tag" => filter.tag = Some(value.to_owned()),
                "brand" => {
                    if !filter.brands.iter().any(|b| b == value) {
                        filter.brands.push(value.to_owned());
                    }
                }
                "min_price" => filter.min_price = Price::parse(value).ok(),
                "max_price" => filter.max_price = Price::parse(value).ok(),
                "price" => {
                    let (min, max) = value.split_once('-').unwrap_or((value, ""));
                    filter.min_price = Price::parse(min).ok();
                    filter.max_price = Price::parse(max).ok();
                }
                "rating" => filter.min_rating = value.parse().ok().filter(|r| (1..=5).contains(r)),
                "in_stock" => filter.in_stock_only = matches!(value, "1" | "on" | "true"),
                "sort" => filter.sort = SortBy::parse_or_default(Some(value)),
                "page" => page = value.parse().unwrap_or(1),
                _ => {}
            }
        }

        Self { filter, page }
    }

    /// Query string reproducing these parameters on another page.
    #[must_use]
    pub fn query_for_page(&self, page: usize) -> String {
        let f = &self.filter;
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(q) = &f.search {
            pairs.push(("q", q.clone()));
        }
        if let Some(c) = &f.category {
            pairs.push(("category", c.clone()));
        }
        if let Some(s) = &f.subcategory {
            pairs.push(("subcategory", s.clone()));
        }
        if let Some(t) = &f.tag {
            pairs.push(("tag", t.clone()));
        }
        for brand in &f.brands {
            pairs.push(("brand", brand.clone()));
        }
        if let Some(min) = f.min_price {
            pairs.push(("min_price", min.whole_rupees().to_string()));
        }
        if let Some(max) = f.max_price {
            pairs.push(("max_price", max.whole_rupees().to_string()));
        }
        if let Some(r) = f.min_rating {
            pairs.push(("rating", r.to_string()));
        }
        if f.in_stock_only {
            pairs.push(("in_stock", "1".to_owned()));
        }
        if f.sort != SortBy::default() {
            pairs.push(("sort", f.sort.as_str().to_owned()));
        }
        if page > 1 {
            pairs.push(("page", page.to_string()));
        }

        pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub params: ListingParams,
    pub page: Page<ProductCard>,
    pub heading: String,
    pub categories: Vec<Category>,
    pub brands: Vec<String>,
    pub sort_options: &'static [SortBy],
    pub price_ranges: &'static [PriceRange],
    pub ratings: &'static [u8],
    pub active_filters: usize,
    pub page_links: Vec<PageLink>,
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
}

/// A numbered pagination link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub number: usize,
    pub url: String,
    pub current: bool,
}

impl ListingParams {
    /// `/products` URL for `page` with the current filters.
    #[must_use]
    pub fn page_url(&self, page: usize) -> String {
        let query = self.query_for_page(page);
        if query.is_empty() {
            "/products".to_owned()
        } else {
            format!("/products?{query}")
        }
    }
}

impl ProductsIndexTemplate {
    fn has_brand(&self, brand: &str) -> bool {
        self.params.filter.brands.iter().any(|b| b == brand)
    }

    fn is_category(&self, slug: &str) -> bool {
        self.params.filter.category.as_deref() == Some(slug)
    }

    fn is_sort(&self, sort: &SortBy) -> bool {
        self.params.filter.sort == *sort
    }

    fn is_rating(&self, rating: &u8) -> bool {
        self.params.filter.min_rating == Some(*rating)
    }

    fn search_text(&self) -> &str {
        self.params.filter.search.as_deref().unwrap_or_default()
    }

    fn min_price_value(&self) -> String {
        self.params
            .filter
            .min_price
            .map(|p| p.whole_rupees().to_string())
            .unwrap_or_default()
    }

    fn max_price_value(&self) -> String {
        self.params
            .filter
            .max_price
            .map(|p| p.whole_rupees().to_string())
            .unwrap_or_default()
    }

    fn max_price_placeholder(&self) -> i64 {
        DEFAULT_MAX_PRICE
    }

    fn price_range_value(&self, range: &PriceRange) -> String {
        range
            .max
            .map_or_else(|| format!("{}-", range.min), |max| format!("{}-{max}", range.min))
    }
}

/// Display the product listing.
#[instrument(skip(state, session, chrome, pairs))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<ProductsIndexTemplate> {
    let params = ListingParams::from_pairs(&pairs);

    let (matches, categories, all_brands) = state
        .store()
        .read(|d| {
            let matches: Vec<Product> = params
                .filter
                .apply(&d.products, &d.categories)
                .into_iter()
                .cloned()
                .collect();
            (matches, d.categories.clone(), brands(&d.products))
        })
        .await?;

    let heading = params
        .filter
        .category
        .as_deref()
        .and_then(|slug| categories.iter().find(|c| c.slug == slug))
        .map_or_else(
            || {
                params
                    .filter
                    .search
                    .as_deref()
                    .map_or_else(|| "All Products".to_owned(), |q| format!("Results for \"{q}\""))
            },
            |c| c.name.clone(),
        );

    let wishlist = visitor::wishlist(&session).await?;
    let page = paginate(&matches, params.page, PAGE_SIZE);
    let page = Page {
        items: ProductCard::list(page.items, &wishlist),
        page: page.page,
        total_pages: page.total_pages,
        total_items: page.total_items,
    };
    tracing::debug!(total = page.total_items, page = page.page, "Product listing");

    let page_links = (1..=page.total_pages)
        .map(|number| PageLink {
            number,
            url: params.page_url(number),
            current: number == page.page,
        })
        .collect();
    let prev_url = page.has_prev().then(|| params.page_url(page.page - 1));
    let next_url = page.has_next().then(|| params.page_url(page.page + 1));

    Ok(ProductsIndexTemplate {
        chrome,
        page_links,
        prev_url,
        next_url,
        active_filters: params.filter.active_count(),
        params,
        page,
        heading,
        categories,
        brands: all_brands,
        sort_options: SortBy::ALL,
        price_ranges: PRICE_RANGES,
        ratings: &RATING_OPTIONS,
    })
}

// =============================================================================
// Detail
// =============================================================================

/// Query parameters for the product page.
#[derive(Debug, Default, Deserialize)]
pub struct DetailQuery {
    pub pincode: Option<String>,
}

/// Result of the PIN code delivery check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryCheck {
    Estimate { pincode: String, days: i64, date: String },
    Invalid { pincode: String },
}

impl DeliveryCheck {
    #[must_use]
    pub fn for_pincode(pincode: &str, now: chrono::DateTime<Utc>) -> Self {
        let pincode = pincode.trim().to_owned();
        if !is_valid_pincode(&pincode) {
            return Self::Invalid { pincode };
        }
        let days = delivery_days_for_pincode(&pincode);
        Self::Estimate {
            date: format_date(now + Duration::days(days)),
            pincode,
            days,
        }
    }

    #[must_use]
    pub fn pincode(&self) -> &str {
        match self {
            Self::Estimate { pincode, .. } | Self::Invalid { pincode } => pincode,
        }
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Estimate { .. })
    }

    /// Line shown under the PIN code box.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Estimate { days, date, .. } => {
                format!("Delivery by {date} ({days} days)")
            }
            Self::Invalid { .. } => "Please enter a valid 6-digit PIN code".to_owned(),
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub chrome: Chrome,
    pub product: Product,
    pub category_slug: Option<String>,
    pub gst: GstBreakdown,
    pub stock_level: StockLevel,
    pub related: Vec<ProductCard>,
    pub wishlisted: bool,
    pub in_cart: u32,
    pub quantities: Vec<u32>,
    pub delivery: Option<DeliveryCheck>,
    pub free_delivery_threshold: Price,
}

/// Display a product by slug.
#[instrument(skip(state, session, chrome, query))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Path(slug): Path<String>,
    Query(query): Query<DetailQuery>,
) -> Result<ProductShowTemplate> {
    let found = state
        .store()
        .read(|d| {
            d.products.iter().find(|p| p.slug == slug).map(|product| {
                let related: Vec<Product> = related_products(product, &d.products, RELATED_LIMIT)
                    .into_iter()
                    .cloned()
                    .collect();
                let category_slug = d
                    .categories
                    .iter()
                    .find(|c| c.name == product.category)
                    .map(|c| c.slug.clone());
                (
                    product.clone(),
                    related,
                    category_slug,
                    d.settings.pricing.clone(),
                    d.settings.low_stock_threshold,
                )
            })
        })
        .await?;
    let Some((product, related, category_slug, pricing, low_threshold)) = found else {
        return Err(AppError::NotFound("that product".to_owned()));
    };

    let wishlist = visitor::wishlist(&session).await?;
    let cart = visitor::cart(&session).await?;
    let delivery = query
        .pincode
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .map(|p| DeliveryCheck::for_pincode(p, Utc::now()));

    Ok(ProductShowTemplate {
        gst: pricing.gst_breakdown(product.price, None),
        stock_level: product.stock_level(low_threshold),
        quantities: (1..=product.stock.min(MAX_PICKER_QUANTITY)).collect(),
        wishlisted: wishlist.contains(product.id),
        in_cart: cart.quantity_of(product.id),
        related: ProductCard::list(related, &wishlist),
        free_delivery_threshold: pricing.free_delivery_threshold,
        chrome,
        product,
        category_slug,
        delivery,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_params_parse_repeated_brands_and_range() {
        let params = ListingParams::from_pairs(&pairs(&[
            ("q", " earbuds "),
            ("brand", "boAt"),
            ("brand", "Sony"),
            ("brand", "boAt"),
            ("price", "1000-5000"),
            ("rating", "4"),
            ("in_stock", "on"),
            ("sort", "price_asc"),
            ("page", "2"),
        ]));
        let f = &params.filter;
        assert_eq!(f.search.as_deref(), Some("earbuds"));
        assert_eq!(f.brands, vec!["boAt".to_owned(), "Sony".to_owned()]);
        assert_eq!(f.min_price, Some(Price::from_rupees(1_000)));
        assert_eq!(f.max_price, Some(Price::from_rupees(5_000)));
        assert_eq!(f.min_rating, Some(4));
        assert!(f.in_stock_only);
        assert_eq!(f.sort, SortBy::PriceAsc);
        assert_eq!(params.page, 2);
    }

    #[test]
    fn test_params_ignore_blank_and_bad_values() {
        let params = ListingParams::from_pairs(&pairs(&[
            ("q", ""),
            ("rating", "9"),
            ("sort", "nonsense"),
            ("page", "x"),
            ("price", "100000-"),
        ]));
        assert_eq!(params.filter.search, None);
        assert_eq!(params.filter.min_rating, None);
        assert_eq!(params.filter.sort, SortBy::Popularity);
        assert_eq!(params.page, 1);
        assert_eq!(params.filter.min_price, Some(Price::from_rupees(100_000)));
        assert_eq!(params.filter.max_price, None);
    }

    #[test]
    fn test_query_for_page_keeps_filters() {
        let params = ListingParams::from_pairs(&pairs(&[
            ("category", "electronics"),
            ("brand", "boAt"),
            ("sort", "rating"),
        ]));
        assert_eq!(
            params.query_for_page(3),
            "category=electronics&brand=boAt&sort=rating&page=3"
        );
        assert_eq!(
            params.query_for_page(1),
            "category=electronics&brand=boAt&sort=rating"
        );
    }

    #[test]
    fn test_delivery_check() {
        let now = Utc::now();
        match DeliveryCheck::for_pincode("400001", now) {
            DeliveryCheck::Estimate { days, .. } => assert_eq!(days, 2 + 5 % 5),
            DeliveryCheck::Invalid { .. } => panic!("valid PIN rejected"),
        }
        assert!(matches!(
            DeliveryCheck::for_pincode("012345", now),
            DeliveryCheck::Invalid { .. }
        ));
    }
}
