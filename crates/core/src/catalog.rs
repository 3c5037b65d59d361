//! Product catalog: products, categories and the listing filter pipeline.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Price, ProductId, StockLevel};

/// Default upper bound of the price slider.
pub const DEFAULT_MAX_PRICE: i64 = 200_000;

/// Products shown per listing page.
pub const PAGE_SIZE: usize = 12;

/// A named key/value row on the product detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub price: Price,
    pub original_price: Price,
    /// Percentage off the original price.
    pub discount: u8,
    pub images: Vec<String>,
    /// Category display name.
    pub category: String,
    /// Subcategory display name.
    pub subcategory: String,
    pub brand: String,
    pub rating: f32,
    pub review_count: u32,
    pub stock: u32,
    pub specifications: Vec<Specification>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub const fn stock_level(&self, low_threshold: u32) -> StockLevel {
        StockLevel::from_stock(self.stock, low_threshold)
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Amount saved against the original price.
    #[must_use]
    pub fn savings(&self) -> Price {
        self.original_price.saturating_sub(self.price)
    }

    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }

    #[must_use]
    pub fn subcategory_slug(&self) -> String {
        slugify(&self.subcategory)
    }
}

/// Discount percentage implied by a price and an original price.
#[must_use]
pub fn discount_percent(price: Price, original_price: Price) -> u8 {
    if original_price.is_zero() || price >= original_price {
        return 0;
    }
    let off = (original_price - price).amount() / original_price.amount() * Decimal::ONE_HUNDRED;
    off.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u8()
        .unwrap_or(0)
        .min(100)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image: String,
    pub subcategories: Vec<Subcategory>,
}

/// Lower-case, collapse whitespace and punctuation into single dashes.
///
/// ```
/// assert_eq!(ttd_core::catalog::slugify("Smart Phones & Tablets"), "smart-phones-tablets");
/// ```
#[must_use]
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Popularity,
    PriceAsc,
    PriceDesc,
    Rating,
    Newest,
    Discount,
}

impl SortBy {
    pub const ALL: &'static [Self] = &[
        Self::Popularity,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::Rating,
        Self::Newest,
        Self::Discount,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Popularity => "popularity",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Rating => "rating",
            Self::Newest => "newest",
            Self::Discount => "discount",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Popularity => "Popularity",
            Self::PriceAsc => "Price: Low to High",
            Self::PriceDesc => "Price: High to Low",
            Self::Rating => "Customer Rating",
            Self::Newest => "Newest First",
            Self::Discount => "Discount",
        }
    }

    /// Unknown values fall back to popularity.
    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.iter().find(|s| s.as_str() == v))
            .copied()
            .unwrap_or_default()
    }
}

/// A preset price bucket offered next to the slider.
#[derive(Debug, Clone, Copy)]
pub struct PriceRange {
    pub min: i64,
    pub max: Option<i64>,
    pub label: &'static str,
}

pub const PRICE_RANGES: &[PriceRange] = &[
    PriceRange { min: 0, max: Some(1_000), label: "Under ₹1,000" },
    PriceRange { min: 1_000, max: Some(5_000), label: "₹1,000 - ₹5,000" },
    PriceRange { min: 5_000, max: Some(10_000), label: "₹5,000 - ₹10,000" },
    PriceRange { min: 10_000, max: Some(25_000), label: "₹10,000 - ₹25,000" },
    PriceRange { min: 25_000, max: Some(50_000), label: "₹25,000 - ₹50,000" },
    PriceRange { min: 50_000, max: Some(100_000), label: "₹50,000 - ₹1,00,000" },
    PriceRange { min: 100_000, max: None, label: "Above ₹1,00,000" },
];

/// Storefront listing criteria. Every field is optional; an empty filter
/// matches the whole catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub search: Option<String>,
    /// Category slug.
    pub category: Option<String>,
    /// Subcategory slug.
    pub subcategory: Option<String>,
    pub tag: Option<String>,
    pub brands: Vec<String>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub min_rating: Option<u8>,
    pub in_stock_only: bool,
    pub sort: SortBy,
}

impl ProductFilter {
    /// Number of narrowing filters in effect, shown on the "Filters" badge.
    /// Search and sort are not counted.
    #[must_use]
    pub fn active_count(&self) -> usize {
        let price_narrowed = self.min_price.is_some_and(|p| !p.is_zero())
            || self
                .max_price
                .is_some_and(|p| p < Price::from_rupees(DEFAULT_MAX_PRICE));
        [
            self.category.is_some(),
            self.subcategory.is_some(),
            !self.brands.is_empty(),
            price_narrowed,
            self.min_rating.is_some_and(|r| r > 0),
            self.in_stock_only,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Apply every predicate, then sort.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product], categories: &[Category]) -> Vec<&'a Product> {
        let query = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        // An unknown category slug is ignored rather than matching nothing.
        let category_name = self.category.as_deref().and_then(|slug| {
            categories
                .iter()
                .find(|c| c.slug == slug)
                .map(|c| c.name.as_str())
        });

        let mut result: Vec<&Product> = products
            .iter()
            .filter(|p| query.as_deref().is_none_or(|q| matches_search(p, q)))
            .filter(|p| category_name.is_none_or(|name| p.category == name))
            .filter(|p| {
                self.subcategory
                    .as_deref()
                    .is_none_or(|slug| p.subcategory_slug() == slug)
            })
            .filter(|p| self.tag.as_deref().is_none_or(|tag| p.has_tag(tag)))
            .filter(|p| self.brands.is_empty() || self.brands.contains(&p.brand))
            .filter(|p| self.min_price.is_none_or(|min| p.price >= min))
            .filter(|p| self.max_price.is_none_or(|max| p.price <= max))
            .filter(|p| {
                self.min_rating
                    .filter(|r| *r > 0)
                    .is_none_or(|r| p.rating >= f32::from(r))
            })
            .filter(|p| !self.in_stock_only || p.in_stock())
            .collect();

        sort_products(&mut result, self.sort);
        result
    }
}

fn matches_search(product: &Product, query: &str) -> bool {
    [
        &product.name,
        &product.brand,
        &product.description,
        &product.category,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(query))
}

/// Stable sort in place.
pub fn sort_products(products: &mut [&Product], sort: SortBy) {
    match sort {
        SortBy::Popularity => products.sort_by(|a, b| b.review_count.cmp(&a.review_count)),
        SortBy::PriceAsc => products.sort_by(|a, b| a.price.cmp(&b.price)),
        SortBy::PriceDesc => products.sort_by(|a, b| b.price.cmp(&a.price)),
        SortBy::Rating => products.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortBy::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::Discount => products.sort_by(|a, b| b.discount.cmp(&a.discount)),
    }
}

/// Distinct brands in catalog order of first appearance.
#[must_use]
pub fn brands(products: &[Product]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    products
        .iter()
        .filter(|p| seen.insert(p.brand.as_str()))
        .map(|p| p.brand.clone())
        .collect()
}

/// Up to `limit` other products from the same category.
#[must_use]
pub fn related_products<'a>(
    product: &Product,
    products: &'a [Product],
    limit: usize,
) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.category == product.category && p.id != product.id)
        .take(limit)
        .collect()
}

/// One page of a larger result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually shown.
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice out a 1-based page. Out-of-range requests clamp to the nearest page.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);
    let items = items
        .iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();
    Page {
        items,
        page,
        total_pages,
        total_items,
    }
}

/// Admin inventory stock bucket filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockFilter {
    #[default]
    All,
    In,
    Low,
    Out,
}

impl StockFilter {
    pub const ALL: &'static [Self] = &[Self::All, Self::In, Self::Low, Self::Out];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::In => "in",
            Self::Low => "low",
            Self::Out => "out",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All Stock",
            Self::In => "In Stock",
            Self::Low => "Low Stock",
            Self::Out => "Out of Stock",
        }
    }

    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.iter().find(|s| s.as_str() == v))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn matches(&self, stock: u32, low_threshold: u32) -> bool {
        match self {
            Self::All => true,
            Self::In => stock > 0,
            Self::Low => stock < low_threshold,
            Self::Out => stock == 0,
        }
    }
}

/// Admin product table criteria.
#[derive(Debug, Clone, Default)]
pub struct AdminProductFilter {
    /// Matches name or SKU, case-insensitive.
    pub search: Option<String>,
    /// Category display name.
    pub category: Option<String>,
    pub stock: StockFilter,
}

impl AdminProductFilter {
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product], low_threshold: u32) -> Vec<&'a Product> {
        let query = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        products
            .iter()
            .filter(|p| {
                query.as_deref().is_none_or(|q| {
                    p.name.to_lowercase().contains(q) || p.sku.to_lowercase().contains(q)
                })
            })
            .filter(|p| {
                self.category
                    .as_deref()
                    .filter(|c| *c != "all")
                    .is_none_or(|c| p.category == c)
            })
            .filter(|p| self.stock.matches(p.stock, low_threshold))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::TimeZone;

    use super::*;

    pub fn product(id: i32, name: &str, price: i64, stock: u32) -> Product {
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default()
            + chrono::Duration::days(i64::from(id));
        Product {
            id: ProductId::new(id),
            name: name.to_owned(),
            slug: slugify(name),
            sku: format!("SKU-{id:04}"),
            description: format!("{name} description"),
            price: Price::from_rupees(price),
            original_price: Price::from_rupees(price),
            discount: 0,
            images: vec![format!("/static/images/products/{id}.jpg")],
            category: "Electronics".to_owned(),
            subcategory: "Smart Phones".to_owned(),
            brand: "Acme".to_owned(),
            rating: 4.0,
            review_count: 10,
            stock,
            specifications: Vec::new(),
            features: Vec::new(),
            tags: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn categories() -> Vec<Category> {
        vec![
            Category {
                id: CategoryId::new(1),
                name: "Electronics".to_owned(),
                slug: "electronics".to_owned(),
                image: String::new(),
                subcategories: vec![Subcategory {
                    name: "Smart Phones".to_owned(),
                    slug: "smart-phones".to_owned(),
                }],
            },
            Category {
                id: CategoryId::new(2),
                name: "Fashion".to_owned(),
                slug: "fashion".to_owned(),
                image: String::new(),
                subcategories: Vec::new(),
            },
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_support::{categories, product};
    use super::*;

    fn catalog() -> Vec<Product> {
        let mut phone = product(1, "Galaxy Phone", 25_000, 5);
        phone.brand = "Samsung".to_owned();
        phone.review_count = 900;
        phone.rating = 4.4;
        phone.discount = 10;

        let mut shirt = product(2, "Linen Shirt", 1_499, 0);
        shirt.category = "Fashion".to_owned();
        shirt.subcategory = "Men's Clothing".to_owned();
        shirt.brand = "Fabindia".to_owned();
        shirt.review_count = 50;
        shirt.rating = 3.8;
        shirt.discount = 40;
        shirt.tags = vec!["deal".to_owned()];

        let mut earbuds = product(3, "Wireless Earbuds", 2_999, 40);
        earbuds.brand = "boAt".to_owned();
        earbuds.review_count = 2_000;
        earbuds.rating = 4.1;
        earbuds.description = "Bluetooth audio with deep bass".to_owned();
        earbuds.tags = vec!["bestseller".to_owned()];

        vec![phone, shirt, earbuds]
    }

    fn ids(products: &[&Product]) -> Vec<i32> {
        products.iter().map(|p| p.id.as_i32()).collect()
    }

    #[test]
    fn test_empty_filter_sorts_by_popularity() {
        let products = catalog();
        let result = ProductFilter::default().apply(&products, &categories());
        assert_eq!(ids(&result), vec![3, 1, 2]);
    }

    #[test]
    fn test_search_matches_description_and_brand() {
        let products = catalog();
        let filter = ProductFilter {
            search: Some("BLUETOOTH".to_owned()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![3]);

        let filter = ProductFilter {
            search: Some("samsung".to_owned()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![1]);
    }

    #[test]
    fn test_category_and_unknown_category() {
        let products = catalog();
        let filter = ProductFilter {
            category: Some("fashion".to_owned()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![2]);

        let filter = ProductFilter {
            category: Some("no-such-category".to_owned()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&products, &categories()).len(), 3);
    }

    #[test]
    fn test_subcategory_slug() {
        let products = catalog();
        let filter = ProductFilter {
            subcategory: Some("men-s-clothing".to_owned()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![2]);
    }

    #[test]
    fn test_brand_price_rating_stock_chain() {
        let products = catalog();
        let filter = ProductFilter {
            brands: vec!["Samsung".to_owned(), "boAt".to_owned(), "Fabindia".to_owned()],
            min_price: Some(Price::from_rupees(1_000)),
            max_price: Some(Price::from_rupees(30_000)),
            min_rating: Some(4),
            in_stock_only: true,
            sort: SortBy::PriceAsc,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![3, 1]);
        assert_eq!(filter.active_count(), 4);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let products = catalog();
        let filter = ProductFilter {
            min_price: Some(Price::from_rupees(2_999)),
            max_price: Some(Price::from_rupees(2_999)),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![3]);
    }

    #[test]
    fn test_tag_filter() {
        let products = catalog();
        let filter = ProductFilter {
            tag: Some("deal".to_owned()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, &categories())), vec![2]);
    }

    #[test]
    fn test_sort_orders() {
        let products = catalog();
        let sorted = |sort| {
            ids(&ProductFilter {
                sort,
                ..Default::default()
            }
            .apply(&products, &categories()))
        };
        assert_eq!(sorted(SortBy::PriceDesc), vec![1, 3, 2]);
        assert_eq!(sorted(SortBy::Rating), vec![1, 3, 2]);
        assert_eq!(sorted(SortBy::Newest), vec![3, 2, 1]);
        assert_eq!(sorted(SortBy::Discount), vec![2, 1, 3]);
    }

    #[test]
    fn test_active_count_ignores_default_price_range() {
        let filter = ProductFilter {
            min_price: Some(Price::ZERO),
            max_price: Some(Price::from_rupees(DEFAULT_MAX_PRICE)),
            search: Some("phone".to_owned()),
            ..Default::default()
        };
        assert_eq!(filter.active_count(), 0);
    }

    #[test]
    fn test_sort_parse_falls_back() {
        assert_eq!(SortBy::parse_or_default(Some("price_desc")), SortBy::PriceDesc);
        assert_eq!(SortBy::parse_or_default(Some("bogus")), SortBy::Popularity);
        assert_eq!(SortBy::parse_or_default(None), SortBy::Popularity);
    }

    #[test]
    fn test_related_products_excludes_self() {
        let products = catalog();
        let first = products.first().unwrap();
        let related = related_products(first, &products, 4);
        assert_eq!(ids(&related), vec![3]);
    }

    #[test]
    fn test_brands_unique_in_order() {
        let mut products = catalog();
        products.push(product(4, "Galaxy Tab", 30_000, 3));
        if let Some(tab) = products.last_mut() {
            tab.brand = "Samsung".to_owned();
        }
        assert_eq!(brands(&products), vec!["Samsung", "Fabindia", "boAt"]);
    }

    #[test]
    fn test_paginate_clamps() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(&items, 3, 12);
        assert_eq!(page.items, vec![25]);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_prev());
        assert!(!page.has_next());

        let page = paginate(&items, 99, 12);
        assert_eq!(page.page, 3);

        let empty: Page<u32> = paginate(&[], 0, 12);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Men's Clothing"), "men-s-clothing");
        assert_eq!(slugify("  Home & Kitchen  "), "home-kitchen");
        assert_eq!(slugify("iPhone 15 Pro"), "iphone-15-pro");
    }

    #[test]
    fn test_admin_filter_stock_buckets() {
        let products = catalog();
        let filter = AdminProductFilter {
            stock: StockFilter::Low,
            ..Default::default()
        };
        // stock 5 and 0 are both under the threshold of 20
        assert_eq!(ids(&filter.apply(&products, 20)), vec![1, 2]);

        let filter = AdminProductFilter {
            search: Some("sku-0003".to_owned()),
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, 20)), vec![3]);

        let filter = AdminProductFilter {
            category: Some("Fashion".to_owned()),
            stock: StockFilter::Out,
            ..Default::default()
        };
        assert_eq!(ids(&filter.apply(&products, 20)), vec![2]);
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(
            discount_percent(Price::from_rupees(750), Price::from_rupees(1_000)),
            25
        );
        assert_eq!(
            discount_percent(Price::from_rupees(1_000), Price::from_rupees(1_000)),
            0
        );
        assert_eq!(discount_percent(Price::from_rupees(10), Price::ZERO), 0);
    }
}
