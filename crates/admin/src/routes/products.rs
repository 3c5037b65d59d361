//! Product management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::catalog::{AdminProductFilter, Product, StockFilter};
use ttd_core::validation::{FieldErrors, non_empty};
use ttd_core::{Price, ProductId, StockLevel};
use ttd_store::{ProductRepository, StoreError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::ProductForm;
use crate::middleware::RequireAdminAuth;
use crate::models::{Chrome, Toast, flash};
use crate::state::AppState;

/// Product table query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub stock: Option<String>,
}

impl ProductsQuery {
    fn to_filter(&self) -> AdminProductFilter {
        AdminProductFilter {
            search: non_empty(self.q.as_deref()),
            category: non_empty(self.category.as_deref()).filter(|c| c != "all"),
            stock: StockFilter::parse_or_default(self.stock.as_deref()),
        }
    }
}

/// Product table row.
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub image: String,
    pub category: String,
    pub brand: String,
    pub price: Price,
    pub original_price: Price,
    pub stock: u32,
    pub stock_level: StockLevel,
}

impl ProductRow {
    fn new(product: &Product, low_threshold: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            slug: product.slug.clone(),
            sku: product.sku.clone(),
            image: product.primary_image().to_owned(),
            category: product.category.clone(),
            brand: product.brand.clone(),
            price: product.price,
            original_price: product.original_price,
            stock: product.stock,
            stock_level: StockLevel::from_stock(product.stock, low_threshold),
        }
    }

    fn stock_badge(&self) -> &'static str {
        match self.stock_level {
            StockLevel::InStock => "badge-success",
            StockLevel::LowStock => "badge-warning",
            StockLevel::OutOfStock => "badge-danger",
        }
    }

    fn is_discounted(&self) -> bool {
        self.original_price > self.price
    }
}

/// Product list page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub chrome: Chrome,
    pub products: Vec<ProductRow>,
    /// Catalog size before filtering.
    pub total: usize,
    pub search: String,
    pub category: String,
    pub stock: StockFilter,
    pub categories: Vec<String>,
    pub stock_filters: &'static [StockFilter],
}

impl ProductsIndexTemplate {
    fn is_category(&self, name: &String) -> bool {
        self.category == *name
    }

    fn is_stock(&self, filter: &StockFilter) -> bool {
        self.stock == *filter
    }
}

/// Create/edit form template.
#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub chrome: Chrome,
    /// `None` when creating.
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub errors: FieldErrors,
    pub categories: Vec<String>,
}

impl ProductFormTemplate {
    fn action(&self) -> String {
        self.product_id
            .map_or_else(|| "/products".to_owned(), |id| format!("/products/{id}"))
    }

    fn is_category(&self, name: &String) -> bool {
        self.form.category == *name
    }
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new))
        .route("/products/bulk-delete", post(bulk_delete))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit))
        .route("/products/{id}/delete", post(delete))
}

async fn category_names(state: &AppState) -> Result<Vec<String>> {
    Ok(state
        .store()
        .read(|d| d.categories.iter().map(|c| c.name.clone()).collect())
        .await?)
}

/// Product list page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<ProductsQuery>,
) -> Result<ProductsIndexTemplate> {
    let filter = query.to_filter();
    let page = state
        .store()
        .read(|d| {
            let threshold = d.settings.low_stock_threshold;
            ProductsIndexTemplate {
                products: filter
                    .apply(&d.products, threshold)
                    .into_iter()
                    .map(|p| ProductRow::new(p, threshold))
                    .collect(),
                total: d.products.len(),
                search: filter.search.clone().unwrap_or_default(),
                category: filter.category.clone().unwrap_or_default(),
                stock: filter.stock,
                categories: d.categories.iter().map(|c| c.name.clone()).collect(),
                stock_filters: StockFilter::ALL,
                chrome,
            }
        })
        .await?;

    Ok(page)
}

/// New product form.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn new(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<ProductFormTemplate> {
    Ok(ProductFormTemplate {
        chrome,
        product_id: None,
        form: ProductForm {
            stock: "0".to_owned(),
            ..ProductForm::default()
        },
        errors: FieldErrors::new(),
        categories: category_names(&state).await?,
    })
}

/// Edit product form.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn edit(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<ProductFormTemplate> {
    let product = ProductRepository::new(state.store())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("that product".to_owned()))?;

    Ok(ProductFormTemplate {
        chrome,
        product_id: Some(id),
        form: ProductForm::from(&product),
        errors: FieldErrors::new(),
        categories: category_names(&state).await?,
    })
}

/// Re-render the form with errors.
async fn form_rejected(
    state: &AppState,
    chrome: Chrome,
    product_id: Option<ProductId>,
    form: ProductForm,
    errors: FieldErrors,
) -> Result<Response> {
    Ok((
        StatusCode::UNPROCESSABLE_ENTITY,
        ProductFormTemplate {
            chrome,
            product_id,
            form,
            errors,
            categories: category_names(state).await?,
        },
    )
        .into_response())
}

fn slug_errors(message: String) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add("slug", message);
    errors
}

/// Create a product.
#[instrument(skip(state, session, chrome, admin, form), fields(user_id = %admin.id))]
async fn create(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return form_rejected(&state, chrome, None, form, errors).await,
    };

    match ProductRepository::new(state.store())
        .create(draft, Utc::now())
        .await
    {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created from admin");
            flash::push(
                &session,
                Toast::success("Product created").with_description(product.name),
            )
            .await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(StoreError::Conflict(message)) => {
            form_rejected(&state, chrome, None, form, slug_errors(message)).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Update a product.
#[instrument(skip(state, session, chrome, admin, form), fields(user_id = %admin.id))]
async fn update(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => return form_rejected(&state, chrome, Some(id), form, errors).await,
    };

    match ProductRepository::new(state.store())
        .update(id, draft, Utc::now())
        .await
    {
        Ok(product) => {
            flash::push(
                &session,
                Toast::success("Product updated").with_description(product.name),
            )
            .await?;
            Ok(Redirect::to("/products").into_response())
        }
        Err(StoreError::Conflict(message)) => {
            form_rejected(&state, chrome, Some(id), form, slug_errors(message)).await
        }
        Err(StoreError::NotFound) => Err(AppError::NotFound("that product".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Delete a single product.
#[instrument(skip(state, session, admin), fields(user_id = %admin.id))]
async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    let toast = match ProductRepository::new(state.store()).delete(id).await {
        Ok(()) => Toast::success("Product deleted"),
        Err(StoreError::NotFound) => Toast::error("That product no longer exists"),
        Err(e) => return Err(e.into()),
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to("/products"))
}

/// Product ids from a form body with one `ids` entry per checked row.
///
/// `serde_urlencoded` cannot collect repeated keys, so the body is parsed
/// directly. Malformed ids are skipped.
fn selected_ids(body: &str) -> Vec<ProductId> {
    url::form_urlencoded::parse(body.as_bytes())
        .filter(|(key, _)| key == "ids")
        .filter_map(|(_, value)| value.parse().ok())
        .collect()
}

/// Delete every selected product.
#[instrument(skip(state, session, admin, body), fields(user_id = %admin.id))]
async fn bulk_delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    body: String,
) -> Result<Redirect> {
    let ids = selected_ids(&body);
    let toast = if ids.is_empty() {
        Toast::error("Select at least one product")
    } else {
        let deleted = ProductRepository::new(state.store())
            .delete_many(&ids)
            .await?;
        tracing::info!(deleted, "Products deleted in bulk");
        Toast::success(match deleted {
            1 => "Deleted 1 product".to_owned(),
            n => format!("Deleted {n} products"),
        })
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to("/products"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_ids() {
        let ids = selected_ids("ids=3&ids=7&ids=abc&other=1&ids=%2012");
        assert_eq!(
            ids,
            vec![ProductId::new(3), ProductId::new(7), ProductId::new(12)]
        );
        assert!(selected_ids("").is_empty());
    }

    #[test]
    fn test_query_all_category_means_none() {
        let query = ProductsQuery {
            q: Some("  ".to_owned()),
            category: Some("all".to_owned()),
            stock: Some("low".to_owned()),
        };
        let filter = query.to_filter();
        assert!(filter.search.is_none());
        assert!(filter.category.is_none());
        assert_eq!(filter.stock, StockFilter::Low);
    }
}
