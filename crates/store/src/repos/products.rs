//! Product catalog operations.

use chrono::{DateTime, Utc};
use tracing::instrument;
use ttd_core::catalog::{Category, Product, Specification, discount_percent};
use ttd_core::{Price, ProductId};

use crate::{Store, StoreError};

/// Validated product fields from the admin form.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub price: Price,
    pub original_price: Price,
    pub category: String,
    pub subcategory: String,
    pub brand: String,
    pub stock: u32,
    pub rating: f32,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub specifications: Vec<Specification>,
}

impl ProductDraft {
    fn apply_to(self, product: &mut Product, now: DateTime<Utc>) {
        product.discount = discount_percent(self.price, self.original_price);
        product.name = self.name;
        product.slug = self.slug;
        product.sku = self.sku;
        product.description = self.description;
        product.price = self.price;
        product.original_price = self.original_price;
        product.category = self.category;
        product.subcategory = self.subcategory;
        product.brand = self.brand;
        product.stock = self.stock;
        product.rating = self.rating;
        product.images = self.images;
        product.tags = self.tags;
        product.features = self.features;
        product.specifications = self.specifications;
        product.updated_at = now;
    }
}

/// Repository for products and categories.
pub struct ProductRepository<'a> {
    store: &'a Store,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// All products in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Product>, StoreError> {
        self.store.read(|d| d.products.clone()).await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn categories(&self) -> Result<Vec<Category>, StoreError> {
        self.store.read(|d| d.categories.clone()).await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        self.store.read(|d| d.product(id).cloned()).await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        self.store
            .read(|d| d.products.iter().find(|p| p.slug == slug).cloned())
            .await
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the slug is already used.
    #[instrument(skip(self, draft), fields(slug = %draft.slug))]
    pub async fn create(&self, draft: ProductDraft, now: DateTime<Utc>) -> Result<Product, StoreError> {
        self.store
            .write(|d| {
                if d.products.iter().any(|p| p.slug == draft.slug) {
                    return Err(slug_taken(&draft.slug));
                }
                let mut product = Product {
                    id: d.next_product_id(),
                    name: String::new(),
                    slug: String::new(),
                    sku: String::new(),
                    description: String::new(),
                    price: Price::ZERO,
                    original_price: Price::ZERO,
                    discount: 0,
                    images: Vec::new(),
                    category: String::new(),
                    subcategory: String::new(),
                    brand: String::new(),
                    rating: 0.0,
                    review_count: 0,
                    stock: 0,
                    specifications: Vec::new(),
                    features: Vec::new(),
                    tags: Vec::new(),
                    created_at: now,
                    updated_at: now,
                };
                draft.apply_to(&mut product, now);
                d.products.push(product.clone());
                tracing::info!(product_id = %product.id, "Product created");
                Ok(product)
            })
            .await
    }

    /// Replace a product's editable fields. Reviews and the creation time
    /// are kept.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown id and
    /// `StoreError::Conflict` if the slug belongs to another product.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        draft: ProductDraft,
        now: DateTime<Utc>,
    ) -> Result<Product, StoreError> {
        self.store
            .write(|d| {
                if d.products.iter().any(|p| p.slug == draft.slug && p.id != id) {
                    return Err(slug_taken(&draft.slug));
                }
                let product = d
                    .products
                    .iter_mut()
                    .find(|p| p.id == id)
                    .ok_or(StoreError::NotFound)?;
                draft.apply_to(product, now);
                Ok(product.clone())
            })
            .await
    }

    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), StoreError> {
        self.store
            .write(|d| {
                let before = d.products.len();
                d.products.retain(|p| p.id != id);
                if before == d.products.len() {
                    return Err(StoreError::NotFound);
                }
                Ok(())
            })
            .await
    }

    /// Delete several products, returning how many existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[ProductId]) -> Result<usize, StoreError> {
        self.store
            .write(|d| {
                let before = d.products.len();
                d.products.retain(|p| !ids.contains(&p.id));
                Ok(before - d.products.len())
            })
            .await
    }
}

fn slug_taken(slug: &str) -> StoreError {
    StoreError::Conflict(format!("A product with slug \"{slug}\" already exists"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seed::seed_data;

    fn draft(name: &str, slug: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_owned(),
            slug: slug.to_owned(),
            sku: "TTD-TST-0001".to_owned(),
            description: "A test product".to_owned(),
            price: Price::from_rupees(750),
            original_price: Price::from_rupees(1_000),
            category: "Electronics".to_owned(),
            subcategory: "Audio".to_owned(),
            brand: "Acme".to_owned(),
            stock: 10,
            rating: 4.0,
            images: Vec::new(),
            tags: Vec::new(),
            features: Vec::new(),
            specifications: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_discount() {
        let store = Store::in_memory(seed_data(Utc::now()));
        let repo = ProductRepository::new(&store);
        let before = repo.list().await.unwrap().len();

        let product = repo.create(draft("Speaker", "speaker"), Utc::now()).await.unwrap();

        assert_eq!(product.discount, 25);
        assert_eq!(product.id.as_i32(), i32::try_from(before).unwrap() + 1);
        assert_eq!(repo.get_by_slug("speaker").await.unwrap().unwrap().id, product.id);
    }

    #[tokio::test]
    async fn test_slug_must_be_unique() {
        let store = Store::in_memory(seed_data(Utc::now()));
        let repo = ProductRepository::new(&store);
        let existing = repo.list().await.unwrap().first().unwrap().slug.clone();

        let err = repo.create(draft("Dup", &existing), Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let product = repo.create(draft("Mine", "mine"), Utc::now()).await.unwrap();
        let err = repo
            .update(product.id, draft("Mine", &existing), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Keeping its own slug is fine.
        assert!(repo.update(product.id, draft("Renamed", "mine"), Utc::now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_and_delete_many() {
        let store = Store::in_memory(seed_data(Utc::now()));
        let repo = ProductRepository::new(&store);

        repo.delete(ProductId::new(1)).await.unwrap();
        assert!(matches!(repo.delete(ProductId::new(1)).await, Err(StoreError::NotFound)));

        let removed = repo
            .delete_many(&[ProductId::new(2), ProductId::new(3), ProductId::new(999)])
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }
}
