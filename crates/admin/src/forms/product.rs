//! Product create/edit form.
//!
//! List fields are edited as text: images, features and specifications one
//! per line, tags comma separated.

use serde::Deserialize;
use ttd_core::Price;
use ttd_core::catalog::{Product, Specification, slugify};
use ttd_core::validation::FieldErrors;
use ttd_store::ProductDraft;
use ttd_store::seed::PLACEHOLDER_IMAGE;

const MAX_RATING: f32 = 5.0;

/// Raw product form fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub name: String,
    /// Generated from the name when left blank.
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub price: String,
    /// Defaults to the price when left blank.
    pub original_price: String,
    pub category: String,
    pub subcategory: String,
    pub brand: String,
    pub stock: String,
    pub rating: String,
    pub images: String,
    pub tags: String,
    pub features: String,
    pub specifications: String,
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            sku: product.sku.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            original_price: product.original_price.amount().to_string(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            brand: product.brand.clone(),
            stock: product.stock.to_string(),
            rating: product.rating.to_string(),
            images: product.images.join("\n"),
            tags: product.tags.join(", "),
            features: product.features.join("\n"),
            specifications: product
                .specifications
                .iter()
                .map(|s| format!("{}: {}", s.name, s.value))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl ProductForm {
    /// Validate into a [`ProductDraft`]. Slug uniqueness is checked by the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns the failing fields.
    pub fn validate(&self) -> Result<ProductDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let name = self.name.trim();
        errors.check(!name.is_empty(), "name", "Product name is required");

        let slug = if self.slug.trim().is_empty() {
            slugify(name)
        } else {
            slugify(&self.slug)
        };
        errors.check(!slug.is_empty(), "slug", "Slug is required");

        let sku = self.sku.trim();
        errors.check(!sku.is_empty(), "sku", "SKU is required");
        let category = self.category.trim();
        errors.check(!category.is_empty(), "category", "Category is required");
        let brand = self.brand.trim();
        errors.check(!brand.is_empty(), "brand", "Brand is required");

        let price = match Price::parse(&self.price) {
            Ok(price) if price > Price::ZERO => Some(price),
            Ok(_) => {
                errors.add("price", "Price must be greater than 0");
                None
            }
            Err(e) => {
                errors.add("price", e.to_string());
                None
            }
        };

        let original_price = if self.original_price.trim().is_empty() {
            price
        } else {
            match Price::parse(&self.original_price) {
                Ok(original) if price.is_none_or(|p| original >= p) => Some(original),
                Ok(_) => {
                    errors.add("original_price", "Original price cannot be below the price");
                    None
                }
                Err(e) => {
                    errors.add("original_price", e.to_string());
                    None
                }
            }
        };

        let stock = match self.stock.trim().parse::<i64>() {
            Ok(n) if n < 0 => {
                errors.add("stock", "Stock cannot be negative");
                None
            }
            Ok(n) => u32::try_from(n).ok().or_else(|| {
                errors.add("stock", "Stock is too large");
                None
            }),
            Err(_) => {
                errors.add("stock", "Stock must be a whole number");
                None
            }
        };

        let rating = if self.rating.trim().is_empty() {
            Some(0.0)
        } else {
            match self.rating.trim().parse::<f32>() {
                Ok(r) if (0.0..=MAX_RATING).contains(&r) => Some(r),
                _ => {
                    errors.add("rating", "Rating must be between 0 and 5");
                    None
                }
            }
        };

        let specifications = self.parse_specifications(&mut errors);

        errors.into_result()?;
        let (Some(price), Some(original_price), Some(stock), Some(rating)) =
            (price, original_price, stock, rating)
        else {
            return Err(FieldErrors::new());
        };

        let mut images = lines(&self.images);
        if images.is_empty() {
            images.push(PLACEHOLDER_IMAGE.to_owned());
        }

        Ok(ProductDraft {
            name: name.to_owned(),
            slug,
            sku: sku.to_owned(),
            description: self.description.trim().to_owned(),
            price,
            original_price,
            category: category.to_owned(),
            subcategory: self.subcategory.trim().to_owned(),
            brand: brand.to_owned(),
            stock,
            rating,
            images,
            tags: tags(&self.tags),
            features: lines(&self.features),
            specifications,
        })
    }

    fn parse_specifications(&self, errors: &mut FieldErrors) -> Vec<Specification> {
        let mut specs = Vec::new();
        for line in lines(&self.specifications) {
            match line.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() && !value.trim().is_empty() => {
                    specs.push(Specification {
                        name: name.trim().to_owned(),
                        value: value.trim().to_owned(),
                    });
                }
                _ => errors.add("specifications", "Use one \"Name: Value\" pair per line"),
            }
        }
        specs
    }
}

fn lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Lower-cased, de-duplicated, in entry order.
fn tags(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in text.split(',').map(|t| t.trim().to_lowercase()) {
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
