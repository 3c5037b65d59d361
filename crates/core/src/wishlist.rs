//! Saved-for-later product list.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::ProductId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    pub product_ids: Vec<ProductId>,
}

impl Wishlist {
    /// Add a product. Adding twice is a no-op; returns whether it was added.
    pub fn add(&mut self, id: ProductId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.product_ids.push(id);
        true
    }

    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.product_ids.len();
        self.product_ids.retain(|p| *p != id);
        before != self.product_ids.len()
    }

    /// Flip membership. Returns true when the product is now saved.
    pub fn toggle(&mut self, id: ProductId) -> bool {
        if self.remove(id) {
            false
        } else {
            self.add(id)
        }
    }

    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.product_ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.product_ids.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Saved products still in the catalog, in the order they were saved.
    #[must_use]
    pub fn resolve<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        self.product_ids
            .iter()
            .filter_map(|id| products.iter().find(|p| p.id == *id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::product;

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.add(ProductId::new(1)));
        assert!(!wishlist.add(ProductId::new(1)));
        assert_eq!(wishlist.len(), 1);
    }

    #[test]
    fn test_toggle_and_remove() {
        let mut wishlist = Wishlist::default();
        assert!(wishlist.toggle(ProductId::new(1)));
        assert!(wishlist.contains(ProductId::new(1)));
        assert!(!wishlist.toggle(ProductId::new(1)));
        assert!(wishlist.is_empty());
        assert!(!wishlist.remove(ProductId::new(1)));
    }

    #[test]
    fn test_resolve_skips_deleted_products() {
        let mut wishlist = Wishlist::default();
        wishlist.add(ProductId::new(2));
        wishlist.add(ProductId::new(9));
        wishlist.add(ProductId::new(1));
        let products = vec![product(1, "A", 10, 1), product(2, "B", 10, 1)];
        let ids: Vec<i32> = wishlist
            .resolve(&products)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_clear() {
        let mut wishlist = Wishlist::default();
        wishlist.add(ProductId::new(1));
        wishlist.clear();
        assert!(wishlist.is_empty());
    }
}
