//! Shopping cart.
//!
//! The cart stores product ids and quantities only. Products are resolved
//! against the live catalog on every read so prices and stock are current.

use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::types::{Price, ProductId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("{name} is out of stock")]
    OutOfStock { name: String },
    #[error("Item is not in your cart")]
    NotInCart,
}

/// A stored cart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A cart row resolved against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }

    /// Whether current stock covers the requested quantity.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.product.stock >= self.quantity && self.product.stock > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    /// Applied coupon code. The discount is recomputed on every read.
    pub coupon_code: Option<String>,
}

impl Cart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }

    /// Add `quantity` of `product`, merging with an existing line.
    /// The resulting quantity is clamped to available stock.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::OutOfStock`] when the product has no stock.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<u32, CartError> {
        if product.stock == 0 {
            return Err(CartError::OutOfStock {
                name: product.name.clone(),
            });
        }
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity).min(product.stock);
            return Ok(line.quantity);
        }
        let quantity = quantity.min(product.stock);
        self.lines.push(CartLine {
            product_id: product.id,
            quantity,
        });
        Ok(quantity)
    }

    /// Set the quantity of an existing line, clamped to `[1, stock]`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] when the product is not in the cart.
    pub fn update_quantity(&mut self, product: &Product, quantity: u32) -> Result<u32, CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product.id)
            .ok_or(CartError::NotInCart)?;
        line.quantity = quantity.min(product.stock).max(1);
        Ok(line.quantity)
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        before != self.lines.len()
    }

    /// Empty the cart and drop any coupon.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.coupon_code = None;
    }

    pub fn set_coupon(&mut self, code: impl Into<String>) {
        self.coupon_code = Some(code.into());
    }

    pub fn remove_coupon(&mut self) -> Option<String> {
        self.coupon_code.take()
    }

    /// Resolve lines against `products`.
    ///
    /// Lines for products that no longer exist are dropped and quantities
    /// above current stock are lowered. Out-of-stock products stay in the
    /// cart so the customer can see why checkout is blocked.
    pub fn resolve(&mut self, products: &[Product]) -> Vec<CartItem> {
        self.lines
            .retain(|line| products.iter().any(|p| p.id == line.product_id));
        self.lines
            .iter_mut()
            .filter_map(|line| {
                let product = products.iter().find(|p| p.id == line.product_id)?;
                if product.stock > 0 && line.quantity > product.stock {
                    line.quantity = product.stock;
                }
                Some(CartItem {
                    product: product.clone(),
                    quantity: line.quantity,
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::test_support::product;

    #[test]
    fn test_add_merges_and_clamps_to_stock() {
        let p = product(1, "Phone", 10_000, 3);
        let mut cart = Cart::default();
        assert_eq!(cart.add(&p, 2).unwrap(), 2);
        assert_eq!(cart.add(&p, 5).unwrap(), 3);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_new_line_clamps_and_defaults_to_one() {
        let p = product(1, "Phone", 10_000, 2);
        let mut cart = Cart::default();
        assert_eq!(cart.add(&p, 10).unwrap(), 2);

        let q = product(2, "Case", 499, 5);
        assert_eq!(cart.add(&q, 0).unwrap(), 1);
    }

    #[test]
    fn test_add_out_of_stock() {
        let p = product(1, "Phone", 10_000, 0);
        let mut cart = Cart::default();
        assert_eq!(
            cart.add(&p, 1),
            Err(CartError::OutOfStock {
                name: "Phone".to_owned()
            })
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_clamps() {
        let p = product(1, "Phone", 10_000, 4);
        let mut cart = Cart::default();
        cart.add(&p, 1).unwrap();
        assert_eq!(cart.update_quantity(&p, 0).unwrap(), 1);
        assert_eq!(cart.update_quantity(&p, 9).unwrap(), 4);

        let other = product(2, "Other", 1, 1);
        assert_eq!(cart.update_quantity(&other, 1), Err(CartError::NotInCart));
    }

    #[test]
    fn test_remove_and_clear() {
        let p = product(1, "Phone", 10_000, 4);
        let mut cart = Cart::default();
        cart.add(&p, 1).unwrap();
        cart.set_coupon("SAVE10");
        assert!(cart.remove(p.id));
        assert!(!cart.remove(p.id));

        cart.add(&p, 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.coupon_code.is_none());
    }

    #[test]
    fn test_resolve_drops_missing_and_reclamps() {
        let a = product(1, "A", 100, 10);
        let b = product(2, "B", 200, 10);
        let mut cart = Cart::default();
        cart.add(&a, 5).unwrap();
        cart.add(&b, 1).unwrap();

        let mut shrunk = a.clone();
        shrunk.stock = 2;
        let items = cart.resolve(&[shrunk]);

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().quantity, 2);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.quantity_of(a.id), 2);
    }

    #[test]
    fn test_resolve_keeps_sold_out_lines() {
        let a = product(1, "A", 100, 10);
        let mut cart = Cart::default();
        cart.add(&a, 3).unwrap();

        let mut sold_out = a;
        sold_out.stock = 0;
        let items = cart.resolve(&[sold_out]);
        let item = items.first().unwrap();
        assert_eq!(item.quantity, 3);
        assert!(!item.is_available());
    }

    #[test]
    fn test_line_total() {
        let item = CartItem {
            product: product(1, "A", 1_299, 10),
            quantity: 3,
        };
        assert_eq!(item.line_total(), Price::from_rupees(3_897));
    }
}
