//! The snapshot document.

use serde::{Deserialize, Serialize};
use ttd_core::catalog::{Category, Product};
use ttd_core::coupon::Coupon;
use ttd_core::order::Order;
use ttd_core::pricing::PricingPolicy;
use ttd_core::user::User;
use ttd_core::{AddressId, CategoryId, OrderId, ProductId, SavedPaymentId, UserId};

/// Shop-wide settings editable from the admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub pricing: PricingPolicy,
    /// Products below this stock count are "low stock".
    pub low_stock_threshold: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            pricing: PricingPolicy::default(),
            low_stock_threshold: 20,
        }
    }
}

/// Last issued id per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub product: i32,
    pub category: i32,
    pub user: i32,
    pub order: i32,
    pub address: i32,
    pub payment: i32,
}

/// Everything the store persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreData {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub coupons: Vec<Coupon>,
    pub users: Vec<User>,
    pub orders: Vec<Order>,
    #[serde(default)]
    pub settings: StoreSettings,
    #[serde(default)]
    pub sequences: Sequences,
}

impl StoreData {
    pub fn next_product_id(&mut self) -> ProductId {
        self.sequences.product += 1;
        ProductId::new(self.sequences.product)
    }

    pub fn next_category_id(&mut self) -> CategoryId {
        self.sequences.category += 1;
        CategoryId::new(self.sequences.category)
    }

    pub fn next_user_id(&mut self) -> UserId {
        self.sequences.user += 1;
        UserId::new(self.sequences.user)
    }

    pub fn next_order_id(&mut self) -> OrderId {
        self.sequences.order += 1;
        OrderId::new(self.sequences.order)
    }

    pub fn next_address_id(&mut self) -> AddressId {
        self.sequences.address += 1;
        AddressId::new(self.sequences.address)
    }

    pub fn next_payment_id(&mut self) -> SavedPaymentId {
        self.sequences.payment += 1;
        SavedPaymentId::new(self.sequences.payment)
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    #[must_use]
    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn user_mut(&mut self, id: UserId) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Customers only; admins are excluded.
    pub fn customers(&self) -> impl Iterator<Item = &User> {
        self.users.iter().filter(|u| !u.is_admin())
    }

    /// Put stock back for every item of an order. Products deleted since
    /// the order was placed are skipped.
    pub fn restock(&mut self, order_id: OrderId) {
        let Some(order) = self.orders.iter().find(|o| o.id == order_id) else {
            return;
        };
        let returns: Vec<(ProductId, u32)> = order
            .items
            .iter()
            .map(|i| (i.product.id, i.quantity))
            .collect();
        for (product_id, quantity) in returns {
            if let Some(product) = self.products.iter_mut().find(|p| p.id == product_id) {
                product.stock = product.stock.saturating_add(quantity);
            }
        }
    }

    /// Bring every sequence up to the largest id in use, so hand-edited
    /// snapshots never reissue an id.
    pub fn sync_sequences(&mut self) {
        let addresses = self.users.iter().flat_map(|u| u.addresses.iter().map(|a| a.id.as_i32()));
        let payments = self.users.iter().flat_map(|u| {
            u.saved_cards
                .iter()
                .map(|c| c.id.as_i32())
                .chain(u.saved_upi.iter().map(|p| p.id.as_i32()))
        });
        let seq = Sequences {
            product: max_id(self.products.iter().map(|p| p.id.as_i32())),
            category: max_id(self.categories.iter().map(|c| c.id.as_i32())),
            user: max_id(self.users.iter().map(|u| u.id.as_i32())),
            order: max_id(self.orders.iter().map(|o| o.id.as_i32())),
            address: max_id(addresses),
            payment: max_id(payments),
        };
        let current = &mut self.sequences;
        current.product = current.product.max(seq.product);
        current.category = current.category.max(seq.category);
        current.user = current.user.max(seq.user);
        current.order = current.order.max(seq.order);
        current.address = current.address.max(seq.address);
        current.payment = current.payment.max(seq.payment);
    }
}

fn max_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().unwrap_or(0)
}
