//! Order placement, history and status changes.

use chrono::{DateTime, Utc};
use tracing::instrument;
use ttd_core::cart::CartLine;
use ttd_core::coupon::{CouponError, apply_coupon};
use ttd_core::order::{
    Order, OrderError, OrderItem, estimated_delivery, generate_order_number,
    generate_tracking_number, transition,
};
use ttd_core::validation::is_valid_upi_id;
use ttd_core::{AddressId, OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, UserId};

use crate::data::StoreData;
use crate::{Store, StoreError};

/// Why an order could not be placed. Messages are shown to the customer.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,
    #[error("Please select a delivery address")]
    AddressRequired,
    #[error("Please enter your UPI ID")]
    UpiIdRequired,
    #[error("Please enter a valid UPI ID")]
    InvalidUpiId,
    #[error("Some items in your cart are no longer available")]
    ProductUnavailable,
    #[error("{name} is out of stock")]
    OutOfStock { name: String },
    #[error("Only {available} left of {name}")]
    InsufficientStock { name: String, available: u32 },
    #[error(transparent)]
    Coupon(#[from] CouponError),
}

/// Everything needed to turn a cart into an order.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub coupon_code: Option<String>,
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
    pub upi_id: Option<String>,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    store: &'a Store,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list(&self) -> Result<Vec<Order>, StoreError> {
        self.store.read(|d| d.orders.clone()).await
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        self.store
            .read(|d| {
                let mut orders: Vec<Order> = d
                    .orders
                    .iter()
                    .filter(|o| o.user_id == user_id)
                    .cloned()
                    .collect();
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                orders
            })
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.store.read(|d| d.order(id).cloned()).await
    }

    /// An order only if it belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn get_for_user(&self, user_id: UserId, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.store
            .read(|d| d.order(id).filter(|o| o.user_id == user_id).cloned())
            .await
    }

    /// Place an order.
    ///
    /// Stock, address, payment details and the coupon are checked again
    /// against current data. On success stock is decremented, the coupon's
    /// use is recorded and the order is stored. COD orders start pending;
    /// prepaid orders are paid and confirmed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Checkout` describing the first problem found,
    /// or `StoreError::NotFound` for an unknown user.
    #[instrument(skip(self, request, now), fields(user_id = %request.user_id, method = %request.payment_method))]
    pub async fn place(&self, request: PlaceOrder, now: DateTime<Utc>) -> Result<Order, StoreError> {
        let order = self
            .store
            .write(|d| {
                let order = build_order(d, &request, now)?;
                Ok(commit_order(d, order, now))
            })
            .await?;
        tracing::info!(order_number = %order.order_number, total = %order.total, "Order placed");
        Ok(order)
    }

    /// Cancel a customer's own order and restock its items.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the order is not the customer's and
    /// `OrderError::NotCancellable` once it has shipped.
    #[instrument(skip(self, now))]
    pub async fn cancel(&self, user_id: UserId, id: OrderId, now: DateTime<Utc>) -> Result<Order, StoreError> {
        self.store
            .write(|d| {
                let order = d
                    .orders
                    .iter_mut()
                    .find(|o| o.id == id && o.user_id == user_id)
                    .ok_or(StoreError::NotFound)?;
                if !order.is_cancellable() {
                    return Err(OrderError::NotCancellable.into());
                }
                transition(order, OrderStatus::Cancelled, now)?;
                let cancelled = order.clone();
                d.restock(id);
                tracing::info!(order_number = %cancelled.order_number, "Order cancelled by customer");
                Ok(cancelled)
            })
            .await
    }

    /// Move an order to `next` following the transition table.
    ///
    /// Shipping assigns a tracking number when there is none. Cancelling or
    /// returning puts the items back in stock.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for an unknown order and
    /// `StoreError::Order` for a disallowed transition.
    #[instrument(skip(self, now))]
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, StoreError> {
        self.store
            .write(|d| {
                let order = d
                    .orders
                    .iter_mut()
                    .find(|o| o.id == id)
                    .ok_or(StoreError::NotFound)?;
                transition(order, next, now)?;
                if next == OrderStatus::Shipped && order.tracking_number.is_none() {
                    order.tracking_number = Some(generate_tracking_number(&mut rand::rng()));
                }
                let updated = order.clone();
                if matches!(next, OrderStatus::Cancelled | OrderStatus::Returned) {
                    d.restock(id);
                }
                tracing::info!(order_number = %updated.order_number, status = %next, "Order status changed");
                Ok(updated)
            })
            .await
    }
}

fn build_order(d: &StoreData, request: &PlaceOrder, now: DateTime<Utc>) -> Result<Order, StoreError> {
    if request.lines.is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }
    let user = d.user(request.user_id).ok_or(StoreError::NotFound)?;
    let address = user
        .addresses
        .iter()
        .find(|a| a.id == request.address_id)
        .cloned()
        .ok_or(CheckoutError::AddressRequired)?;

    let upi_id = if request.payment_method == PaymentMethod::Upi {
        let upi_id = request
            .upi_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CheckoutError::UpiIdRequired)?;
        if !is_valid_upi_id(upi_id) {
            return Err(CheckoutError::InvalidUpiId.into());
        }
        Some(upi_id.to_owned())
    } else {
        None
    };

    let mut items = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        let product = d
            .product(line.product_id)
            .ok_or(CheckoutError::ProductUnavailable)?;
        if product.stock == 0 {
            return Err(CheckoutError::OutOfStock {
                name: product.name.clone(),
            }
            .into());
        }
        if product.stock < line.quantity {
            return Err(CheckoutError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
            }
            .into());
        }
        items.push(OrderItem {
            product: product.clone(),
            quantity: line.quantity,
            price: product.price,
        });
    }

    let subtotal: Price = items.iter().map(OrderItem::line_total).sum();
    let item_count = items.iter().map(|i| i.quantity).sum();
    let coupon = request
        .coupon_code
        .as_deref()
        .map(|code| apply_coupon(&d.coupons, code, subtotal, now))
        .transpose()
        .map_err(CheckoutError::from)?;
    let discount = coupon.as_ref().map_or(Price::ZERO, |c| c.discount);
    let totals = d
        .settings
        .pricing
        .totals_for_subtotal(subtotal, item_count, discount, Some(&address.state));

    let (payment_status, order_status) = if request.payment_method.is_prepaid() {
        (PaymentStatus::Paid, OrderStatus::Confirmed)
    } else {
        (PaymentStatus::Pending, OrderStatus::Pending)
    };

    Ok(Order {
        id: OrderId::new(0),
        order_number: unique_order_number(d, now),
        user_id: request.user_id,
        items,
        shipping_address: address.clone(),
        billing_address: address,
        payment_method: request.payment_method,
        payment_status,
        order_status,
        upi_id,
        subtotal: totals.subtotal,
        gst: totals.gst.total_gst,
        delivery_charge: totals.delivery_charge,
        discount: totals.discount,
        total: totals.total,
        coupon_code: coupon.map(|c| c.code),
        tracking_number: None,
        estimated_delivery: Some(estimated_delivery(now)),
        created_at: now,
        updated_at: now,
    })
}

/// Take stock, count the coupon use, then assign the id and store the order.
fn commit_order(d: &mut StoreData, mut order: Order, now: DateTime<Utc>) -> Order {
    for item in &order.items {
        if let Some(product) = d.products.iter_mut().find(|p| p.id == item.product.id) {
            product.stock = product.stock.saturating_sub(item.quantity);
            product.updated_at = now;
        }
    }
    if let Some(code) = &order.coupon_code {
        if let Some(coupon) = d.coupons.iter_mut().find(|c| c.code == *code) {
            coupon.used_count = coupon.used_count.saturating_add(1);
        }
    }
    order.id = d.next_order_id();
    d.orders.push(order.clone());
    order
}

fn unique_order_number(d: &StoreData, now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    loop {
        let number = generate_order_number(now, &mut rng);
        if !d.orders.iter().any(|o| o.order_number == number) {
            return number;
        }
    }
}
