//! Orders, order numbers and order list queries.

use chrono::{DateTime, Datelike, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::catalog::Product;
use crate::types::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, Price, UserId};

/// Days between placing an order and its estimated delivery.
pub const DELIVERY_DAYS: i64 = 5;

/// A purchased line. The product is a snapshot taken when the order was
/// placed so later catalog edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: Product,
    pub quantity: u32,
    /// Unit price charged.
    pub price: Price,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// UPI handle used at checkout, when paying by UPI.
    pub upi_id: Option<String>,
    pub subtotal: Price,
    pub gst: Price,
    pub delivery_charge: Price,
    pub discount: Price,
    pub total: Price,
    pub coupon_code: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub const fn is_cancellable(&self) -> bool {
        self.order_status.is_cancellable()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Cannot change order from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("This order can no longer be cancelled")]
    NotCancellable,
}

/// `ORD-<year>-<six upper-case alphanumerics>`.
#[must_use]
pub fn generate_order_number<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let suffix: String = (0..6)
        .map(|_| {
            let idx = rng.random_range(0..ALPHABET.len());
            ALPHABET.get(idx).map_or('0', |b| char::from(*b))
        })
        .collect();
    format!("ORD-{}-{suffix}", now.year())
}

/// Tracking numbers are assigned when an order ships.
#[must_use]
pub fn generate_tracking_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("TTD{:010}", rng.random_range(0..10_000_000_000_u64))
}

#[must_use]
pub fn estimated_delivery(placed_at: DateTime<Utc>) -> DateTime<Utc> {
    placed_at + Duration::days(DELIVERY_DAYS)
}

/// Delivery estimate for a PIN code on the product page: 2 to 6 days,
/// stable for a given PIN.
#[must_use]
pub fn delivery_days_for_pincode(pincode: &str) -> i64 {
    let sum: u32 = pincode.chars().filter_map(|c| c.to_digit(10)).sum();
    2 + i64::from(sum % 5)
}

/// Apply a status change, enforcing the transition table.
///
/// # Errors
///
/// Returns [`OrderError::InvalidTransition`] for disallowed moves.
pub fn transition(order: &mut Order, next: OrderStatus, now: DateTime<Utc>) -> Result<(), OrderError> {
    if !order.order_status.can_transition_to(next) {
        return Err(OrderError::InvalidTransition {
            from: order.order_status,
            to: next,
        });
    }
    order.order_status = next;
    order.updated_at = now;
    match next {
        OrderStatus::Delivered if order.payment_status == PaymentStatus::Pending => {
            // Cash collected on delivery.
            order.payment_status = PaymentStatus::Paid;
        }
        OrderStatus::Cancelled | OrderStatus::Returned
            if order.payment_status == PaymentStatus::Paid =>
        {
            order.payment_status = PaymentStatus::Refunded;
        }
        _ => {}
    }
    Ok(())
}

/// Sort options on the account order history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSort {
    #[default]
    Newest,
    Oldest,
    Highest,
    Lowest,
}

impl OrderSort {
    pub const ALL: &'static [Self] = &[Self::Newest, Self::Oldest, Self::Highest, Self::Lowest];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Highest => "highest",
            Self::Lowest => "lowest",
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Newest => "Newest First",
            Self::Oldest => "Oldest First",
            Self::Highest => "Highest Amount",
            Self::Lowest => "Lowest Amount",
        }
    }

    #[must_use]
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| Self::ALL.iter().find(|s| s.as_str() == v))
            .copied()
            .unwrap_or_default()
    }
}

/// Account order history criteria.
#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    /// Substring of the order number, case-insensitive.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub sort: OrderSort,
}

impl OrderQuery {
    #[must_use]
    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        let query = normalized(self.search.as_deref());
        let mut result: Vec<&Order> = orders
            .iter()
            .filter(|o| {
                query
                    .as_deref()
                    .is_none_or(|q| o.order_number.to_lowercase().contains(q))
            })
            .filter(|o| self.status.is_none_or(|s| o.order_status == s))
            .collect();
        match self.sort {
            OrderSort::Newest => result.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            OrderSort::Oldest => result.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            OrderSort::Highest => result.sort_by(|a, b| b.total.cmp(&a.total)),
            OrderSort::Lowest => result.sort_by(|a, b| a.total.cmp(&b.total)),
        }
        result
    }
}

/// Admin order table criteria.
#[derive(Debug, Clone, Default)]
pub struct AdminOrderFilter {
    /// Matches order number or the shipping full name.
    pub search: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
}

impl AdminOrderFilter {
    /// Matching orders, newest first.
    #[must_use]
    pub fn apply<'a>(&self, orders: &'a [Order]) -> Vec<&'a Order> {
        let query = normalized(self.search.as_deref());
        let mut result: Vec<&Order> = orders
            .iter()
            .filter(|o| {
                query.as_deref().is_none_or(|q| {
                    o.order_number.to_lowercase().contains(q)
                        || o.shipping_address.full_name.to_lowercase().contains(q)
                })
            })
            .filter(|o| self.status.is_none_or(|s| o.order_status == s))
            .filter(|o| self.payment_method.is_none_or(|m| o.payment_method == m))
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }
}

fn normalized(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod test_support {
    use chrono::TimeZone;

    use super::*;
    use crate::address::AddressInput;
    use crate::catalog::test_support::product;
    use crate::types::AddressId;

    pub fn order(id: i32, user: i32, total: i64, status: OrderStatus, days_ago: i64) -> Order {
        let created_at = Utc.with_ymd_and_hms(2025, 6, 30, 10, 0, 0).unwrap() - Duration::days(days_ago);
        let address = AddressInput {
            full_name: format!("Customer {user}"),
            phone: "9876543210".to_owned(),
            address_line1: "1 Main Road".to_owned(),
            city: "Pune".to_owned(),
            state: "Maharashtra".to_owned(),
            pincode: "411001".to_owned(),
            ..Default::default()
        }
        .validate(AddressId::new(1))
        .unwrap();
        let p = product(1, "Thing", total, 10);
        Order {
            id: OrderId::new(id),
            order_number: format!("ORD-2025-{id:06}"),
            user_id: UserId::new(user),
            items: vec![OrderItem {
                price: p.price,
                product: p,
                quantity: 1,
            }],
            shipping_address: address.clone(),
            billing_address: address,
            payment_method: PaymentMethod::Upi,
            payment_status: PaymentStatus::Paid,
            order_status: status,
            upi_id: None,
            subtotal: Price::from_rupees(total),
            gst: Price::ZERO,
            delivery_charge: Price::ZERO,
            discount: Price::ZERO,
            total: Price::from_rupees(total),
            coupon_code: None,
            tracking_number: None,
            estimated_delivery: None,
            created_at,
            updated_at: created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::test_support::order;
    use super::*;

    #[test]
    fn test_order_number_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let number = generate_order_number(now, &mut rng);
        assert!(number.starts_with("ORD-2025-"));
        let suffix = number.trim_start_matches("ORD-2025-");
        assert_eq!(suffix.len(), 6);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_tracking_number_format() {
        let mut rng = StdRng::seed_from_u64(1);
        let tracking = generate_tracking_number(&mut rng);
        assert!(tracking.starts_with("TTD"));
        assert_eq!(tracking.len(), 13);
    }

    #[test]
    fn test_delivery_days_in_range() {
        for pin in ["110001", "400001", "560034", "999999"] {
            let days = delivery_days_for_pincode(pin);
            assert!((2..=6).contains(&days), "{pin} -> {days}");
        }
        assert_eq!(
            delivery_days_for_pincode("400001"),
            delivery_days_for_pincode("400001")
        );
    }

    #[test]
    fn test_transition_rules() {
        let now = Utc::now();
        let mut o = order(1, 1, 1000, OrderStatus::Pending, 0);
        assert!(transition(&mut o, OrderStatus::Shipped, now).is_err());
        transition(&mut o, OrderStatus::Confirmed, now).unwrap();
        transition(&mut o, OrderStatus::Cancelled, now).unwrap();
        assert_eq!(o.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_cod_delivery_marks_paid() {
        let now = Utc::now();
        let mut o = order(1, 1, 1000, OrderStatus::Shipped, 0);
        o.payment_method = PaymentMethod::Cod;
        o.payment_status = PaymentStatus::Pending;
        transition(&mut o, OrderStatus::Delivered, now).unwrap();
        assert_eq!(o.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_invalid_transition_message() {
        let mut o = order(1, 1, 1000, OrderStatus::Delivered, 0);
        let err = transition(&mut o, OrderStatus::Pending, Utc::now()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot change order from Delivered to Pending");
    }

    #[test]
    fn test_order_query_sorts_and_filters() {
        let orders = vec![
            order(1, 1, 500, OrderStatus::Delivered, 10),
            order(2, 1, 1500, OrderStatus::Pending, 1),
            order(3, 1, 900, OrderStatus::Delivered, 5),
        ];
        let ids = |q: &OrderQuery| -> Vec<i32> { q.apply(&orders).iter().map(|o| o.id.as_i32()).collect() };

        assert_eq!(ids(&OrderQuery::default()), vec![2, 3, 1]);
        assert_eq!(
            ids(&OrderQuery {
                sort: OrderSort::Lowest,
                ..Default::default()
            }),
            vec![1, 3, 2]
        );
        assert_eq!(
            ids(&OrderQuery {
                status: Some(OrderStatus::Delivered),
                sort: OrderSort::Oldest,
                ..Default::default()
            }),
            vec![1, 3]
        );
        assert_eq!(
            ids(&OrderQuery {
                search: Some("ord-2025-000003".to_owned()),
                ..Default::default()
            }),
            vec![3]
        );
    }

    #[test]
    fn test_admin_filter_matches_customer_name() {
        let mut orders = vec![
            order(1, 1, 500, OrderStatus::Pending, 2),
            order(2, 2, 700, OrderStatus::Pending, 1),
        ];
        if let Some(o) = orders.last_mut() {
            o.payment_method = PaymentMethod::Cod;
        }
        let filter = AdminOrderFilter {
            search: Some("customer 1".to_owned()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&orders).len(), 1);

        let filter = AdminOrderFilter {
            payment_method: Some(PaymentMethod::Cod),
            ..Default::default()
        };
        let result = filter.apply(&orders);
        assert_eq!(result.first().unwrap().id, OrderId::new(2));
    }
}
