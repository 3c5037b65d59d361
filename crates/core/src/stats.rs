//! Aggregates for the admin dashboard, customer list and order list.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::catalog::Product;
use crate::order::Order;
use crate::types::{OrderStatus, Price, UserId};
use crate::user::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DashboardStats {
    pub total_orders: usize,
    /// Excludes cancelled and returned orders.
    pub total_revenue: Price,
    pub total_products: usize,
    pub total_users: usize,
    pub orders_today: usize,
    pub revenue_today: Price,
    pub pending_orders: usize,
    pub low_stock_products: usize,
}

impl DashboardStats {
    /// `today` is compared by calendar date in UTC.
    #[must_use]
    pub fn compute(
        products: &[Product],
        users: &[User],
        orders: &[Order],
        now: DateTime<Utc>,
        low_stock_threshold: u32,
    ) -> Self {
        let today = now.date_naive();
        let is_today = |o: &&Order| o.created_at.date_naive() == today;
        let revenue = |o: &&Order| o.order_status.counts_as_revenue();

        Self {
            total_orders: orders.len(),
            total_revenue: orders.iter().filter(revenue).map(|o| o.total).sum(),
            total_products: products.len(),
            total_users: users.iter().filter(|u| !u.is_admin()).count(),
            orders_today: orders.iter().filter(is_today).count(),
            revenue_today: orders
                .iter()
                .filter(is_today)
                .filter(revenue)
                .map(|o| o.total)
                .sum(),
            pending_orders: orders
                .iter()
                .filter(|o| o.order_status == OrderStatus::Pending)
                .count(),
            low_stock_products: products
                .iter()
                .filter(|p| p.stock < low_stock_threshold)
                .count(),
        }
    }
}

/// Revenue per category, largest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub revenue: Price,
    pub units: u32,
}

#[must_use]
pub fn category_sales(orders: &[Order]) -> Vec<CategorySales> {
    let mut by_category: BTreeMap<&str, (Price, u32)> = BTreeMap::new();
    for item in orders
        .iter()
        .filter(|o| o.order_status.counts_as_revenue())
        .flat_map(|o| o.items.iter())
    {
        let entry = by_category
            .entry(item.product.category.as_str())
            .or_insert((Price::ZERO, 0));
        entry.0 += item.line_total();
        entry.1 += item.quantity;
    }
    let mut sales: Vec<CategorySales> = by_category
        .into_iter()
        .map(|(category, (revenue, units))| CategorySales {
            category: category.to_owned(),
            revenue,
            units,
        })
        .collect();
    sales.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    sales
}

/// Up to `limit` products under the low-stock threshold, lowest stock first.
#[must_use]
pub fn low_stock<'a>(products: &'a [Product], threshold: u32, limit: usize) -> Vec<&'a Product> {
    let mut low: Vec<&Product> = products.iter().filter(|p| p.stock < threshold).collect();
    low.sort_by_key(|p| p.stock);
    low.truncate(limit);
    low
}

/// The `limit` most recent orders.
#[must_use]
pub fn recent_orders(orders: &[Order], limit: usize) -> Vec<&Order> {
    let mut recent: Vec<&Order> = orders.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(limit);
    recent
}

/// Per-customer order totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CustomerTotals {
    pub total_orders: usize,
    pub total_spent: Price,
    pub last_order_at: Option<DateTime<Utc>>,
}

#[must_use]
pub fn customer_totals(user_id: UserId, orders: &[Order]) -> CustomerTotals {
    orders
        .iter()
        .filter(|o| o.user_id == user_id)
        .fold(CustomerTotals::default(), |mut acc, o| {
            acc.total_orders += 1;
            if o.order_status.counts_as_revenue() {
                acc.total_spent += o.total;
            }
            acc.last_order_at = acc.last_order_at.max(Some(o.created_at));
            acc
        })
}

/// Header cards on the admin customer list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CustomerStats {
    pub total: usize,
    pub active: usize,
    pub total_revenue: Price,
    /// Revenue over order count, rounded to rupees.
    pub avg_order_value: Price,
}

impl CustomerStats {
    #[must_use]
    pub fn compute(customers: &[&User], orders: &[Order]) -> Self {
        let totals: Vec<CustomerTotals> = customers
            .iter()
            .map(|u| customer_totals(u.id, orders))
            .collect();
        let total_revenue: Price = totals.iter().map(|t| t.total_spent).sum();
        let order_count: usize = totals.iter().map(|t| t.total_orders).sum();
        let avg_order_value = if order_count == 0 {
            Price::ZERO
        } else {
            Price::new(total_revenue.amount() / Decimal::from(order_count)).round_rupees()
        };
        Self {
            total: customers.len(),
            active: customers.iter().filter(|u| u.is_active()).count(),
            total_revenue,
            avg_order_value,
        }
    }
}

/// Count of orders per status, in status order, for the admin order tabs.
#[must_use]
pub fn order_status_counts(orders: &[Order]) -> Vec<(OrderStatus, usize)> {
    OrderStatus::ALL
        .iter()
        .map(|status| {
            (
                *status,
                orders.iter().filter(|o| o.order_status == *status).count(),
            )
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::test_support::product;
    use crate::order::test_support::order;
    use crate::types::{CustomerStatus, Email, UserRole};

    fn user(id: i32, role: UserRole, status: CustomerStatus) -> User {
        User {
            id: UserId::new(id),
            name: format!("User {id}"),
            email: Email::parse(&format!("user{id}@example.in")).unwrap(),
            phone: String::new(),
            avatar: None,
            addresses: Vec::new(),
            role,
            status,
            saved_cards: Vec::new(),
            saved_upi: Vec::new(),
            preferences: crate::user::NotificationPreferences::default(),
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 30, 18, 0, 0).unwrap()
    }

    #[test]
    fn test_dashboard_stats() {
        let products = vec![product(1, "A", 100, 5), product(2, "B", 100, 50)];
        let users = vec![
            user(1, UserRole::User, CustomerStatus::Active),
            user(2, UserRole::Admin, CustomerStatus::Active),
        ];
        let orders = vec![
            order(1, 1, 1000, OrderStatus::Pending, 0),
            order(2, 1, 2000, OrderStatus::Cancelled, 0),
            order(3, 1, 500, OrderStatus::Delivered, 3),
        ];
        let stats = DashboardStats::compute(&products, &users, &orders, now(), 20);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_revenue, Price::from_rupees(1500));
        assert_eq!(stats.total_products, 2);
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.orders_today, 2);
        assert_eq!(stats.revenue_today, Price::from_rupees(1000));
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.low_stock_products, 1);
    }

    #[test]
    fn test_customer_stats_average() {
        let a = user(1, UserRole::User, CustomerStatus::Active);
        let b = user(2, UserRole::User, CustomerStatus::Inactive);
        let orders = vec![
            order(1, 1, 1000, OrderStatus::Delivered, 1),
            order(2, 1, 500, OrderStatus::Delivered, 2),
            order(3, 2, 501, OrderStatus::Delivered, 3),
        ];
        let stats = CustomerStats::compute(&[&a, &b], &orders);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.total_revenue, Price::from_rupees(2001));
        // 2001 / 3 = 667
        assert_eq!(stats.avg_order_value, Price::from_rupees(667));
    }

    #[test]
    fn test_customer_stats_without_orders() {
        let a = user(1, UserRole::User, CustomerStatus::Active);
        let stats = CustomerStats::compute(&[&a], &[]);
        assert_eq!(stats.avg_order_value, Price::ZERO);
    }

    #[test]
    fn test_customer_totals_tracks_last_order() {
        let orders = vec![
            order(1, 1, 1000, OrderStatus::Delivered, 5),
            order(2, 1, 500, OrderStatus::Returned, 1),
        ];
        let totals = customer_totals(UserId::new(1), &orders);
        assert_eq!(totals.total_orders, 2);
        assert_eq!(totals.total_spent, Price::from_rupees(1000));
        assert_eq!(
            totals.last_order_at,
            orders.last().map(|o| o.created_at)
        );
    }

    #[test]
    fn test_low_stock_and_recent() {
        let products = vec![
            product(1, "A", 100, 15),
            product(2, "B", 100, 3),
            product(3, "C", 100, 40),
        ];
        let low: Vec<i32> = low_stock(&products, 20, 5)
            .iter()
            .map(|p| p.id.as_i32())
            .collect();
        assert_eq!(low, vec![2, 1]);

        let orders = vec![
            order(1, 1, 100, OrderStatus::Pending, 3),
            order(2, 1, 100, OrderStatus::Pending, 1),
            order(3, 1, 100, OrderStatus::Pending, 2),
        ];
        let recent: Vec<i32> = recent_orders(&orders, 2)
            .iter()
            .map(|o| o.id.as_i32())
            .collect();
        assert_eq!(recent, vec![2, 3]);
    }

    #[test]
    fn test_category_sales_skips_cancelled() {
        let mut fashion = order(2, 1, 700, OrderStatus::Delivered, 1);
        if let Some(item) = fashion.items.first_mut() {
            item.product.category = "Fashion".to_owned();
        }
        let orders = vec![
            order(1, 1, 1000, OrderStatus::Delivered, 1),
            fashion,
            order(3, 1, 5000, OrderStatus::Cancelled, 1),
        ];
        let sales = category_sales(&orders);
        assert_eq!(sales.len(), 2);
        assert_eq!(sales.first().unwrap().category, "Electronics");
        assert_eq!(sales.first().unwrap().revenue, Price::from_rupees(1000));
    }

    #[test]
    fn test_status_counts() {
        let orders = vec![
            order(1, 1, 100, OrderStatus::Pending, 0),
            order(2, 1, 100, OrderStatus::Pending, 0),
        ];
        let counts = order_status_counts(&orders);
        assert_eq!(counts.first(), Some(&(OrderStatus::Pending, 2)));
        assert_eq!(counts.len(), OrderStatus::ALL.len());
    }
}
