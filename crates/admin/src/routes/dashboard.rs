//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::instrument;
use ttd_core::format::format_relative;
use ttd_core::order::Order;
use ttd_core::stats::{self, CategorySales, DashboardStats};
use ttd_core::{OrderId, OrderStatus, Price, ProductId};

use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::Chrome;
use crate::state::AppState;

const RECENT_ORDERS: usize = 5;
const LOW_STOCK_ROWS: usize = 5;
const TOP_CATEGORIES: usize = 6;

/// Recent order row.
#[derive(Debug, Clone)]
pub struct RecentOrderView {
    pub id: OrderId,
    pub order_number: String,
    pub customer: String,
    pub total: Price,
    pub status: OrderStatus,
    pub placed: String,
}

impl RecentOrderView {
    fn new(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            customer: order.shipping_address.full_name.clone(),
            total: order.total,
            status: order.order_status,
            placed: format_relative(order.created_at, now),
        }
    }
}

/// Low stock row.
#[derive(Debug, Clone)]
pub struct LowStockView {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub stock: u32,
}

/// One bar of the sales-by-category chart.
#[derive(Debug, Clone)]
pub struct CategoryBar {
    pub category: String,
    pub revenue: Price,
    pub units: u32,
    /// Width relative to the best-selling category, 0-100.
    pub percent: u32,
}

fn category_bars(sales: Vec<CategorySales>) -> Vec<CategoryBar> {
    let top = sales.first().map_or(Decimal::ZERO, |s| s.revenue.amount());
    sales
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|s| {
            let percent = if top.is_zero() {
                0
            } else {
                (s.revenue.amount() * Decimal::ONE_HUNDRED / top)
                    .round()
                    .to_u32()
                    .unwrap_or(0)
            };
            CategoryBar {
                category: s.category,
                revenue: s.revenue,
                units: s.units,
                percent,
            }
        })
        .collect()
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: Chrome,
    pub stats: DashboardStats,
    pub recent_orders: Vec<RecentOrderView>,
    pub low_stock: Vec<LowStockView>,
    pub low_stock_threshold: u32,
    pub categories: Vec<CategoryBar>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(dashboard))
}

/// Dashboard page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn dashboard(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
) -> Result<DashboardTemplate> {
    let now = Utc::now();
    let page = state
        .store()
        .read(|d| {
            let threshold = d.settings.low_stock_threshold;
            DashboardTemplate {
                chrome,
                stats: DashboardStats::compute(&d.products, &d.users, &d.orders, now, threshold),
                recent_orders: stats::recent_orders(&d.orders, RECENT_ORDERS)
                    .into_iter()
                    .map(|o| RecentOrderView::new(o, now))
                    .collect(),
                low_stock: stats::low_stock(&d.products, threshold, LOW_STOCK_ROWS)
                    .into_iter()
                    .map(|p| LowStockView {
                        id: p.id,
                        name: p.name.clone(),
                        sku: p.sku.clone(),
                        stock: p.stock,
                    })
                    .collect(),
                low_stock_threshold: threshold,
                categories: category_bars(stats::category_sales(&d.orders)),
            }
        })
        .await?;

    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales(category: &str, rupees: i64) -> CategorySales {
        CategorySales {
            category: category.to_owned(),
            revenue: Price::from_rupees(rupees),
            units: 1,
        }
    }

    #[test]
    fn test_category_bars_scale_to_leader() {
        let bars = category_bars(vec![sales("Laptops", 80_000), sales("Audio", 20_000)]);
        assert_eq!(bars[0].percent, 100);
        assert_eq!(bars[1].percent, 25);
    }

    #[test]
    fn test_category_bars_without_revenue() {
        let bars = category_bars(vec![sales("Laptops", 0)]);
        assert_eq!(bars[0].percent, 0);
        assert!(category_bars(Vec::new()).is_empty());
    }
}
