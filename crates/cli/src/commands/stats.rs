//! Print the dashboard figures.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};
use ttd_core::stats::{self, DashboardStats};
use ttd_store::{Store, StoreData, StoreError};

const TOP_CATEGORIES: usize = 5;

/// Render the report for `data` as of `now`.
#[must_use]
pub fn report(data: &StoreData, now: DateTime<Utc>) -> String {
    let threshold = data.settings.low_stock_threshold;
    let s = DashboardStats::compute(&data.products, &data.users, &data.orders, now, threshold);

    let mut out = String::new();
    let _ = writeln!(out, "Revenue        {} ({} today)", s.total_revenue, s.revenue_today);
    let _ = writeln!(
        out,
        "Orders         {} ({} today, {} pending)",
        s.total_orders, s.orders_today, s.pending_orders
    );
    let _ = writeln!(
        out,
        "Products       {} ({} below {threshold} units)",
        s.total_products, s.low_stock_products
    );
    let _ = writeln!(out, "Customers      {}", s.total_users);

    let sales = stats::category_sales(&data.orders);
    if !sales.is_empty() {
        let _ = writeln!(out, "\nTop categories");
        for row in sales.iter().take(TOP_CATEGORIES) {
            let _ = writeln!(
                out,
                "  {:<22} {:>12}  {} units",
                row.category,
                row.revenue.to_string(),
                row.units
            );
        }
    }
    out
}

/// Print the report for the data file at `path`.
///
/// # Errors
///
/// Returns an error if the data file cannot be opened.
#[allow(clippy::print_stdout)]
pub async fn run(path: &Path) -> Result<(), StoreError> {
    let store = Store::open(path).await?;
    let now = Utc::now();
    let text = store.read(|d| report(d, now)).await?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use ttd_store::seed::seed_data;

    use super::*;

    #[test]
    fn test_report_lists_headline_figures() {
        let now = Utc::now();
        let text = report(&seed_data(now), now);
        assert!(text.starts_with("Revenue"));
        assert!(text.contains("Orders"));
        assert!(text.contains("Customers"));
        assert!(text.contains("below 20 units"));
    }
}
