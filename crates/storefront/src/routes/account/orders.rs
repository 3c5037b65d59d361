//! Order history, detail and cancellation.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::order::{OrderQuery, OrderSort};
use ttd_core::validation::non_empty;
use ttd_core::{OrderId, OrderStatus};
use ttd_store::{OrderRepository, StoreError};

use super::OrderView;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Chrome, Toast, flash};
use crate::state::AppState;

/// Order history query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersParams {
    pub q: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
}

impl OrdersParams {
    /// Unknown statuses mean "all"; unknown sorts mean newest first.
    #[must_use]
    pub fn to_query(&self) -> OrderQuery {
        OrderQuery {
            search: non_empty(self.q.as_deref()),
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            sort: OrderSort::parse_or_default(self.sort.as_deref()),
        }
    }
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub chrome: Chrome,
    pub orders: Vec<OrderView>,
    /// Orders before filtering, to tell "no orders" from "no matches".
    pub total_orders: usize,
    pub search: String,
    pub status: Option<OrderStatus>,
    pub sort: OrderSort,
    pub statuses: &'static [OrderStatus],
    pub sorts: &'static [OrderSort],
}

impl OrdersTemplate {
    fn is_status(&self, status: &OrderStatus) -> bool {
        self.status == Some(*status)
    }

    fn is_sort(&self, sort: &OrderSort) -> bool {
        self.sort == *sort
    }
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order_detail.html")]
pub struct OrderDetailTemplate {
    pub chrome: Chrome,
    pub view: OrderView,
}

/// Display the order history.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Query(params): Query<OrdersParams>,
) -> Result<OrdersTemplate> {
    let all = OrderRepository::new(state.store())
        .list_for_user(customer.id)
        .await?;
    let query = params.to_query();
    let orders = query
        .apply(&all)
        .into_iter()
        .cloned()
        .map(OrderView::from)
        .collect();

    Ok(OrdersTemplate {
        chrome,
        orders,
        total_orders: all.len(),
        search: query.search.unwrap_or_default(),
        status: query.status,
        sort: query.sort,
        statuses: OrderStatus::ALL,
        sorts: OrderSort::ALL,
    })
}

/// Display one of the customer's orders.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<OrderDetailTemplate> {
    let order = OrderRepository::new(state.store())
        .get_for_user(customer.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("that order".to_owned()))?;

    Ok(OrderDetailTemplate {
        chrome,
        view: OrderView::from(order),
    })
}

/// Cancel an order that has not shipped yet.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn cancel(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    let detail = format!("/account/orders/{id}");
    match OrderRepository::new(state.store())
        .cancel(customer.id, id, Utc::now())
        .await
    {
        Ok(order) => {
            flash::push(
                &session,
                Toast::success("Order cancelled")
                    .with_description(format!("Order {} has been cancelled", order.order_number)),
            )
            .await?;
        }
        Err(StoreError::NotFound) => return Err(AppError::NotFound("that order".to_owned())),
        Err(StoreError::Order(e)) => {
            flash::push(&session, Toast::error(e.to_string())).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to(&detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_to_query() {
        let params = OrdersParams {
            q: Some("  ".to_owned()),
            status: Some("shipped".to_owned()),
            sort: Some("highest".to_owned()),
        };
        let query = params.to_query();
        assert_eq!(query.search, None);
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert_eq!(query.sort, OrderSort::Highest);

        let query = OrdersParams {
            status: Some("all".to_owned()),
            ..OrdersParams::default()
        }
        .to_query();
        assert_eq!(query.status, None);
        assert_eq!(query.sort, OrderSort::Newest);
    }
}
