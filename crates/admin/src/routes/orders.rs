//! Order management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::format::{format_date, format_datetime};
use ttd_core::order::{AdminOrderFilter, Order};
use ttd_core::stats::order_status_counts;
use ttd_core::user::User;
use ttd_core::validation::non_empty;
use ttd_core::{OrderId, OrderStatus, PaymentMethod};
use ttd_store::{OrderRepository, StoreError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Chrome, Toast, flash};
use crate::state::AppState;

/// Order table query parameters.
///
/// Unknown status or payment values mean "all".
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub q: Option<String>,
    pub status: Option<String>,
    pub payment: Option<String>,
}

impl OrdersQuery {
    fn to_filter(&self) -> AdminOrderFilter {
        AdminOrderFilter {
            search: non_empty(self.q.as_deref()),
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            payment_method: self.payment.as_deref().and_then(|m| m.parse().ok()),
        }
    }

    /// Query string that reproduces this filter, for the export link.
    fn to_query_string(&self) -> String {
        let filter = self.to_filter();
        let mut pairs = url::form_urlencoded::Serializer::new(String::new());
        if let Some(q) = &filter.search {
            pairs.append_pair("q", q);
        }
        if let Some(status) = filter.status {
            pairs.append_pair("status", status.as_str());
        }
        if let Some(method) = filter.payment_method {
            pairs.append_pair("payment", method.as_str());
        }
        pairs.finish()
    }
}

/// Order table row.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: OrderId,
    pub order_number: String,
    pub customer: String,
    pub email: String,
    pub item_count: u32,
    pub order: Order,
    pub placed_on: String,
}

impl OrderRow {
    fn new(order: &Order, users: &[User]) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            customer: order.shipping_address.full_name.clone(),
            email: users
                .iter()
                .find(|u| u.id == order.user_id)
                .map(|u| u.email.to_string())
                .unwrap_or_default(),
            item_count: order.item_count(),
            placed_on: format_date(order.created_at),
            order: order.clone(),
        }
    }
}

/// A status tab with its order count.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub status: OrderStatus,
    pub count: usize,
    pub is_current: bool,
}

/// Order list page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub chrome: Chrome,
    pub orders: Vec<OrderRow>,
    pub total: usize,
    pub tabs: Vec<StatusTab>,
    pub search: String,
    pub status: Option<OrderStatus>,
    pub payment: Option<PaymentMethod>,
    pub payment_methods: &'static [PaymentMethod],
    pub export_query: String,
}

impl OrdersIndexTemplate {
    fn is_payment(&self, method: &PaymentMethod) -> bool {
        self.payment == Some(*method)
    }
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub chrome: Chrome,
    pub order: Order,
    pub customer: Option<User>,
    pub placed_at: String,
    pub updated_at: String,
    pub delivery_by: Option<String>,
    pub next_statuses: &'static [OrderStatus],
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/export", get(export))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
}

/// Order list page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<OrdersIndexTemplate> {
    let filter = query.to_filter();
    let page = state
        .store()
        .read(|d| OrdersIndexTemplate {
            orders: filter
                .apply(&d.orders)
                .into_iter()
                .map(|o| OrderRow::new(o, &d.users))
                .collect(),
            total: d.orders.len(),
            tabs: order_status_counts(&d.orders)
                .into_iter()
                .map(|(status, count)| StatusTab {
                    status,
                    count,
                    is_current: filter.status == Some(status),
                })
                .collect(),
            search: filter.search.clone().unwrap_or_default(),
            status: filter.status,
            payment: filter.payment_method,
            payment_methods: PaymentMethod::ALL,
            export_query: query.to_query_string(),
            chrome,
        })
        .await?;

    Ok(page)
}

/// Download the filtered orders as a JSON attachment.
#[instrument(skip(state, admin), fields(user_id = %admin.id))]
async fn export(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<OrdersQuery>,
) -> Result<Response> {
    let filter = query.to_filter();
    let body = state
        .store()
        .read(|d| serde_json::to_string_pretty(&filter.apply(&d.orders)))
        .await?
        .map_err(|e| AppError::Internal(format!("order export failed: {e}")))?;

    let filename = format!("orders-{}.json", Utc::now().format("%Y%m%d"));
    tracing::info!(%filename, "Orders exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// Order detail page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn show(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
) -> Result<OrderShowTemplate> {
    let (order, customer) = state
        .store()
        .read(|d| {
            d.order(id)
                .map(|o| (o.clone(), d.user(o.user_id).cloned()))
        })
        .await?
        .ok_or_else(|| AppError::NotFound("that order".to_owned()))?;

    Ok(OrderShowTemplate {
        chrome,
        placed_at: format_datetime(order.created_at),
        updated_at: format_datetime(order.updated_at),
        delivery_by: order.estimated_delivery.map(format_date),
        next_statuses: order.order_status.next_statuses(),
        customer,
        order,
    })
}

/// Move an order to a new status.
#[instrument(skip(state, session, admin, form), fields(user_id = %admin.id, status = %form.status))]
async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let detail = format!("/orders/{id}");
    let Ok(next) = form.status.parse::<OrderStatus>() else {
        flash::push(&session, Toast::error("Unknown order status")).await?;
        return Ok(Redirect::to(&detail));
    };

    let toast = match OrderRepository::new(state.store())
        .update_status(id, next, Utc::now())
        .await
    {
        Ok(order) => Toast::success(format!("Order marked {}", next.label()))
            .with_description(order.order_number),
        Err(StoreError::Order(e)) => Toast::error(e.to_string()),
        Err(StoreError::NotFound) => return Err(AppError::NotFound("that order".to_owned())),
        Err(e) => return Err(e.into()),
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to(&detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_filters_mean_all() {
        let query = OrdersQuery {
            q: None,
            status: Some("lost".to_owned()),
            payment: Some("barter".to_owned()),
        };
        let filter = query.to_filter();
        assert!(filter.status.is_none());
        assert!(filter.payment_method.is_none());
        assert_eq!(query.to_query_string(), "");
    }

    #[test]
    fn test_export_query_keeps_filters() {
        let query = OrdersQuery {
            q: Some("Asha Rao".to_owned()),
            status: Some("shipped".to_owned()),
            payment: Some("cod".to_owned()),
        };
        assert_eq!(
            query.to_query_string(),
            "q=Asha+Rao&status=shipped&payment=cod"
        );
    }
}
