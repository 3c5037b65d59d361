//! Customer management route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::format::{format_date, format_datetime};
use ttd_core::order::Order;
use ttd_core::stats::{CustomerStats, CustomerTotals, customer_totals};
use ttd_core::user::User;
use ttd_core::validation::non_empty;
use ttd_core::{CustomerStatus, UserId, UserRole};
use ttd_store::{CustomerRepository, StoreError};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::models::{Chrome, CurrentAdmin, Toast, flash};
use crate::state::AppState;

/// Customer table query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CustomersQuery {
    pub q: Option<String>,
}

/// Whether `user` matches a lowercase search on name, email or phone.
fn matches_search(user: &User, query: Option<&str>) -> bool {
    query.is_none_or(|q| {
        user.name.to_lowercase().contains(q)
            || user.email.as_str().to_lowercase().contains(q)
            || user.phone.contains(q)
    })
}

/// Customer table row.
#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub status: CustomerStatus,
    pub is_admin: bool,
    pub is_active: bool,
    pub totals: CustomerTotals,
    pub joined: String,
    pub last_order: Option<String>,
}

impl CustomerRow {
    fn new(user: &User, orders: &[Order]) -> Self {
        let totals = customer_totals(user.id, orders);
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
            phone: user.phone.clone(),
            role: user.role,
            status: user.status,
            is_admin: user.is_admin(),
            is_active: user.is_active(),
            last_order: totals.last_order_at.map(format_date),
            totals,
            joined: format_date(user.created_at),
        }
    }
}

/// Customer list page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/index.html")]
pub struct CustomersIndexTemplate {
    pub chrome: Chrome,
    pub customers: Vec<CustomerRow>,
    pub stats: CustomerStats,
    pub search: String,
}

/// One line of a customer's order history.
#[derive(Debug, Clone)]
pub struct CustomerOrderRow {
    pub order: Order,
    pub placed_on: String,
}

/// Customer detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "customers/show.html")]
pub struct CustomerShowTemplate {
    pub chrome: Chrome,
    pub user: User,
    pub totals: CustomerTotals,
    pub orders: Vec<CustomerOrderRow>,
    pub joined: String,
    pub last_login: Option<String>,
    /// The signed-in admin looking at their own account.
    pub is_self: bool,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Role change form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// Build the customers router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(index))
        .route("/customers/{id}", get(show))
        .route("/customers/{id}/status", post(update_status))
        .route("/customers/{id}/role", post(update_role))
}

/// Customer list page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn index(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(query): Query<CustomersQuery>,
) -> Result<CustomersIndexTemplate> {
    let search = non_empty(query.q.as_deref());
    let needle = search.as_deref().map(str::to_lowercase);
    let page = state
        .store()
        .read(|d| {
            let mut listed: Vec<&User> = d
                .users
                .iter()
                .filter(|u| matches_search(u, needle.as_deref()))
                .collect();
            listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            CustomersIndexTemplate {
                stats: CustomerStats::compute(&listed, &d.orders),
                customers: listed
                    .iter()
                    .map(|u| CustomerRow::new(u, &d.orders))
                    .collect(),
                search: search.clone().unwrap_or_default(),
                chrome,
            }
        })
        .await?;

    Ok(page)
}

/// Customer detail page handler.
#[instrument(skip(state, chrome, admin), fields(user_id = %admin.id))]
async fn show(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<UserId>,
) -> Result<CustomerShowTemplate> {
    let found = state
        .store()
        .read(|d| {
            d.user(id).map(|user| {
                let mut orders: Vec<&Order> =
                    d.orders.iter().filter(|o| o.user_id == id).collect();
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                (
                    user.clone(),
                    customer_totals(id, &d.orders),
                    orders
                        .into_iter()
                        .map(|o| CustomerOrderRow {
                            placed_on: format_date(o.created_at),
                            order: o.clone(),
                        })
                        .collect::<Vec<_>>(),
                )
            })
        })
        .await?;
    let Some((user, totals, orders)) = found else {
        return Err(AppError::NotFound("that customer".to_owned()));
    };

    Ok(CustomerShowTemplate {
        chrome,
        joined: format_date(user.created_at),
        last_login: user.last_login_at.map(format_datetime),
        is_self: user.id == admin.id,
        user,
        totals,
        orders,
    })
}

/// An admin may not lock themselves out.
fn refuses_self_change(
    admin: &CurrentAdmin,
    id: UserId,
    role: Option<UserRole>,
    status: Option<CustomerStatus>,
) -> bool {
    admin.id == id
        && (role == Some(UserRole::User) || status == Some(CustomerStatus::Inactive))
}

fn store_outcome(
    result: std::result::Result<User, StoreError>,
    success: impl FnOnce(&User) -> String,
) -> Result<Toast> {
    match result {
        Ok(user) => Ok(Toast::success(success(&user))),
        Err(StoreError::NotFound) => Err(AppError::NotFound("that customer".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Activate or deactivate an account.
#[instrument(skip(state, session, admin, form), fields(user_id = %admin.id, status = %form.status))]
async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<UserId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let detail = format!("/customers/{id}");
    let toast = match form.status.parse::<CustomerStatus>() {
        Err(_) => Toast::error("Unknown account status"),
        Ok(status) if refuses_self_change(&admin, id, None, Some(status)) => {
            tracing::warn!("Admin tried to deactivate their own account");
            Toast::error("You cannot deactivate your own account")
        }
        Ok(status) => store_outcome(
            CustomerRepository::new(state.store()).set_status(id, status).await,
            |user| format!("{} is now {}", user.name, status.label().to_lowercase()),
        )?,
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to(&detail))
}

/// Promote a customer to admin or demote an admin.
#[instrument(skip(state, session, admin, form), fields(user_id = %admin.id, role = %form.role))]
async fn update_role(
    State(state): State<AppState>,
    session: Session,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<UserId>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect> {
    let detail = format!("/customers/{id}");
    let toast = match form.role.parse::<UserRole>() {
        Err(_) => Toast::error("Unknown role"),
        Ok(role) if refuses_self_change(&admin, id, Some(role), None) => {
            tracing::warn!("Admin tried to remove their own admin role");
            Toast::error("You cannot remove your own admin role")
        }
        Ok(role) => store_outcome(
            CustomerRepository::new(state.store()).set_role(id, role).await,
            |user| format!("{} is now {}", user.name, role.label().to_lowercase()),
        )?,
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to(&detail))
}
