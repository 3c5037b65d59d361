//! Account route handlers. Every page here requires a signed-in customer.

pub mod addresses;
pub mod orders;
pub mod payments;
pub mod settings;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::address::{Address, default_address};
use ttd_core::format::format_date;
use ttd_core::order::Order;
use ttd_core::user::User;
use ttd_core::UserId;
use ttd_store::{CustomerRepository, OrderRepository};

use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::Chrome;
use crate::services::visitor;
use crate::state::AppState;

const RECENT_ORDERS: usize = 3;

/// Load the signed-in customer's full record.
///
/// # Errors
///
/// Returns `NotFound` when the account no longer exists.
pub(crate) async fn load_user(state: &AppState, id: UserId) -> Result<User> {
    CustomerRepository::new(state.store())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("your account".to_owned()))
}

/// An order with its dates preformatted for display.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub order: Order,
    pub placed_on: String,
    pub delivery_by: Option<String>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            placed_on: format_date(order.created_at),
            delivery_by: order.estimated_delivery.map(format_date),
            order,
        }
    }
}

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    pub chrome: Chrome,
    pub user: User,
    pub member_since: String,
    pub recent_orders: Vec<OrderView>,
    pub order_count: usize,
    pub default_address: Option<Address>,
    pub wishlist_count: usize,
    pub saved_payment_count: usize,
}

/// Display the account overview.
#[instrument(skip(state, session, chrome, customer), fields(user_id = %customer.id))]
pub async fn overview(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<AccountTemplate> {
    let user = load_user(&state, customer.id).await?;
    let orders = OrderRepository::new(state.store())
        .list_for_user(user.id)
        .await?;
    let wishlist = visitor::wishlist(&session).await?;

    Ok(AccountTemplate {
        chrome,
        member_since: format_date(user.created_at),
        order_count: orders.len(),
        recent_orders: orders
            .into_iter()
            .take(RECENT_ORDERS)
            .map(OrderView::from)
            .collect(),
        default_address: default_address(&user.addresses).cloned(),
        wishlist_count: wishlist.len(),
        saved_payment_count: user.saved_cards.len() + user.saved_upi.len(),
        user,
    })
}
