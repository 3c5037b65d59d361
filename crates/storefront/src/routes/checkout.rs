//! Three-step checkout: address, payment, review.
//!
//! Choices are kept in a [`CheckoutDraft`] in the session until the order
//! is placed. Every step re-prices the cart against the chosen address so
//! the GST split shown matches what will be charged.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::address::{Address, AddressInput, INDIAN_STATES, default_address};
use ttd_core::user::{SavedUpi, User};
use ttd_core::validation::{FieldErrors, is_valid_upi_id, non_empty};
use ttd_core::{AddressId, AddressType, OrderId, PaymentMethod};
use ttd_store::{CheckoutError, CustomerRepository, OrderRepository, PlaceOrder, StoreError};

use super::account::{OrderView, load_user};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{CheckoutDraft, Chrome, Toast, flash};
use crate::services::visitor::{self, CartSummary};
use crate::state::AppState;

const ADDRESS_STEP: &str = "/checkout/address";
const PAYMENT_STEP: &str = "/checkout/payment";
const REVIEW_STEP: &str = "/checkout/review";

// =============================================================================
// Form Types
// =============================================================================

/// Saved address choice.
#[derive(Debug, Deserialize)]
pub struct ChooseAddressForm {
    pub address_id: AddressId,
}

/// Payment method choice.
#[derive(Debug, Deserialize)]
pub struct ChoosePaymentForm {
    pub payment_method: String,
    pub upi_id: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Step 1: pick or add a delivery address.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/address.html")]
pub struct AddressStepTemplate {
    pub chrome: Chrome,
    pub cart: CartSummary,
    pub addresses: Vec<Address>,
    pub selected: Option<AddressId>,
    pub form: AddressInput,
    pub errors: FieldErrors,
    pub states: &'static [&'static str],
    pub kinds: &'static [AddressType],
}

impl AddressStepTemplate {
    fn is_selected(&self, id: &AddressId) -> bool {
        self.selected == Some(*id)
    }
}

/// Step 2: pick a payment method.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentStepTemplate {
    pub chrome: Chrome,
    pub cart: CartSummary,
    pub address: Address,
    pub methods: &'static [PaymentMethod],
    pub selected: PaymentMethod,
    pub upi_id: String,
    pub saved_upi: Vec<SavedUpi>,
}

impl PaymentStepTemplate {
    fn is_selected(&self, method: &PaymentMethod) -> bool {
        self.selected == *method
    }
}

/// Step 3: review and place.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewStepTemplate {
    pub chrome: Chrome,
    pub cart: CartSummary,
    pub address: Address,
    pub payment_method: PaymentMethod,
    pub upi_id: Option<String>,
}

/// Order confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct OrderSuccessTemplate {
    pub chrome: Chrome,
    pub view: OrderView,
}

// =============================================================================
// Step resolution
// =============================================================================

/// The draft's address, if it still belongs to the customer.
fn chosen_address<'a>(draft: &CheckoutDraft, user: &'a User) -> Option<&'a Address> {
    let id = draft.address_id?;
    user.addresses.iter().find(|a| a.id == id)
}

/// First step the draft has not completed.
fn resume_path(draft: &CheckoutDraft, user: &User) -> &'static str {
    if chosen_address(draft, user).is_none() {
        ADDRESS_STEP
    } else if draft.payment_method.is_none() {
        PAYMENT_STEP
    } else {
        REVIEW_STEP
    }
}

/// Cart summary priced for `address`, or `None` when the cart is empty.
async fn priced_cart(
    state: &AppState,
    session: &Session,
    address: Option<&Address>,
) -> Result<Option<CartSummary>> {
    let mut cart = visitor::cart(session).await?;
    let summary = visitor::summarize(
        state.store(),
        &mut cart,
        address.map(|a| a.state.as_str()),
        Utc::now(),
    )
    .await?;
    visitor::save_cart(session, &cart).await?;
    Ok((!summary.is_empty()).then_some(summary))
}

async fn empty_cart_redirect(session: &Session) -> Result<Response> {
    flash::push(session, Toast::error("Your cart is empty")).await?;
    Ok(Redirect::to("/cart").into_response())
}

// =============================================================================
// Handlers
// =============================================================================

/// Resume checkout at the first incomplete step.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Result<Response> {
    let cart = visitor::cart(&session).await?;
    if cart.is_empty() {
        return empty_cart_redirect(&session).await;
    }
    let user = load_user(&state, customer.id).await?;
    let draft = visitor::checkout_draft(&session).await?;
    Ok(Redirect::to(resume_path(&draft, &user)).into_response())
}

async fn render_address_step(
    state: &AppState,
    session: &Session,
    chrome: Chrome,
    user: User,
    form: AddressInput,
    errors: FieldErrors,
) -> Result<Response> {
    let draft = visitor::checkout_draft(session).await?;
    let selected = chosen_address(&draft, &user)
        .or_else(|| default_address(&user.addresses))
        .map(|a| a.id);
    let Some(cart) = priced_cart(state, session, None).await? else {
        return empty_cart_redirect(session).await;
    };

    let status = if errors.is_empty() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    let page = AddressStepTemplate {
        chrome,
        cart,
        addresses: user.addresses,
        selected,
        form,
        errors,
        states: INDIAN_STATES,
        kinds: AddressType::ALL,
    };
    Ok((status, page).into_response())
}

/// Step 1: delivery address.
#[instrument(skip(state, session, chrome, customer), fields(user_id = %customer.id))]
pub async fn address_step(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<Response> {
    let user = load_user(&state, customer.id).await?;
    let form = AddressInput {
        full_name: user.name.clone(),
        phone: user.phone.clone(),
        ..AddressInput::default()
    };
    render_address_step(&state, &session, chrome, user, form, FieldErrors::new()).await
}

/// Use a saved address.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn choose_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<ChooseAddressForm>,
) -> Result<Redirect> {
    let user = load_user(&state, customer.id).await?;
    if !user.addresses.iter().any(|a| a.id == form.address_id) {
        flash::push(&session, Toast::error(CheckoutError::AddressRequired.to_string())).await?;
        return Ok(Redirect::to(ADDRESS_STEP));
    }

    let mut draft = visitor::checkout_draft(&session).await?;
    draft.address_id = Some(form.address_id);
    visitor::save_checkout_draft(&session, &draft).await?;
    Ok(Redirect::to(PAYMENT_STEP))
}

/// Add an address from the checkout page and select it.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn add_address(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<AddressInput>,
) -> Result<Response> {
    match CustomerRepository::new(state.store())
        .add_address(customer.id, &form)
        .await
    {
        Ok(address) => {
            let mut draft = visitor::checkout_draft(&session).await?;
            draft.address_id = Some(address.id);
            visitor::save_checkout_draft(&session, &draft).await?;
            flash::push(&session, Toast::success("Address added")).await?;
            Ok(Redirect::to(PAYMENT_STEP).into_response())
        }
        Err(StoreError::Invalid(errors)) => {
            let user = load_user(&state, customer.id).await?;
            render_address_step(&state, &session, chrome, user, form, errors).await
        }
        Err(e) => Err(e.into()),
    }
}

/// Step 2: payment method.
#[instrument(skip(state, session, chrome, customer), fields(user_id = %customer.id))]
pub async fn payment_step(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<Response> {
    let user = load_user(&state, customer.id).await?;
    let draft = visitor::checkout_draft(&session).await?;
    let Some(address) = chosen_address(&draft, &user).cloned() else {
        return Ok(Redirect::to(ADDRESS_STEP).into_response());
    };
    let Some(cart) = priced_cart(&state, &session, Some(&address)).await? else {
        return empty_cart_redirect(&session).await;
    };

    let upi_id = draft
        .upi_id
        .clone()
        .or_else(|| {
            user.saved_upi
                .iter()
                .find(|u| u.is_default)
                .map(|u| u.upi_id.clone())
        })
        .unwrap_or_default();

    Ok(PaymentStepTemplate {
        chrome,
        cart,
        address,
        methods: PaymentMethod::ALL,
        selected: draft.payment_method.unwrap_or(PaymentMethod::Upi),
        upi_id,
        saved_upi: user.saved_upi,
    }
    .into_response())
}

/// Choose a payment method. UPI needs a well-formed id.
#[instrument(skip(session, customer, form), fields(user_id = %customer.id))]
pub async fn choose_payment(
    session: Session,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<ChoosePaymentForm>,
) -> Result<Redirect> {
    let Ok(method) = form.payment_method.parse::<PaymentMethod>() else {
        flash::push(&session, Toast::error("Please choose a payment method")).await?;
        return Ok(Redirect::to(PAYMENT_STEP));
    };

    let upi_id = non_empty(form.upi_id.as_deref());
    if method == PaymentMethod::Upi {
        let problem = match upi_id.as_deref() {
            None => Some(CheckoutError::UpiIdRequired),
            Some(id) if !is_valid_upi_id(id) => Some(CheckoutError::InvalidUpiId),
            Some(_) => None,
        };
        if let Some(problem) = problem {
            flash::push(&session, Toast::error(problem.to_string())).await?;
            return Ok(Redirect::to(PAYMENT_STEP));
        }
    }

    let mut draft = visitor::checkout_draft(&session).await?;
    draft.payment_method = Some(method);
    draft.upi_id = if method == PaymentMethod::Upi { upi_id } else { None };
    visitor::save_checkout_draft(&session, &draft).await?;
    Ok(Redirect::to(REVIEW_STEP))
}

/// Step 3: review the order.
#[instrument(skip(state, session, chrome, customer), fields(user_id = %customer.id))]
pub async fn review_step(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<Response> {
    let user = load_user(&state, customer.id).await?;
    let draft = visitor::checkout_draft(&session).await?;
    let (Some(address), Some(payment_method)) =
        (chosen_address(&draft, &user).cloned(), draft.payment_method)
    else {
        return Ok(Redirect::to(resume_path(&draft, &user)).into_response());
    };
    let Some(cart) = priced_cart(&state, &session, Some(&address)).await? else {
        return empty_cart_redirect(&session).await;
    };

    Ok(ReviewStepTemplate {
        chrome,
        cart,
        address,
        payment_method,
        upi_id: draft.upi_id,
    }
    .into_response())
}

/// Where to send the customer after a checkout failure.
const fn recovery_path(err: &CheckoutError) -> &'static str {
    match err {
        CheckoutError::EmptyCart
        | CheckoutError::ProductUnavailable
        | CheckoutError::OutOfStock { .. }
        | CheckoutError::InsufficientStock { .. } => "/cart",
        CheckoutError::AddressRequired => ADDRESS_STEP,
        CheckoutError::UpiIdRequired | CheckoutError::InvalidUpiId => PAYMENT_STEP,
        CheckoutError::Coupon(_) => REVIEW_STEP,
    }
}

/// Place the order, then empty the cart and forget the draft.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
) -> Result<Redirect> {
    let mut cart = visitor::cart(&session).await?;
    let draft = visitor::checkout_draft(&session).await?;
    let (Some(address_id), Some(payment_method)) = (draft.address_id, draft.payment_method) else {
        flash::push(&session, Toast::error("Please complete the previous steps")).await?;
        return Ok(Redirect::to("/checkout"));
    };

    let request = PlaceOrder {
        user_id: customer.id,
        lines: cart.lines.clone(),
        coupon_code: cart.coupon_code.clone(),
        address_id,
        payment_method,
        upi_id: draft.upi_id,
    };

    match OrderRepository::new(state.store())
        .place(request, Utc::now())
        .await
    {
        Ok(order) => {
            cart.clear();
            visitor::save_cart(&session, &cart).await?;
            visitor::clear_checkout_draft(&session).await?;
            flash::push(
                &session,
                Toast::success("Order placed successfully")
                    .with_description(format!("Order {}", order.order_number)),
            )
            .await?;
            Ok(Redirect::to(&format!("/orders/{}/success", order.id)))
        }
        Err(StoreError::Checkout(err)) => {
            tracing::info!(error = %err, "Checkout rejected");
            if matches!(err, CheckoutError::Coupon(_)) {
                cart.remove_coupon();
                visitor::save_cart(&session, &cart).await?;
            }
            flash::push(
                &session,
                Toast::error("Could not place order").with_description(err.to_string()),
            )
            .await?;
            Ok(Redirect::to(recovery_path(&err)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Order confirmation page.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn success(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<OrderSuccessTemplate> {
    let order = OrderRepository::new(state.store())
        .get_for_user(customer.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("that order".to_owned()))?;

    Ok(OrderSuccessTemplate {
        chrome,
        view: OrderView::from(order),
    })
}
