//! Saved cards and UPI ids.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::SavedPaymentId;
use ttd_core::user::{CardInput, SavedCard, SavedUpi};
use ttd_core::validation::FieldErrors;
use ttd_store::{CustomerRepository, StoreError};

use super::load_user;
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Chrome, Toast, flash};
use crate::state::AppState;

const PAYMENTS_PATH: &str = "/account/payments";

/// Add UPI form data.
#[derive(Debug, Default, Deserialize)]
pub struct UpiForm {
    #[serde(default)]
    pub upi_id: String,
}

/// Saved payment methods template. Both forms live on the same page.
#[derive(Template, WebTemplate)]
#[template(path = "account/payments.html")]
pub struct PaymentsTemplate {
    pub chrome: Chrome,
    pub cards: Vec<SavedCard>,
    pub upis: Vec<SavedUpi>,
    pub card_form: CardInput,
    pub upi_form: UpiForm,
    pub errors: FieldErrors,
}

async fn render(
    state: &AppState,
    chrome: Chrome,
    customer_id: ttd_core::UserId,
    card_form: CardInput,
    upi_form: UpiForm,
    errors: FieldErrors,
) -> Result<PaymentsTemplate> {
    let user = load_user(state, customer_id).await?;
    Ok(PaymentsTemplate {
        chrome,
        cards: user.saved_cards,
        upis: user.saved_upi,
        card_form,
        upi_form,
        errors,
    })
}

/// Display saved payment methods.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<PaymentsTemplate> {
    render(
        &state,
        chrome,
        customer.id,
        CardInput::default(),
        UpiForm::default(),
        FieldErrors::new(),
    )
    .await
}

/// Save a card. The CVV is validated and then discarded.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn add_card(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<CardInput>,
) -> Result<Response> {
    match CustomerRepository::new(state.store())
        .add_card(customer.id, &form)
        .await
    {
        Ok(card) => {
            flash::push(
                &session,
                Toast::success("Card saved").with_description(card.masked_number()),
            )
            .await?;
            Ok(Redirect::to(PAYMENTS_PATH).into_response())
        }
        Err(StoreError::Invalid(errors)) => {
            // Never echo the card number or CVV back into the page.
            let retry = CardInput {
                holder_name: form.holder_name,
                expiry: form.expiry,
                ..CardInput::default()
            };
            let page = render(&state, chrome, customer.id, retry, UpiForm::default(), errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Save a UPI id.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn add_upi(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Form(form): Form<UpiForm>,
) -> Result<Response> {
    match CustomerRepository::new(state.store())
        .add_upi(customer.id, &form.upi_id)
        .await
    {
        Ok(upi) => {
            flash::push(
                &session,
                Toast::success("UPI ID saved").with_description(upi.upi_id),
            )
            .await?;
            Ok(Redirect::to(PAYMENTS_PATH).into_response())
        }
        Err(StoreError::Invalid(errors)) => {
            let page = render(&state, chrome, customer.id, CardInput::default(), form, errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Make a card or UPI id the default of its kind.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn set_default(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<SavedPaymentId>,
) -> Result<Redirect> {
    let toast = match CustomerRepository::new(state.store())
        .set_default_payment(customer.id, id)
        .await
    {
        Ok(()) => Toast::success("Default payment method updated"),
        Err(StoreError::NotFound) => Toast::error("Payment method not found"),
        Err(e) => return Err(e.into()),
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to(PAYMENTS_PATH))
}

/// Delete a card or UPI id.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<SavedPaymentId>,
) -> Result<Redirect> {
    let toast = match CustomerRepository::new(state.store())
        .remove_payment(customer.id, id)
        .await
    {
        Ok(()) => Toast::success("Payment method removed"),
        Err(StoreError::NotFound) => Toast::error("Payment method not found"),
        Err(e) => return Err(e.into()),
    };
    flash::push(&session, toast).await?;
    Ok(Redirect::to(PAYMENTS_PATH))
}
