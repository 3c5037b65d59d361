//! Address book handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::address::{Address, AddressInput, INDIAN_STATES};
use ttd_core::validation::FieldErrors;
use ttd_core::{AddressId, AddressType};
use ttd_store::{CustomerRepository, StoreError};

use super::load_user;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::{Chrome, Toast, flash};
use crate::state::AppState;

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub chrome: Chrome,
    pub addresses: Vec<Address>,
}

/// New/edit address form template.
#[derive(Template, WebTemplate)]
#[template(path = "account/address_form.html")]
pub struct AddressFormTemplate {
    pub chrome: Chrome,
    pub title: &'static str,
    pub action: String,
    pub form: AddressInput,
    pub errors: FieldErrors,
    pub states: &'static [&'static str],
    pub kinds: &'static [AddressType],
}

impl AddressFormTemplate {
    fn new(chrome: Chrome, title: &'static str, action: String, form: AddressInput) -> Self {
        Self {
            chrome,
            title,
            action,
            form,
            errors: FieldErrors::new(),
            states: INDIAN_STATES,
            kinds: AddressType::ALL,
        }
    }

    fn with_errors(mut self, errors: FieldErrors) -> Response {
        self.errors = errors;
        (StatusCode::UNPROCESSABLE_ENTITY, self).into_response()
    }
}

/// Display the address book.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn index(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
) -> Result<AddressesTemplate> {
    let user = load_user(&state, customer.id).await?;
    Ok(AddressesTemplate {
        chrome,
        addresses: user.addresses,
    })
}

/// Display the new address form.
pub async fn new(chrome: Chrome, RequireAuth(_customer): RequireAuth) -> AddressFormTemplate {
    AddressFormTemplate::new(
        chrome,
        "Add address",
        "/account/addresses".to_owned(),
        AddressInput::default(),
    )
}

/// Create an address.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn create(
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
        Ok(_) => {
            flash::push(&session, Toast::success("Address added")).await?;
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(StoreError::Invalid(errors)) => Ok(AddressFormTemplate::new(
            chrome,
            "Add address",
            "/account/addresses".to_owned(),
            form,
        )
        .with_errors(errors)),
        Err(e) => Err(e.into()),
    }
}

/// Display the edit form for one address.
#[instrument(skip(state, chrome, customer), fields(user_id = %customer.id))]
pub async fn edit(
    State(state): State<AppState>,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<AddressFormTemplate> {
    let user = load_user(&state, customer.id).await?;
    let address = user
        .addresses
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| AppError::NotFound("that address".to_owned()))?;

    Ok(AddressFormTemplate::new(
        chrome,
        "Edit address",
        format!("/account/addresses/{id}"),
        AddressInput::from(address),
    ))
}

/// Update an address.
#[instrument(skip(state, session, chrome, customer, form), fields(user_id = %customer.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressInput>,
) -> Result<Response> {
    match CustomerRepository::new(state.store())
        .update_address(customer.id, id, &form)
        .await
    {
        Ok(_) => {
            flash::push(&session, Toast::success("Address updated")).await?;
            Ok(Redirect::to("/account/addresses").into_response())
        }
        Err(StoreError::Invalid(errors)) => Ok(AddressFormTemplate::new(
            chrome,
            "Edit address",
            format!("/account/addresses/{id}"),
            form,
        )
        .with_errors(errors)),
        Err(StoreError::NotFound) => Err(AppError::NotFound("that address".to_owned())),
        Err(e) => Err(e.into()),
    }
}

/// Delete an address. Deleting the default promotes the next one.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    match CustomerRepository::new(state.store())
        .remove_address(customer.id, id)
        .await
    {
        Ok(()) => flash::push(&session, Toast::success("Address deleted")).await?,
        Err(StoreError::NotFound) => {
            flash::push(&session, Toast::error("Address not found")).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/account/addresses"))
}

/// Make an address the default.
#[instrument(skip(state, session, customer), fields(user_id = %customer.id))]
pub async fn set_default(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(customer): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    match CustomerRepository::new(state.store())
        .set_default_address(customer.id, id)
        .await
    {
        Ok(()) => flash::push(&session, Toast::success("Default address updated")).await?,
        Err(StoreError::NotFound) => {
            flash::push(&session, Toast::error("Address not found")).await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/account/addresses"))
}
