//! Authentication route handlers.
//!
//! Sign-in is by email and password or by a one-time code sent to a phone.
//! Both go through [`crate::services::auth::AuthService`], which either
//! accepts any well-formed credentials (mock mode) or defers to the remote
//! auth API. The post-login destination travels as `?redirect=` on every
//! form action and is only honoured for local paths.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::Email;
use ttd_core::user::RegistrationInput;
use ttd_core::validation::{FieldErrors, is_valid_otp, normalize_phone};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::auth::safe_redirect;
use crate::middleware::{OptionalAuth, clear_current_customer, set_current_customer};
use crate::models::{Chrome, CurrentCustomer, Toast, flash};
use crate::services::auth::{AuthError, MIN_LOGIN_PASSWORD_LENGTH, SignedIn};
use crate::services::visitor;
use crate::state::AppState;

// =============================================================================
// Query and Form Types
// =============================================================================

/// Query parameters shared by the auth pages and their form actions.
#[derive(Debug, Default, Deserialize)]
pub struct AuthQuery {
    pub redirect: Option<String>,
    /// `phone` selects the one-time-code tab.
    pub method: Option<String>,
    /// Phone a code was just sent to.
    pub phone: Option<String>,
}

impl AuthQuery {
    fn destination(&self) -> String {
        safe_redirect(self.redirect.as_deref()).to_owned()
    }
}

/// Email sign-in form.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request a one-time code.
#[derive(Debug, Default, Deserialize)]
pub struct SendOtpForm {
    #[serde(default)]
    pub phone: String,
}

/// Verify a one-time code.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyOtpForm {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub otp: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    /// `?redirect=...` to append to form actions and tab links.
    pub query: String,
    pub phone_mode: bool,
    pub email: String,
    pub phone: String,
    /// A code was issued; show the code entry step.
    pub otp_sent: bool,
    pub errors: FieldErrors,
    pub is_mock: bool,
}

impl LoginTemplate {
    fn new(chrome: Chrome, state: &AppState, destination: &str) -> Self {
        let features = chrome.features;
        Self {
            chrome,
            query: redirect_query(destination),
            phone_mode: !features.email_login && features.phone_login,
            email: String::new(),
            phone: String::new(),
            otp_sent: false,
            errors: FieldErrors::new(),
            is_mock: state.auth().is_mock(),
        }
    }

    fn rejected(mut self, status: StatusCode, errors: FieldErrors) -> Response {
        self.errors = errors;
        (status, self).into_response()
    }
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub chrome: Chrome,
    pub query: String,
    /// Submitted values with the passwords blanked.
    pub form: RegistrationInput,
    pub errors: FieldErrors,
}

/// `?redirect=...`, or nothing for the default destination.
fn redirect_query(destination: &str) -> String {
    if destination == "/" {
        String::new()
    } else {
        format!("?redirect={}", urlencoding::encode(destination))
    }
}

/// Field errors carrying a single form-level message.
fn form_error(message: String) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.add("form", message);
    errors
}

/// Put the signed-in customer in the session and say hello.
async fn complete_sign_in(session: &Session, signed_in: SignedIn, destination: &str) -> Result<Redirect> {
    let customer = CurrentCustomer::from_user(&signed_in.user, signed_in.token);
    set_current_customer(session, &customer).await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));
    flash::push(
        session,
        Toast::success(format!("Welcome, {}", customer.first_name())),
    )
    .await?;
    Ok(Redirect::to(destination))
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page. Signed-in visitors go straight on.
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(customer): OptionalAuth,
    chrome: Chrome,
    Query(query): Query<AuthQuery>,
) -> Response {
    let destination = query.destination();
    if customer.is_some() {
        return Redirect::to(&destination).into_response();
    }

    let features = chrome.features;
    let mut page = LoginTemplate::new(chrome, &state, &destination);
    if features.phone_login && query.method.as_deref() == Some("phone") {
        page.phone_mode = true;
    }
    if let Some(phone) = query.phone.as_deref().and_then(normalize_phone) {
        page.phone_mode = true;
        page.otp_sent = true;
        page.phone = phone;
    }
    page.into_response()
}

/// Email and password sign-in.
#[instrument(skip(state, session, chrome, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Query(query): Query<AuthQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    if !state.config().features.email_login {
        return Err(AppError::BadRequest("Email sign-in is disabled".to_owned()));
    }
    let destination = query.destination();
    let mut page = LoginTemplate::new(chrome, &state, &destination);
    page.email = form.email.trim().to_owned();

    let mut errors = FieldErrors::new();
    let email = Email::parse(&form.email);
    if form.email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if email.is_err() {
        errors.add("email", "Please enter a valid email");
    }
    if form.password.is_empty() {
        errors.add("password", "Password is required");
    } else if form.password.chars().count() < MIN_LOGIN_PASSWORD_LENGTH {
        errors.add(
            "password",
            format!("Password must be at least {MIN_LOGIN_PASSWORD_LENGTH} characters"),
        );
    }
    let Ok(email) = email else {
        return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY, errors));
    };
    if !errors.is_empty() {
        return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY, errors));
    }

    let password = SecretString::from(form.password);
    match state.auth().login_with_email(&email, &password, Utc::now()).await {
        Ok(signed_in) => Ok(complete_sign_in(&session, signed_in, &destination)
            .await?
            .into_response()),
        Err(err @ AuthError::Store(_)) => Err(err.into()),
        Err(err) => {
            tracing::info!(error = %err, "Email sign-in refused");
            Ok(page.rejected(err.status(), form_error(err.public_message())))
        }
    }
}

/// Send a one-time code to a phone.
#[instrument(skip(state, session, chrome, form))]
pub async fn send_otp(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Query(query): Query<AuthQuery>,
    Form(form): Form<SendOtpForm>,
) -> Result<Response> {
    if !state.config().features.phone_login {
        return Err(AppError::BadRequest("Phone sign-in is disabled".to_owned()));
    }
    let destination = query.destination();
    let mut page = LoginTemplate::new(chrome, &state, &destination);
    page.phone_mode = true;
    page.phone = form.phone.trim().to_owned();

    let Some(phone) = normalize_phone(&form.phone) else {
        let mut errors = FieldErrors::new();
        errors.add("phone", "Please enter a valid 10-digit phone number");
        return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY, errors));
    };

    match state.auth().send_otp(&phone).await {
        Ok(issued) => {
            let mut toast = Toast::success(issued.message);
            if let Some(code) = issued.dev_code {
                toast = toast.with_description(format!("Demo mode: your code is {code}"));
            }
            flash::push(&session, toast).await?;

            let mut target = format!("/auth/login?method=phone&phone={phone}");
            if destination != "/" {
                target.push_str("&redirect=");
                target.push_str(&urlencoding::encode(&destination));
            }
            Ok(Redirect::to(&target).into_response())
        }
        Err(err @ AuthError::Store(_)) => Err(err.into()),
        Err(err) => {
            tracing::info!(error = %err, "OTP request refused");
            Ok(page.rejected(err.status(), form_error(err.public_message())))
        }
    }
}

/// Verify a one-time code and sign in.
#[instrument(skip(state, session, chrome, form))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Query(query): Query<AuthQuery>,
    Form(form): Form<VerifyOtpForm>,
) -> Result<Response> {
    if !state.config().features.phone_login {
        return Err(AppError::BadRequest("Phone sign-in is disabled".to_owned()));
    }
    let destination = query.destination();
    let mut page = LoginTemplate::new(chrome, &state, &destination);
    page.phone_mode = true;
    page.otp_sent = true;

    let Some(phone) = normalize_phone(&form.phone) else {
        page.otp_sent = false;
        let mut errors = FieldErrors::new();
        errors.add("phone", "Please enter a valid 10-digit phone number");
        return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY, errors));
    };
    page.phone.clone_from(&phone);

    if !is_valid_otp(&form.otp) {
        let mut errors = FieldErrors::new();
        errors.add("otp", "Please enter the 6-digit code");
        return Ok(page.rejected(StatusCode::UNPROCESSABLE_ENTITY, errors));
    }

    match state.auth().verify_otp(&phone, &form.otp, Utc::now()).await {
        Ok(signed_in) => Ok(complete_sign_in(&session, signed_in, &destination)
            .await?
            .into_response()),
        Err(err @ AuthError::Store(_)) => Err(err.into()),
        Err(err) => {
            tracing::info!(error = %err, "OTP verification refused");
            if matches!(err, AuthError::OtpExpired) {
                page.otp_sent = false;
            }
            Ok(page.rejected(err.status(), form_error(err.public_message())))
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(
    OptionalAuth(customer): OptionalAuth,
    chrome: Chrome,
    Query(query): Query<AuthQuery>,
) -> Response {
    let destination = query.destination();
    if customer.is_some() {
        return Redirect::to(&destination).into_response();
    }
    RegisterTemplate {
        chrome,
        query: redirect_query(&destination),
        form: RegistrationInput::default(),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Create an account and sign in.
#[instrument(skip(state, session, chrome, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Query(query): Query<AuthQuery>,
    Form(form): Form<RegistrationInput>,
) -> Result<Response> {
    let destination = query.destination();
    let validated = form.validate();
    let password = SecretString::from(form.password.clone());

    let page = |errors: FieldErrors, status: StatusCode| {
        let page = RegisterTemplate {
            chrome,
            query: redirect_query(&destination),
            form: RegistrationInput {
                password: String::new(),
                confirm_password: String::new(),
                ..form
            },
            errors,
        };
        (status, page).into_response()
    };

    let registration = match validated {
        Ok(registration) => registration,
        Err(errors) => return Ok(page(errors, StatusCode::UNPROCESSABLE_ENTITY)),
    };

    match state.auth().register(registration, &password, Utc::now()).await {
        Ok(signed_in) => Ok(complete_sign_in(&session, signed_in, &destination)
            .await?
            .into_response()),
        Err(AuthError::AccountExists) => {
            let mut errors = FieldErrors::new();
            errors.add("email", AuthError::AccountExists.public_message());
            Ok(page(errors, StatusCode::CONFLICT))
        }
        Err(err @ AuthError::Store(_)) => Err(err.into()),
        Err(err) => {
            tracing::info!(error = %err, "Registration refused");
            let status = err.status();
            Ok(page(form_error(err.public_message()), status))
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out. The cart and wishlist stay with the visitor.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    if let Some(customer) = clear_current_customer(&session).await? {
        state.auth().logout(customer.token.as_deref()).await;
        tracing::info!(user_id = %customer.id, "Signed out");
    }
    visitor::clear_checkout_draft(&session).await?;
    clear_sentry_user();
    flash::push(&session, Toast::success("You have been signed out")).await?;
    Ok(Redirect::to("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_query() {
        assert_eq!(redirect_query("/"), "");
        assert_eq!(
            redirect_query("/checkout/review"),
            "?redirect=%2Fcheckout%2Freview"
        );
    }

    #[test]
    fn test_destination_rejects_offsite() {
        let query = AuthQuery {
            redirect: Some("https://evil.example/".to_owned()),
            ..AuthQuery::default()
        };
        assert_eq!(query.destination(), "/");

        let query = AuthQuery {
            redirect: Some("/account/orders".to_owned()),
            ..AuthQuery::default()
        };
        assert_eq!(query.destination(), "/account/orders");
    }
}
