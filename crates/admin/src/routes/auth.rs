//! Authentication route handlers for admin.
//!
//! Sign-in is a stub: the password is not checked, but the email must belong
//! to an active account with the admin role.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use ttd_core::Email;
use ttd_core::validation::FieldErrors;
use ttd_store::CustomerRepository;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_admin, set_current_admin};
use crate::models::{Chrome, CurrentAdmin, Toast, flash};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub chrome: Chrome,
    pub email: String,
    pub errors: FieldErrors,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page. Signed-in admins go straight to the dashboard.
///
/// GET /auth/login
async fn login_page(chrome: Chrome) -> Response {
    if chrome.admin.is_some() {
        return Redirect::to("/").into_response();
    }
    LoginTemplate {
        chrome,
        email: String::new(),
        errors: FieldErrors::new(),
    }
    .into_response()
}

/// Sign in.
///
/// POST /auth/login
#[instrument(skip(state, session, chrome, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    chrome: Chrome,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let rejected = |errors: FieldErrors| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate {
                chrome: chrome.clone(),
                email: form.email.clone(),
                errors,
            },
        )
            .into_response()
    };

    let mut errors = FieldErrors::new();
    let email = Email::parse(&form.email)
        .map_err(|e| errors.add("email", e.to_string()))
        .ok();
    errors.check(!form.password.is_empty(), "password", "Password is required");
    let Some(email) = email.filter(|_| errors.is_empty()) else {
        return Ok(rejected(errors));
    };

    let user = CustomerRepository::new(state.store())
        .get_by_email(email.as_str())
        .await?;
    let admin = match user {
        Some(user) if user.is_admin() && user.is_active() => CurrentAdmin::from(&user),
        Some(user) if user.is_admin() => {
            tracing::warn!(user_id = %user.id, "Deactivated admin tried to sign in");
            let mut errors = FieldErrors::new();
            errors.add("form", "This account has been deactivated");
            return Ok(rejected(errors));
        }
        _ => {
            tracing::warn!("Admin sign-in refused");
            let mut errors = FieldErrors::new();
            errors.add("form", "No admin account matches that email");
            return Ok(rejected(errors));
        }
    };

    set_current_admin(&session, &admin).await?;
    set_sentry_user(admin.id, Some(admin.email.as_str()));
    tracing::info!(user_id = %admin.id, "Admin signed in");
    flash::push(&session, Toast::success(format!("Welcome back, {}", admin.name))).await?;
    Ok(Redirect::to("/").into_response())
}

/// Logout and clear session.
///
/// POST /auth/logout
async fn logout(session: Session) -> Result<Redirect> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    flash::push(&session, Toast::success("Signed out")).await?;
    Ok(Redirect::to("/auth/login"))
}
