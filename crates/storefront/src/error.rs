//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. Route handlers return `Result<T, AppError>`;
//! expected failures such as bad form input are rendered by the handler and
//! never reach this type.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use ttd_store::StoreError;

use crate::filters;
use crate::services::auth::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl AppError {
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Store(err) => matches!(err, StoreError::Io(_) | StoreError::Serialization(_)),
            Self::Session(_) | Self::Internal(_) => true,
            Self::Auth(_) | Self::NotFound(_) | Self::BadRequest(_) => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(
                StoreError::Invalid(_)
                | StoreError::Cart(_)
                | StoreError::Order(_)
                | StoreError::Checkout(_),
            )
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => err.status(),
            Self::Store(_) | Self::Session(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to the visitor.
    fn public_message(&self) -> String {
        match self {
            Self::Store(StoreError::NotFound) => "The page you are looking for does not exist.".to_owned(),
            Self::NotFound(what) => format!("We couldn't find {what}."),
            Self::Store(
                err @ (StoreError::Conflict(_)
                | StoreError::Cart(_)
                | StoreError::Order(_)
                | StoreError::Checkout(_)),
            ) => err.to_string(),
            Self::Store(StoreError::Invalid(errors)) => errors
                .first()
                .unwrap_or("Please check the form and try again.")
                .to_owned(),
            Self::BadRequest(msg) => msg.clone(),
            Self::Auth(err) => err.public_message(),
            Self::Store(_) | Self::Session(_) | Self::Internal(_) => {
                "Something went wrong on our side. Please try again.".to_owned()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let title = match status {
            StatusCode::NOT_FOUND => "Page not found",
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT => "Something's not right",
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "Access denied",
            StatusCode::BAD_GATEWAY => "Service unavailable",
            _ => "Server error",
        };

        let page = ErrorTemplate {
            status: status.as_u16(),
            title,
            message: self.public_message(),
        };
        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "12")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
