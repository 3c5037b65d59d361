//! Authentication middleware and extractors for admin.
//!
//! The session only records who signed in. Every protected request looks the
//! account up again, so a demotion or deactivation (from another admin or the
//! CLI) takes effect on the next click.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use ttd_store::CustomerRepository;

use crate::error::AppError;
use crate::models::{CurrentAdmin, session_keys};
use crate::state::AppState;

/// Login page path.
pub const LOGIN_PATH: &str = "/auth/login";

/// Extractor that requires an active admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdminAuth(admin): RequireAdminAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdminAuth(pub CurrentAdmin);

/// Error returned when admin authentication is required.
pub enum AdminAuthRejection {
    /// Redirect to login page.
    RedirectToLogin,
    /// The session or store could not be read.
    Failed(AppError),
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(LOGIN_PATH).into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl From<AppError> for AdminAuthRejection {
    fn from(err: AppError) -> Self {
        Self::Failed(err)
    }
}

impl From<tower_sessions::session::Error> for AdminAuthRejection {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Failed(err.into())
    }
}

impl From<ttd_store::StoreError> for AdminAuthRejection {
    fn from(err: ttd_store::StoreError) -> Self {
        Self::Failed(err.into())
    }
}

impl FromRequestParts<AppState> for RequireAdminAuth {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

        let Some(admin) = session
            .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
            .await?
        else {
            return Err(AdminAuthRejection::RedirectToLogin);
        };

        let still_admin = CustomerRepository::new(state.store())
            .get(admin.id)
            .await?
            .is_some_and(|user| user.is_admin() && user.is_active());
        if !still_admin {
            tracing::warn!(user_id = %admin.id, "Admin access revoked, ending session");
            clear_current_admin(&session).await?;
            return Err(AdminAuthRejection::RedirectToLogin);
        }

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    // New identity, new session id.
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Helper to clear the current admin from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_admin(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    Ok(())
}
