//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;
use ttd_store::StoreError;

/// Shown whenever the remote auth API cannot be reached.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] ttd_core::EmailError),

    /// Credentials were refused.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been deactivated.
    #[error("account disabled")]
    AccountDisabled,

    /// Registration for an email that is already taken.
    #[error("user already exists")]
    AccountExists,

    /// No code was issued for this phone, or it timed out.
    #[error("otp expired")]
    OtpExpired,

    /// The code is not six digits or the remote API refused it.
    #[error("invalid otp")]
    InvalidOtp,

    /// The remote API answered with an error message.
    #[error("remote auth rejected: {0}")]
    Rejected(String),

    /// The remote API could not be reached or answered garbage.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Repository error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidEmail(_) | Self::OtpExpired | Self::InvalidOtp => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Rejected(_) => StatusCode::UNAUTHORIZED,
            Self::AccountDisabled => StatusCode::FORBIDDEN,
            Self::AccountExists => StatusCode::CONFLICT,
            Self::Network(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text for the sign-in toast. Never exposes transport details.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address".to_owned(),
            Self::InvalidCredentials => "Login failed. Please check your credentials.".to_owned(),
            Self::AccountDisabled => {
                "This account has been deactivated. Please contact support.".to_owned()
            }
            Self::AccountExists => "An account with this email already exists".to_owned(),
            Self::OtpExpired => "OTP has expired. Please request a new one.".to_owned(),
            Self::InvalidOtp => "Invalid OTP. Please try again.".to_owned(),
            Self::Rejected(message) => message.clone(),
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_owned(),
            Self::Store(_) => "Something went wrong. Please try again.".to_owned(),
        }
    }
}
