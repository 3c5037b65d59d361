//! Admin role management.
//!
//! # Usage
//!
//! ```bash
//! ttd-cli admin promote -e someone@example.in
//! ttd-cli admin demote -e someone@example.in
//! ```
//!
//! Role changes take effect on the account's next admin request; a demoted
//! admin's session is ended there.

use std::path::Path;

use thiserror::Error;
use ttd_core::{CustomerStatus, Email, UserRole};
use ttd_store::{CustomerRepository, Store, StoreError};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account uses the email.
    #[error("No account found with email: {0}")]
    UnknownUser(String),

    /// Demoting would leave nobody able to sign in to the admin.
    #[error("{0} is the last active admin")]
    LastAdmin(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Give the account with `email` the admin role.
///
/// # Errors
///
/// Returns an error for an invalid or unknown email.
pub async fn promote(path: &Path, email: &str) -> Result<(), AdminError> {
    let store = Store::open(path).await?;
    set_role(&store, email, UserRole::Admin).await
}

/// Return the admin with `email` to the customer role.
///
/// # Errors
///
/// Returns an error for an invalid or unknown email, or when the account is
/// the only active admin.
pub async fn demote(path: &Path, email: &str) -> Result<(), AdminError> {
    let store = Store::open(path).await?;
    set_role(&store, email, UserRole::User).await
}

async fn set_role(store: &Store, email: &str, role: UserRole) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let repo = CustomerRepository::new(store);
    let user = repo
        .get_by_email(email.as_str())
        .await?
        .ok_or_else(|| AdminError::UnknownUser(email.to_string()))?;

    if user.role == role {
        tracing::info!(email = %email, role = %role, "Role unchanged");
        return Ok(());
    }

    if role == UserRole::User {
        let other_admins = store
            .read(|d| {
                d.users
                    .iter()
                    .filter(|u| u.id != user.id)
                    .filter(|u| u.is_admin() && u.status == CustomerStatus::Active)
                    .count()
            })
            .await?;
        if other_admins == 0 {
            return Err(AdminError::LastAdmin(email.to_string()));
        }
    }

    repo.set_role(user.id, role).await?;
    tracing::info!(email = %email, role = %role, "Role updated");
    Ok(())
}
