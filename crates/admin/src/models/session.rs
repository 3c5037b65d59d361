//! Session-related types for admin authentication.

use serde::{Deserialize, Serialize};
use ttd_core::user::User;
use ttd_core::{Email, UserId};

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
/// Role and status are re-checked against the store on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: UserId,
    pub email: Email,
    pub name: String,
}

impl From<&User> for CurrentAdmin {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

impl CurrentAdmin {
    /// Up to two initials for the sidebar avatar.
    #[must_use]
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Toasts waiting to be shown on the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_initials() {
        let admin = CurrentAdmin {
            id: UserId::new(1),
            email: Email::parse("admin@ttdsoftware.in").unwrap(),
            name: "store admin".to_owned(),
        };
        assert_eq!(admin.initials(), "SA");
    }
}
