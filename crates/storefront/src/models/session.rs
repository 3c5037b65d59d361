//! Session-related types.
//!
//! Everything a visitor accumulates (identity, cart, wishlist, theme,
//! checkout progress and pending toasts) lives in the session.

use serde::{Deserialize, Serialize};
use ttd_core::user::User;
use ttd_core::{AddressId, Email, PaymentMethod, UserId};

/// Session-stored customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Remote auth API token, only when signed in through the API.
    #[serde(default)]
    pub token: Option<String>,
}

impl CurrentCustomer {
    #[must_use]
    pub fn from_user(user: &User, token: Option<String>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            token,
        }
    }

    /// First word of the name, for the header greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Choices made so far in the three-step checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub address_id: Option<AddressId>,
    pub payment_method: Option<PaymentMethod>,
    pub upi_id: Option<String>,
}

/// Session keys.
pub mod keys {
    /// The signed-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";

    pub const CART: &str = "cart";

    pub const WISHLIST: &str = "wishlist";

    /// Light or dark.
    pub const THEME: &str = "theme";

    /// [`super::CheckoutDraft`] for the checkout in progress.
    pub const CHECKOUT: &str = "checkout";

    /// Toasts waiting to be shown on the next page.
    pub const FLASH: &str = "flash";
}
