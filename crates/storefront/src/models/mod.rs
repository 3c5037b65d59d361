//! View and session models for the storefront.

pub mod flash;
pub mod session;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;
use ttd_core::Theme;

pub use flash::{Toast, ToastVariant};
pub use session::{CheckoutDraft, CurrentCustomer, keys as session_keys};

use crate::config::FeatureFlags;
use crate::error::AppError;
use crate::services::visitor;
use crate::state::AppState;

/// A category link in the header navigation.
#[derive(Debug, Clone)]
pub struct NavCategory {
    pub name: String,
    pub slug: String,
}

/// Everything the shared layout (header, footer, toasts) needs.
///
/// Extracting this consumes any pending toasts, so take it once per page.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub app_name: String,
    pub theme: Theme,
    pub customer: Option<CurrentCustomer>,
    pub cart_count: u32,
    pub wishlist_count: usize,
    pub categories: Vec<NavCategory>,
    pub features: FeatureFlags,
    pub toasts: Vec<Toast>,
    /// Path and query of the page being rendered, for "return here" forms.
    pub current_path: String,
}

impl Chrome {
    #[must_use]
    pub const fn is_dark(&self) -> bool {
        matches!(self.theme, Theme::Dark)
    }

    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.customer.is_some()
    }

    #[must_use]
    pub fn greeting(&self) -> &str {
        self.customer
            .as_ref()
            .map_or("Account", CurrentCustomer::first_name)
    }
}

impl FromRequestParts<AppState> for Chrome {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer missing".to_owned()))?;

        let customer = session
            .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
            .await?;
        let cart = visitor::cart(&session).await?;
        let wishlist = visitor::wishlist(&session).await?;
        let categories = state
            .store()
            .read(|d| {
                d.categories
                    .iter()
                    .map(|c| NavCategory {
                        name: c.name.clone(),
                        slug: c.slug.clone(),
                    })
                    .collect()
            })
            .await?;

        Ok(Self {
            app_name: state.config().app_name.clone(),
            theme: visitor::theme(&session).await?,
            customer,
            cart_count: cart.item_count(),
            wishlist_count: wishlist.len(),
            categories,
            features: state.config().features,
            toasts: flash::take(&session).await?,
            current_path: parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string),
        })
    }
}
