//! View and session models for admin.

pub mod flash;
pub mod session;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tower_sessions::Session;

pub use flash::{Toast, ToastVariant};
pub use session::{CurrentAdmin, keys as session_keys};

use crate::error::AppError;
use crate::state::AppState;

/// A sidebar entry.
#[derive(Debug, Clone, Copy)]
pub struct NavItem {
    pub href: &'static str,
    pub label: &'static str,
}

pub const NAV_ITEMS: &[NavItem] = &[
    NavItem { href: "/", label: "Dashboard" },
    NavItem { href: "/products", label: "Products" },
    NavItem { href: "/orders", label: "Orders" },
    NavItem { href: "/customers", label: "Customers" },
    NavItem { href: "/settings", label: "Settings" },
];

/// Everything the admin layout (sidebar, toasts) needs.
///
/// Extracting this consumes any pending toasts, so take it once per page.
#[derive(Debug, Clone)]
pub struct Chrome {
    pub app_name: String,
    pub admin: Option<CurrentAdmin>,
    pub toasts: Vec<Toast>,
    pub current_path: String,
    pub nav: &'static [NavItem],
}

impl Chrome {
    /// Whether `item` is the section being viewed.
    #[must_use]
    pub fn is_active(&self, item: &NavItem) -> bool {
        if item.href == "/" {
            self.current_path == "/"
        } else {
            self.current_path == item.href
                || self
                    .current_path
                    .strip_prefix(item.href)
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('?'))
        }
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

        Ok(Self {
            app_name: state.config().app_name.clone(),
            admin: session.get(session_keys::CURRENT_ADMIN).await?,
            toasts: flash::take(&session).await?,
            current_path: parts.uri.path().to_owned(),
            nav: NAV_ITEMS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome(path: &str) -> Chrome {
        Chrome {
            app_name: "TTD Software".to_owned(),
            admin: None,
            toasts: Vec::new(),
            current_path: path.to_owned(),
            nav: NAV_ITEMS,
        }
    }

    #[test]
    fn test_active_section() {
        let products = NavItem { href: "/products", label: "Products" };
        let dashboard = NavItem { href: "/", label: "Dashboard" };
        assert!(chrome("/products/12/edit").is_active(&products));
        assert!(chrome("/products").is_active(&products));
        assert!(!chrome("/productsx").is_active(&products));
        assert!(!chrome("/orders").is_active(&dashboard));
        assert!(chrome("/").is_active(&dashboard));
    }
}
