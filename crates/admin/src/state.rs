//! Application state shared across handlers.

use std::sync::Arc;

use ttd_store::Store;

use crate::config::AdminConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    store: Store,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, store: Store) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, store }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// The data store shared with the storefront.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }
}
