//! Application state shared across handlers.

use std::sync::Arc;

use ttd_store::Store;

use crate::config::StorefrontConfig;
use crate::services::auth::{AuthError, AuthService};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Store,
    auth: AuthService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote auth client cannot be built.
    pub fn new(config: StorefrontConfig, store: Store) -> Result<Self, AuthError> {
        let auth = AuthService::new(&config.auth, store.clone())?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                auth,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// The shared data store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}
