//! End-to-end tests for the TTD storefront and admin.
//!
//! Each test starts both servers on ephemeral loopback ports over one shared
//! in-memory store, then drives them with a cookie-carrying `reqwest` client
//! the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ttd-integration-tests
//! ```

use std::net::{Ipv4Addr, SocketAddr};

use chrono::Utc;
use reqwest::{Client, Response};
use ttd_store::{Store, StoreData};

pub use ttd_store::seed::{ADMIN_EMAIL, DEMO_EMAIL};

/// A storefront and an admin sharing one store.
pub struct TestApp {
    pub store: Store,
    pub storefront_url: String,
    pub admin_url: String,
}

impl TestApp {
    /// Start both servers over fresh seed data.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    pub async fn spawn() -> Self {
        Self::with_data(ttd_store::seed::seed_data(Utc::now())).await
    }

    /// Start both servers over `data`.
    ///
    /// # Panics
    ///
    /// Panics if either server cannot be started.
    #[allow(clippy::expect_used)]
    pub async fn with_data(data: StoreData) -> Self {
        let store = Store::in_memory(data);
        let no_env = |_: &str| None;

        let storefront_config =
            ttd_storefront::config::StorefrontConfig::from_lookup(no_env).expect("storefront config");
        let storefront_state =
            ttd_storefront::state::AppState::new(storefront_config, store.clone())
                .expect("storefront state");
        let storefront_url = serve(ttd_storefront::app(storefront_state)).await;

        let admin_config = ttd_admin::config::AdminConfig::from_lookup(no_env).expect("admin config");
        let admin_state = ttd_admin::state::AppState::new(admin_config, store.clone());
        let admin_url = serve(ttd_admin::app(admin_state)).await;

        Self {
            store,
            storefront_url,
            admin_url,
        }
    }

    /// A fresh browser: its own cookie jar, following redirects.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn browser() -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Sign `client` in to the storefront with email and password.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    #[allow(clippy::expect_used)]
    pub async fn storefront_login(&self, client: &Client, email: &str) -> Response {
        client
            .post(self.storefront("/auth/login"))
            .form(&[("email", email), ("password", "password123")])
            .send()
            .await
            .expect("storefront login request")
    }

    /// Sign `client` in to the admin.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    #[allow(clippy::expect_used)]
    pub async fn admin_login(&self, client: &Client, email: &str) -> Response {
        client
            .post(self.admin("/auth/login"))
            .form(&[("email", email), ("password", "admin-password")])
            .send()
            .await
            .expect("admin login request")
    }
}

/// Serve `app` on an ephemeral loopback port and return its base URL.
#[allow(clippy::expect_used)]
async fn serve(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("test listener address");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    });
    format!("http://{addr}")
}

/// Read a response body, panicking on transport errors.
///
/// # Panics
///
/// Panics if the body cannot be read.
#[allow(clippy::expect_used)]
pub async fn body(response: Response) -> String {
    response.text().await.expect("response body")
}
