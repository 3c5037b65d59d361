//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//! GET  /health/ready                - Readiness check
//!
//! # Dashboard
//! GET  /                            - Dashboard overview
//!
//! # Auth
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Sign in (admin role required)
//! POST /auth/logout                 - Logout
//!
//! # Products
//! GET  /products                    - Product table (?q=, ?category=, ?stock=)
//! GET  /products/new                - New product form
//! POST /products                    - Create a product
//! GET  /products/{id}/edit          - Edit product form
//! POST /products/{id}               - Update a product
//! POST /products/{id}/delete        - Delete a product
//! POST /products/bulk-delete        - Delete the selected products
//!
//! # Orders
//! GET  /orders                      - Order table (?q=, ?status=, ?payment=)
//! GET  /orders/export               - Download the filtered orders as JSON
//! GET  /orders/{id}                 - Order detail
//! POST /orders/{id}/status          - Move an order to its next status
//!
//! # Customers
//! GET  /customers                   - Customer table (?q=)
//! GET  /customers/{id}              - Customer detail with order history
//! POST /customers/{id}/status       - Activate or deactivate
//! POST /customers/{id}/role         - Promote or demote
//!
//! # Settings
//! GET  /settings                    - Pricing and inventory settings
//! POST /settings                    - Save settings
//! ```

pub mod auth;
pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the main routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(dashboard::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(customers::router())
        .merge(settings::router())
}
