//! Admin back office: sign-in, catalog edits, order handling, customers and
//! settings, checked against the shared store and the storefront.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use ttd_core::{CustomerStatus, OrderId, OrderStatus};
use ttd_integration_tests::{ADMIN_EMAIL, DEMO_EMAIL, TestApp, body};

async fn signed_in_admin(app: &TestApp) -> reqwest::Client {
    let client = TestApp::browser();
    let resp = app.admin_login(&client, ADMIN_EMAIL).await;
    assert_eq!(resp.url().path(), "/");
    client
}

async fn status_of(app: &TestApp, id: OrderId) -> OrderStatus {
    app.store
        .read(|d| d.orders.iter().find(|o| o.id == id).unwrap().order_status)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_pages_require_sign_in() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();

    for path in ["/", "/products", "/orders", "/customers", "/settings"] {
        let resp = client.get(app.admin(path)).send().await.unwrap();
        assert_eq!(resp.url().path(), "/auth/login", "{path} should need sign-in");
    }
}

#[tokio::test]
async fn test_customer_cannot_sign_in() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();

    let resp = app.admin_login(&client, DEMO_EMAIL).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body(resp).await.contains("No admin account matches that email"));

    let dashboard = client.get(app.admin("/")).send().await.unwrap();
    assert_eq!(dashboard.url().path(), "/auth/login");
}

#[tokio::test]
async fn test_sign_in_and_out() {
    let app = TestApp::spawn().await;
    let client = signed_in_admin(&app).await;

    for path in ["/", "/products", "/orders", "/customers", "/settings"] {
        let resp = client.get(app.admin(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert_eq!(resp.url().path(), path);
    }

    let out = client.post(app.admin("/auth/logout")).send().await.unwrap();
    assert_eq!(out.url().path(), "/auth/login");
    let after = client.get(app.admin("/")).send().await.unwrap();
    assert_eq!(after.url().path(), "/auth/login");
}

#[tokio::test]
async fn test_product_lifecycle_reaches_storefront() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let shopper = TestApp::browser();

    let created = admin
        .post(app.admin("/products"))
        .form(&[
            ("name", "Test Kettle"),
            ("sku", "TTD-KETTLE-1"),
            ("description", "A kettle for integration tests."),
            ("price", "1299"),
            ("original_price", "1599"),
            ("category", "Home & Kitchen"),
            ("brand", "TTD"),
            ("stock", "12"),
            ("tags", "kitchen, new"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(created.url().path(), "/products");
    assert!(body(created).await.contains("Product created"));

    let product = app
        .store
        .read(|d| d.products.iter().find(|p| p.sku == "TTD-KETTLE-1").cloned())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(product.slug, "test-kettle");
    assert_eq!(product.stock, 12);

    let page = shopper
        .get(app.storefront("/products/test-kettle"))
        .send()
        .await
        .unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(body(page).await.contains("Test Kettle"));

    let edit = admin
        .get(app.admin(&format!("/products/{}/edit", product.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(edit.status(), StatusCode::OK);

    let updated = admin
        .post(app.admin(&format!("/products/{}", product.id)))
        .form(&[
            ("name", "Test Kettle"),
            ("slug", "test-kettle"),
            ("sku", "TTD-KETTLE-1"),
            ("price", "1199"),
            ("category", "Home & Kitchen"),
            ("brand", "TTD"),
            ("stock", "0"),
        ])
        .send()
        .await
        .unwrap();
    assert!(body(updated).await.contains("Product updated"));
    let stock = app
        .store
        .read(|d| d.products.iter().find(|p| p.id == product.id).map(|p| p.stock))
        .await
        .unwrap();
    assert_eq!(stock, Some(0));

    let deleted = admin
        .post(app.admin(&format!("/products/{}/delete", product.id)))
        .send()
        .await
        .unwrap();
    assert!(body(deleted).await.contains("Product deleted"));

    let gone = shopper
        .get(app.storefront("/products/test-kettle"))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_product_is_rerendered() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let before = app.store.read(|d| d.products.len()).await.unwrap();

    let resp = admin
        .post(app.admin("/products"))
        .form(&[("name", ""), ("price", "-5"), ("stock", "lots")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = body(resp).await;
    assert!(page.contains("Product name is required"));
    assert!(page.contains("SKU is required"));

    let after = app.store.read(|d| d.products.len()).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_bulk_delete() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let (before, ids) = app
        .store
        .read(|d| {
            let ids: Vec<String> = d.products.iter().take(2).map(|p| p.id.to_string()).collect();
            (d.products.len(), ids)
        })
        .await
        .unwrap();

    let form: Vec<(&str, &str)> = ids.iter().map(|id| ("ids", id.as_str())).collect();
    let resp = admin
        .post(app.admin("/products/bulk-delete"))
        .form(&form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/products");

    let after = app.store.read(|d| d.products.len()).await.unwrap();
    assert_eq!(after, before - 2);
}

#[tokio::test]
async fn test_order_status_follows_workflow() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let order_id = app
        .store
        .read(|d| {
            d.orders
                .iter()
                .find(|o| o.order_status == OrderStatus::Pending)
                .map(|o| o.id)
                .unwrap()
        })
        .await
        .unwrap();

    let skipped = admin
        .post(app.admin(&format!("/orders/{order_id}/status")))
        .form(&[("status", "delivered")])
        .send()
        .await
        .unwrap();
    assert_eq!(skipped.url().path(), format!("/orders/{order_id}"));
    assert_eq!(status_of(&app, order_id).await, OrderStatus::Pending);

    let confirmed = admin
        .post(app.admin(&format!("/orders/{order_id}/status")))
        .form(&[("status", "confirmed")])
        .send()
        .await
        .unwrap();
    assert!(body(confirmed).await.contains("Order marked Confirmed"));
    assert_eq!(status_of(&app, order_id).await, OrderStatus::Confirmed);
}

#[tokio::test]
async fn test_order_export_downloads_json() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let delivered = app
        .store
        .read(|d| {
            d.orders
                .iter()
                .filter(|o| o.order_status == OrderStatus::Delivered)
                .count()
        })
        .await
        .unwrap();

    let resp = admin
        .get(app.admin("/orders/export?status=delivered"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(disposition.starts_with("attachment; filename=\"orders-"));

    let orders: serde_json::Value = serde_json::from_str(&body(resp).await).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), delivered);
}

#[tokio::test]
async fn test_deactivated_customer_cannot_shop_signed_in() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let demo_id = app
        .store
        .read(|d| d.users.iter().find(|u| u.email.matches(DEMO_EMAIL)).unwrap().id)
        .await
        .unwrap();

    let detail = admin
        .get(app.admin(&format!("/customers/{demo_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);

    admin
        .post(app.admin(&format!("/customers/{demo_id}/status")))
        .form(&[("status", "inactive")])
        .send()
        .await
        .unwrap();
    let status = app
        .store
        .read(|d| d.users.iter().find(|u| u.id == demo_id).unwrap().status)
        .await
        .unwrap();
    assert_eq!(status, CustomerStatus::Inactive);

    let shopper = TestApp::browser();
    let login = app.storefront_login(&shopper, DEMO_EMAIL).await;
    assert!(!login.status().is_success());
    let account = shopper.get(app.storefront("/account")).send().await.unwrap();
    assert_eq!(account.url().path(), "/auth/login");
}

#[tokio::test]
async fn test_admin_cannot_demote_self() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;
    let admin_id = app
        .store
        .read(|d| d.users.iter().find(|u| u.email.matches(ADMIN_EMAIL)).unwrap().id)
        .await
        .unwrap();

    admin
        .post(app.admin(&format!("/customers/{admin_id}/role")))
        .form(&[("role", "user")])
        .send()
        .await
        .unwrap();
    let still_admin = app
        .store
        .read(|d| d.users.iter().find(|u| u.id == admin_id).unwrap().is_admin())
        .await
        .unwrap();
    assert!(still_admin);
}

#[tokio::test]
async fn test_settings_change_storefront_pricing() {
    let app = TestApp::spawn().await;
    let admin = signed_in_admin(&app).await;

    let saved = admin
        .post(app.admin("/settings"))
        .form(&[
            ("gst_rate", "12"),
            ("free_delivery_threshold", "999"),
            ("delivery_fee", "79"),
            ("home_state", "Karnataka"),
            ("low_stock_threshold", "5"),
        ])
        .send()
        .await
        .unwrap();
    assert!(body(saved).await.contains("Settings saved"));

    let settings = app.store.read(|d| d.settings.clone()).await.unwrap();
    assert_eq!(settings.low_stock_threshold, 5);
    assert_eq!(settings.pricing.home_state, "Karnataka");
    assert_eq!(settings.pricing.delivery_fee.whole_rupees(), 79);

    let rejected = admin
        .post(app.admin("/settings"))
        .form(&[
            ("gst_rate", "140"),
            ("free_delivery_threshold", "999"),
            ("delivery_fee", "79"),
            ("home_state", "Karnataka"),
            ("low_stock_threshold", "5"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body(rejected).await.contains("GST rate must be between 0 and 100"));
}
