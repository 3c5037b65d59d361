//! Storefront journeys: browsing, cart, coupons, sign-in and checkout.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use ttd_core::{OrderStatus, ProductId, UserId};
use ttd_integration_tests::{DEMO_EMAIL, TestApp, body};

/// An in-stock product priced high enough for the `SAVE10` minimum.
async fn coupon_eligible_product(app: &TestApp) -> (ProductId, String, u32) {
    app.store
        .read(|d| {
            d.products
                .iter()
                .find(|p| p.stock >= 2 && p.price.whole_rupees() >= 500)
                .map(|p| (p.id, p.slug.clone(), p.stock))
                .unwrap()
        })
        .await
        .unwrap()
}

async fn demo_user(app: &TestApp) -> (UserId, String) {
    app.store
        .read(|d| {
            let user = d.users.iter().find(|u| u.email.matches(DEMO_EMAIL)).unwrap();
            let address = user.addresses.iter().find(|a| a.is_default).unwrap();
            (user.id, address.id.to_string())
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();

    for url in [app.storefront("/health"), app.admin("/health")] {
        let resp = client.get(url).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, "ok");
    }
}

#[tokio::test]
async fn test_home_and_listing_render() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();
    let (_, slug, _) = coupon_eligible_product(&app).await;

    let home = client.get(app.storefront("/")).send().await.unwrap();
    assert_eq!(home.status(), StatusCode::OK);

    let name = app
        .store
        .read(|d| d.products.iter().find(|p| p.slug == slug).unwrap().name.clone())
        .await
        .unwrap();
    let listing = client
        .get(app.storefront("/products"))
        .query(&[("q", name.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(listing.status(), StatusCode::OK);
    assert!(body(listing).await.contains(&format!("/products/{slug}")));

    let detail = client
        .get(app.storefront(&format!("/products/{slug}?pincode=400001")))
        .send()
        .await
        .unwrap();
    assert_eq!(detail.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::spawn().await;
    let resp = TestApp::browser()
        .get(app.storefront("/products/no-such-thing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_guest_cart_and_coupon() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();
    let (product_id, _, _) = coupon_eligible_product(&app).await;

    let empty = body(client.get(app.storefront("/cart")).send().await.unwrap()).await;
    assert!(empty.contains("Your cart is empty"));

    let added = client
        .post(app.storefront("/cart/add"))
        .form(&[("product_id", product_id.to_string()), ("quantity", "1".to_owned())])
        .send()
        .await
        .unwrap();
    assert_eq!(added.url().path(), "/cart");
    let cart = body(added).await;
    assert!(cart.contains("Added to cart"));
    assert!(!cart.contains("Your cart is empty"));

    let applied = client
        .post(app.storefront("/cart/coupon"))
        .form(&[("code", "save10")])
        .send()
        .await
        .unwrap();
    let page = body(applied).await;
    assert!(page.contains("Coupon SAVE10 applied"));
    assert!(page.contains("Remove coupon"));

    let rejected = client
        .post(app.storefront("/cart/coupon"))
        .form(&[("code", "NOPE")])
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.url().path(), "/cart");
    assert!(body(rejected).await.contains("Coupon not applied"));

    let cleared = client
        .post(app.storefront("/cart/clear"))
        .send()
        .await
        .unwrap();
    assert!(body(cleared).await.contains("Your cart is empty"));
}

#[tokio::test]
async fn test_checkout_requires_sign_in() {
    let app = TestApp::spawn().await;
    let resp = TestApp::browser()
        .get(app.storefront("/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.url().path(), "/auth/login");
    assert_eq!(resp.url().query(), Some("redirect=%2Fcheckout"));

    let account = TestApp::browser()
        .get(app.storefront("/account/orders"))
        .send()
        .await
        .unwrap();
    assert_eq!(account.url().path(), "/auth/login");
    assert_eq!(account.url().query(), Some("redirect=%2Faccount%2Forders"));
}

#[tokio::test]
async fn test_login_validation_errors() {
    let app = TestApp::spawn().await;
    let resp = TestApp::browser()
        .post(app.storefront("/auth/login"))
        .form(&[("email", "not-an-email"), ("password", "abc")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let page = body(resp).await;
    assert!(page.contains("Please enter a valid email"));
    assert!(page.contains("Password must be at least 6 characters"));
}

#[tokio::test]
async fn test_checkout_places_order() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();
    let (product_id, _, stock_before) = coupon_eligible_product(&app).await;
    let (user_id, address_id) = demo_user(&app).await;
    let orders_before = app
        .store
        .read(|d| d.orders.iter().filter(|o| o.user_id == user_id).count())
        .await
        .unwrap();

    let login = app.storefront_login(&client, DEMO_EMAIL).await;
    assert_eq!(login.status(), StatusCode::OK);

    client
        .post(app.storefront("/cart/add"))
        .form(&[("product_id", product_id.to_string()), ("quantity", "2".to_owned())])
        .send()
        .await
        .unwrap();
    client
        .post(app.storefront("/cart/coupon"))
        .form(&[("code", "SAVE10")])
        .send()
        .await
        .unwrap();

    let payment = client
        .post(app.storefront("/checkout/address"))
        .form(&[("address_id", address_id)])
        .send()
        .await
        .unwrap();
    assert_eq!(payment.url().path(), "/checkout/payment");

    let review = client
        .post(app.storefront("/checkout/payment"))
        .form(&[("payment_method", "cod")])
        .send()
        .await
        .unwrap();
    assert_eq!(review.url().path(), "/checkout/review");

    let success = client
        .post(app.storefront("/checkout/place"))
        .send()
        .await
        .unwrap();
    assert!(success.url().path().ends_with("/success"));
    assert!(body(success).await.contains("Your order has been placed"));

    let (order, stock_after) = app
        .store
        .read(|d| {
            let order = d
                .orders
                .iter()
                .filter(|o| o.user_id == user_id)
                .max_by_key(|o| o.created_at)
                .cloned()
                .unwrap();
            let stock = d.products.iter().find(|p| p.id == product_id).unwrap().stock;
            (order, stock)
        })
        .await
        .unwrap();
    let orders_after = app
        .store
        .read(|d| d.orders.iter().filter(|o| o.user_id == user_id).count())
        .await
        .unwrap();

    assert_eq!(orders_after, orders_before + 1);
    assert_eq!(order.order_status, OrderStatus::Pending);
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(order.item_count(), 2);
    assert!(!order.discount.is_zero());
    assert_eq!(stock_after, stock_before - 2);

    let cart = body(client.get(app.storefront("/cart")).send().await.unwrap()).await;
    assert!(cart.contains("Your cart is empty"));

    let history = client
        .get(app.storefront("/account/orders"))
        .send()
        .await
        .unwrap();
    assert!(body(history).await.contains(&order.order_number));
}

#[tokio::test]
async fn test_place_order_without_steps_goes_back() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();
    app.storefront_login(&client, DEMO_EMAIL).await;

    let resp = client
        .post(app.storefront("/checkout/place"))
        .send()
        .await
        .unwrap();
    assert!(resp.url().path().starts_with("/checkout") || resp.url().path() == "/cart");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::spawn().await;
    let client = TestApp::browser();
    app.storefront_login(&client, DEMO_EMAIL).await;

    let account = client.get(app.storefront("/account")).send().await.unwrap();
    assert_eq!(account.url().path(), "/account");

    client
        .post(app.storefront("/auth/logout"))
        .send()
        .await
        .unwrap();
    let after = client.get(app.storefront("/account")).send().await.unwrap();
    assert_eq!(after.url().path(), "/auth/login");
}
