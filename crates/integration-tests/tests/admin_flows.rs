//! End-to-end admin panel flows: sign-in, catalog, coupons, orders, settings.

use reqwest::StatusCode;
use rust_decimal::Decimal;

use innovacart_core::{DiscountType, OrderStatus, ProductId};
use innovacart_integration_tests::{
    ADMIN_EMAIL, Backend, PASSWORD, admin, location, signed_in_admin, storefront,
};

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_signed_out_admin_is_sent_to_login() {
    let server = admin(&Backend::new()).await;

    for path in ["/", "/products", "/orders", "/coupons", "/settings"] {
        let resp = server.get(path).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&resp), "/auth/login", "{path}");
    }

    assert_eq!(server.get("/auth/login").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_admin_cannot_sign_in() {
    let backend = Backend::new();
    backend.account("customer@example.com").await;
    let server = admin(&backend).await;

    let resp = server
        .post(
            "/auth/login",
            &[("email", "customer@example.com"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert!(resp.text().await.unwrap().contains("Access denied"));

    assert_eq!(server.get("/").await.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_admin_wrong_password() {
    let backend = Backend::new();
    backend.account(ADMIN_EMAIL).await;
    let server = admin(&backend).await;

    let resp = server
        .post(
            "/auth/login",
            &[("email", ADMIN_EMAIL), ("password", "not-the-password")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_sign_in_and_out() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let resp = server.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains(ADMIN_EMAIL));

    let resp = server.post("/auth/logout", &[]).await;
    assert_eq!(location(&resp), "/auth/login");
    assert_eq!(server.get("/").await.status(), StatusCode::SEE_OTHER);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_create_product_with_variants() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let resp = server
        .post(
            "/products",
            &[
                ("name", "Classic Tee"),
                ("description", "Heavy cotton"),
                ("price", "650"),
                ("category", "t-shirts"),
                ("stock", "12"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let edit_path = location(&resp);
    let id = edit_path
        .strip_prefix("/products/")
        .and_then(|rest| rest.strip_suffix("/edit"))
        .unwrap()
        .to_string();

    for (name, price) in [("M", ""), ("XL", "700")] {
        let resp = server
            .post(
                &format!("/products/{id}/variants"),
                &[("name", name), ("price", price), ("stock", "5")],
            )
            .await;
        assert_eq!(location(&resp), edit_path);
    }

    let product = backend
        .repos
        .products
        .require(&ProductId::new(id.clone()))
        .await
        .unwrap();
    assert!(product.has_variants);
    assert_eq!(product.variants.len(), 2);
    let xl = product.variants.iter().find(|v| v.name == "XL").unwrap();
    assert_eq!(xl.price, Some(Decimal::from(700)));

    let resp = server
        .post(&format!("/products/{id}/variants/{}/default", xl.id), &[])
        .await;
    assert_eq!(location(&resp), edit_path);
    let product = backend
        .repos
        .products
        .require(&ProductId::new(id.clone()))
        .await
        .unwrap();
    assert_eq!(product.default_variant().unwrap().name, "XL");

    let body = server.get(&edit_path).await.text().await.unwrap();
    assert!(body.contains("Classic Tee"));
    assert!(body.contains("XL"));

    let resp = server.post(&format!("/products/{id}/delete"), &[]).await;
    assert_eq!(location(&resp), "/products");
    assert!(backend.repos.products.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_product_rejects_bad_price() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let resp = server
        .post(
            "/products",
            &[("name", "Mango"), ("price", "free"), ("category", "fruits")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(backend.repos.products.list().await.unwrap().is_empty());
}

// ============================================================================
// Coupons
// ============================================================================

#[tokio::test]
async fn test_coupon_lifecycle() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let form = [
        ("code", "eid25"),
        ("discount", "25"),
        ("discount_type", "percentage"),
        ("max_usage", ""),
        ("expiry_date", "2099-12-31"),
    ];
    let resp = server.post("/coupons", &form).await;
    assert_eq!(location(&resp), "/coupons");

    let resp = server.post("/coupons", &form).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let coupon = backend
        .repos
        .coupons
        .find_by_code("EID25")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon.max_usage, 100);
    assert!(coupon.is_active);

    let resp = server
        .post(&format!("/coupons/{}/toggle", coupon.id), &[])
        .await;
    assert_eq!(location(&resp), "/coupons");
    let coupon = backend
        .repos
        .coupons
        .find_by_code("EID25")
        .await
        .unwrap()
        .unwrap();
    assert!(!coupon.is_active);

    let resp = server
        .post(&format!("/coupons/{}/delete", coupon.id), &[])
        .await;
    assert_eq!(location(&resp), "/coupons");
    assert!(backend.repos.coupons.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_coupon_rejects_large_percentage() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let resp = server
        .post(
            "/coupons",
            &[
                ("code", "HALFOFF"),
                ("discount", "150"),
                ("discount_type", "percentage"),
                ("expiry_date", "2099-12-31"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(backend.repos.coupons.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_code_fragment() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let resp = server.get("/coupons/generate-code").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("id=\"code\""));
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_order_placed_in_store_is_managed_in_admin() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    backend.coupon("FLAT50", 50, DiscountType::Fixed).await;

    let shop = storefront(&backend).await;
    shop.post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;
    shop.post("/checkout/coupon", &[("code", "FLAT50")]).await;
    let resp = shop
        .post(
            "/checkout",
            &[
                ("name", "Karim Ahmed"),
                ("email", "karim@example.com"),
                ("phone", "01811000000"),
                ("district", "Chittagong"),
                ("address", "Agrabad"),
                ("payment_method", "nagad"),
                ("transaction_id", "NG55"),
                ("last_three_digits", "456"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let server = signed_in_admin(&backend).await;
    let order = backend.repos.orders.list().await.unwrap().remove(0);
    assert_eq!(order.discount, Decimal::from(50));

    let body = server.get("/orders").await.text().await.unwrap();
    assert!(body.contains("Karim Ahmed"));

    let resp = server
        .post(
            &format!("/orders/{}/status", order.id),
            &[("status", "shipped")],
        )
        .await;
    assert_eq!(location(&resp), format!("/orders/{}", order.id));

    let resp = server
        .post(
            &format!("/orders/{}/tracking", order.id),
            &[("tracking_id", "PATHAO-123")],
        )
        .await;
    assert_eq!(location(&resp), format!("/orders/{}", order.id));

    let stored = backend.repos.orders.require(&order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Shipped);
    assert_eq!(stored.tracking_id.as_deref(), Some("PATHAO-123"));

    let body = server.get("/orders?status=shipped").await.text().await.unwrap();
    assert!(body.contains("Karim Ahmed"));
    let body = server.get("/orders?status=pending").await.text().await.unwrap();
    assert!(!body.contains("Karim Ahmed"));

    let resp = server.get(&format!("/orders/{}/invoice", order.id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("FLAT50"));

    let resp = server
        .post(&format!("/orders/{}/delete", order.id), &[])
        .await;
    assert_eq!(location(&resp), "/orders");
    assert!(backend.repos.orders.list().await.unwrap().is_empty());
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_update_and_reset() {
    let backend = Backend::new();
    let server = signed_in_admin(&backend).await;

    let mut form = vec![
        ("tshirt_page_available", "on"),
        ("icon_delivery", "truck"),
        ("icon_quality", "shield-check"),
        ("icon_support", "headphones"),
        ("bkash", "01700000001"),
        ("nagad", "01700000002"),
        ("rocket", "01700000003"),
        ("thumbnail_tshirts", ""),
        ("thumbnail_fruits", ""),
    ];
    let resp = server.post("/settings", &form).await;
    assert_eq!(location(&resp), "/settings");

    let settings = backend.repos.settings.get().await;
    assert!(!settings.it_solutions_available);
    assert!(settings.tshirt_page_available);
    assert_eq!(settings.icons().support, "headphones");
    assert_eq!(
        settings.payment_numbers.unwrap().nagad,
        "01700000002"
    );

    form.retain(|(name, _)| *name != "bkash");
    let resp = server.post("/settings", &form).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = server.post("/settings/reset", &[]).await;
    assert_eq!(location(&resp), "/settings");
    assert!(backend.repos.settings.get().await.it_solutions_available);
}
