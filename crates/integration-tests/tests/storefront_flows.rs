//! End-to-end storefront flows: browsing, cart, checkout and accounts.

use reqwest::StatusCode;
use rust_decimal::Decimal;

use innovacart_core::settings::SiteSettings;
use innovacart_core::{DiscountType, OrderStatus};
use innovacart_integration_tests::{Backend, PASSWORD, location, storefront};

const CUSTOMER: &str = "rahim@example.com";

fn checkout_form<'a>(email: &'a str) -> Vec<(&'static str, &'a str)> {
    vec![
        ("name", "Rahim Uddin"),
        ("email", email),
        ("phone", "01711000000"),
        ("district", "Dhaka"),
        ("address", "House 12, Road 5, Dhanmondi"),
        ("payment_method", "bkash"),
        ("transaction_id", "TX9A8B7C"),
        ("last_three_digits", "123"),
    ]
}

// ============================================================================
// Browsing
// ============================================================================

#[tokio::test]
async fn test_health_and_readiness() {
    let server = storefront(&Backend::new()).await;

    let resp = server.get("/health").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    assert_eq!(server.get("/health/ready").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_store_lists_seeded_products() {
    let backend = Backend::new();
    backend.product("Himsagar Mango", 450, "fruits").await;
    backend.product("Black Tee", 550, "t-shirts").await;
    let server = storefront(&backend).await;

    let resp = server.get("/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("InnovaCart"));

    let body = server.get("/store").await.text().await.unwrap();
    assert!(body.contains("Himsagar Mango"));
    assert!(body.contains("Black Tee"));

    let body = server.get("/shop/fruits").await.text().await.unwrap();
    assert!(body.contains("Himsagar Mango"));
    assert!(!body.contains("Black Tee"));

    assert_eq!(server.get("/shop/gadgets").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disabled_pages_redirect() {
    let backend = Backend::new();
    let settings = SiteSettings {
        it_solutions_available: false,
        tshirt_page_available: false,
        ..SiteSettings::default()
    };
    backend.repos.settings.update(&settings).await.unwrap();
    let server = storefront(&backend).await;

    let resp = server.get("/it-solutions").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/");

    let resp = server.get("/shop/t-shirts").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/store");
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
async fn test_cart_add_update_and_count() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 450, "fruits").await;
    let server = storefront(&backend).await;

    let resp = server
        .htmx_post(
            "/cart/add",
            &[("product_id", mango.id.as_str()), ("quantity", "2")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("HX-Trigger").unwrap(),
        "cart-updated"
    );
    assert!(resp.text().await.unwrap().contains(">2</span>"));

    // Adding the same product again merges into one line.
    let resp = server
        .post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;
    assert_eq!(location(&resp), "/cart");
    let body = server.get("/cart/count").await.text().await.unwrap();
    assert!(body.contains(">3</span>"));

    let resp = server
        .post("/cart/add", &[("product_id", "missing-product")])
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server.post("/cart/clear", &[]).await;
    assert_eq!(location(&resp), "/cart");
    let body = server.get("/cart/count").await.text().await.unwrap();
    assert!(body.contains("hidden"));
}

#[tokio::test]
async fn test_cart_add_blank_quantity_means_one() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 450, "fruits").await;
    let server = storefront(&backend).await;

    let resp = server
        .post(
            "/cart/add",
            &[("product_id", mango.id.as_str()), ("quantity", "")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/cart");
    let body = server.get("/cart/count").await.text().await.unwrap();
    assert!(body.contains(">1</span>"));
}

#[tokio::test]
async fn test_cart_add_respects_stock() {
    let backend = Backend::new();
    let sold_out = backend.product("Langra Mango", 400, "fruits").await;
    backend.set_stock(&sold_out, 0).await;
    let scarce = backend.product("Black Tee", 550, "t-shirts").await;
    backend.set_stock(&scarce, 3).await;
    let server = storefront(&backend).await;

    let resp = server
        .post(
            "/cart/add",
            &[("product_id", sold_out.id.as_str()), ("quantity", "500")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Langra Mango is out of stock");

    let resp = server
        .post(
            "/cart/add",
            &[("product_id", scarce.id.as_str()), ("quantity", "2")],
        )
        .await;
    assert_eq!(location(&resp), "/cart");

    // Two already in the cart, so two more would exceed the three on hand.
    let resp = server
        .htmx_post(
            "/cart/add",
            &[("product_id", scarce.id.as_str()), ("quantity", "2")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        resp.text().await.unwrap(),
        "Only 3 of Black Tee left in stock"
    );

    let body = server.get("/cart/count").await.text().await.unwrap();
    assert!(body.contains(">2</span>"));
}

#[tokio::test]
async fn test_cart_variants() {
    let backend = Backend::new();
    let tee = backend
        .product_with_variants(
            "Black Tee",
            550,
            "t-shirts",
            &[("s", None, 0), ("m", None, 4), ("xl", Some(650), 5)],
        )
        .await;
    let server = storefront(&backend).await;

    // The default size is sold out, so the first size with stock is used.
    server
        .post("/cart/add", &[("product_id", tee.id.as_str())])
        .await;
    let resp = server
        .post(
            "/cart/add",
            &[
                ("product_id", tee.id.as_str()),
                ("variant_id", "xl"),
                ("quantity", "2"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/cart");

    let body = server.get("/cart").await.text().await.unwrap();
    assert!(body.contains(&format!("value=\"{}-m\"", tee.id)));
    assert!(body.contains(&format!("value=\"{}-xl\"", tee.id)));
    assert!(!body.contains(&format!("value=\"{}-s\"", tee.id)));

    let resp = server
        .post(
            "/cart/add",
            &[("product_id", tee.id.as_str()), ("variant_id", "xxl")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.unwrap(), "Unknown product option");

    let resp = server
        .post(
            "/cart/add",
            &[("product_id", tee.id.as_str()), ("variant_id", "s")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let order = backend.repos.orders.list().await.unwrap().remove(0);
    assert_eq!(order.items.len(), 2);
    let xl = order
        .items
        .iter()
        .find(|item| item.product.variant.as_ref().is_some_and(|v| v.id.as_str() == "xl"))
        .unwrap();
    assert_eq!(xl.quantity, 2);
    assert_eq!(xl.product.price, Decimal::from(650));
    assert_eq!(xl.product.variant.as_ref().unwrap().name, "XL");
    assert_eq!(order.total, Decimal::from(550 + 2 * 650));
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_requires_items() {
    let server = storefront(&Backend::new()).await;

    let resp = server.get("/checkout").await;
    assert_eq!(location(&resp), "/cart");

    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(location(&resp), "/cart");
}

#[tokio::test]
async fn test_guest_checkout_with_coupon() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    backend.coupon("SAVE10", 10, DiscountType::Percentage).await;
    let server = storefront(&backend).await;

    server
        .post(
            "/cart/add",
            &[("product_id", mango.id.as_str()), ("quantity", "2")],
        )
        .await;

    let resp = server.post("/checkout/coupon", &[("code", "save10")]).await;
    assert_eq!(location(&resp), "/checkout");
    let body = server.get("/checkout").await.text().await.unwrap();
    assert!(body.contains("SAVE10"));

    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("Your order reference is"));

    let orders = backend.repos.orders.list().await.unwrap();
    assert_eq!(orders.len(), 1);
    let order = orders.first().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Decimal::from(1000));
    assert_eq!(order.discount, Decimal::from(100));
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
    assert_eq!(
        order.grand_total,
        order.total + order.delivery_charge - order.discount
    );

    let coupon = backend
        .repos
        .coupons
        .find_by_code("SAVE10")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(coupon.used_count, 1);

    // The cart is emptied once the order is stored.
    let body = server.get("/cart/count").await.text().await.unwrap();
    assert!(body.contains("hidden"));
}

#[tokio::test]
async fn test_checkout_rejects_invalid_form() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    let server = storefront(&backend).await;
    server
        .post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;

    let mut form = checkout_form(CUSTOMER);
    form.retain(|(name, _)| *name != "transaction_id");
    let resp = server.post("/checkout", &form).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("Transaction ID"));

    assert!(backend.repos.orders.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_coupon_is_not_applied() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    let server = storefront(&backend).await;
    server
        .post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;

    let resp = server.post("/checkout/coupon", &[("code", "NOPE")]).await;
    assert_eq!(location(&resp), "/checkout");

    server.post("/checkout", &checkout_form(CUSTOMER)).await;
    let orders = backend.repos.orders.list().await.unwrap();
    let order = orders.first().unwrap();
    assert_eq!(order.discount, Decimal::ZERO);
    assert!(order.coupon_code.is_none());
}

#[tokio::test]
async fn test_checkout_rechecks_stock() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    let server = storefront(&backend).await;
    server
        .post(
            "/cart/add",
            &[("product_id", mango.id.as_str()), ("quantity", "2")],
        )
        .await;

    // Stock drops after the product went into the cart.
    backend.set_stock(&mango, 1).await;

    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Only 1 of Himsagar Mango left in stock")
    );
    assert!(backend.repos.orders.list().await.unwrap().is_empty());

    backend.repos.products.delete(&mango.id).await.unwrap();
    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("Himsagar Mango is no longer available")
    );
    assert!(backend.repos.orders.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checkout_revalidates_deactivated_coupon() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    let coupon = backend.coupon("SAVE10", 10, DiscountType::Percentage).await;
    let server = storefront(&backend).await;
    server
        .post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;
    server.post("/checkout/coupon", &[("code", "SAVE10")]).await;

    backend.repos.coupons.set_active(&coupon.id, false).await.unwrap();

    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("This coupon is no longer active")
    );
    assert!(backend.repos.orders.list().await.unwrap().is_empty());

    // The rejected coupon is dropped, so the next attempt goes through at full price.
    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order = backend.repos.orders.list().await.unwrap().remove(0);
    assert_eq!(order.discount, Decimal::ZERO);
    assert!(order.coupon_code.is_none());
}

#[tokio::test]
async fn test_checkout_revalidates_used_up_coupon() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    backend.coupon("FLAT50", 50, DiscountType::Fixed).await;
    let server = storefront(&backend).await;
    server
        .post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;
    server.post("/checkout/coupon", &[("code", "FLAT50")]).await;

    // Other customers use up the coupon while this one fills in the form.
    for _ in 0..10 {
        backend.repos.coupons.redeem("FLAT50").await.unwrap();
    }

    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("This coupon has reached its usage limit")
    );
    assert!(backend.repos.orders.list().await.unwrap().is_empty());
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn test_orders_require_sign_in() {
    let server = storefront(&Backend::new()).await;

    let resp = server.get("/orders").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/auth/login?redirect="));

    let resp = server.get("/profile").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_register_then_order_history() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    let server = storefront(&backend).await;

    let resp = server
        .post(
            "/auth/register",
            &[
                ("name", "Rahim Uddin"),
                ("email", CUSTOMER),
                ("password", PASSWORD),
                ("confirm_password", PASSWORD),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/");

    server
        .post("/cart/add", &[("product_id", mango.id.as_str())])
        .await;
    let resp = server.post("/checkout", &checkout_form(CUSTOMER)).await;
    assert_eq!(location(&resp), "/orders");

    let resp = server.get("/orders").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Himsagar Mango"));

    let order = backend.repos.orders.list().await.unwrap().remove(0);
    let resp = server.get(&format!("/orders/{}/invoice", order.id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let backend = Backend::new();
    backend.account(CUSTOMER).await;
    let server = storefront(&backend).await;

    let resp = server
        .post(
            "/auth/login",
            &[("email", CUSTOMER), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = server
        .post(
            "/auth/login",
            &[
                ("email", CUSTOMER),
                ("password", PASSWORD),
                ("redirect", "/orders"),
            ],
        )
        .await;
    assert_eq!(location(&resp), "/orders");
}

// ============================================================================
// Reviews
// ============================================================================

#[tokio::test]
async fn test_review_requires_sign_in() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    let server = storefront(&backend).await;

    let resp = server
        .post(
            &format!("/products/{}/reviews", mango.id),
            &[("rating", "5"), ("comment", "Lovely")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/auth/login"));

    let reviews = backend.repos.reviews.list_for_product(&mango.id).await.unwrap();
    assert!(reviews.is_empty());
}

#[tokio::test]
async fn test_review_validation_then_post() {
    let backend = Backend::new();
    let mango = backend.product("Himsagar Mango", 500, "fruits").await;
    backend.account(CUSTOMER).await;
    let server = storefront(&backend).await;
    server
        .post(
            "/auth/login",
            &[("email", CUSTOMER), ("password", PASSWORD)],
        )
        .await;

    let path = format!("/products/{}/reviews", mango.id);
    let back = format!("/products/{}", mango.id);

    let resp = server
        .post(&path, &[("rating", "5"), ("comment", "   ")])
        .await;
    assert_eq!(location(&resp), back);
    let body = server.get(&back).await.text().await.unwrap();
    assert!(body.contains("Please write a comment for your review"));

    let resp = server
        .post(&path, &[("rating", "9"), ("comment", "Too good")])
        .await;
    assert_eq!(location(&resp), back);
    let body = server.get(&back).await.text().await.unwrap();
    assert!(body.contains("Rating must be between 1 and 5"));

    assert!(
        backend
            .repos
            .reviews
            .list_for_product(&mango.id)
            .await
            .unwrap()
            .is_empty()
    );

    let resp = server
        .post(&path, &[("rating", "4"), ("comment", "Sweet and fresh")])
        .await;
    assert_eq!(location(&resp), back);
    let body = server.get(&back).await.text().await.unwrap();
    assert!(body.contains("Sweet and fresh"));

    let reviews = backend.repos.reviews.list_for_product(&mango.id).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews.first().unwrap().rating, 4);
}
