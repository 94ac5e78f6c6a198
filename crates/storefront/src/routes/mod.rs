//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /it-solutions           - IT solutions (redirects home when disabled)
//!
//! # Catalog
//! GET  /store                  - All products
//! GET  /shop/{category}        - Category listing
//! GET  /products/{id}          - Product detail with variants and reviews
//! POST /products/{id}/reviews  - Post a review (requires auth)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (count fragment, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove line (returns cart_items fragment)
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Delivery and payment form
//! POST /checkout               - Place the order
//! GET  /checkout/summary       - Totals for a district (fragment)
//! POST /checkout/coupon        - Apply a coupon
//! POST /checkout/coupon/remove - Remove the coupon
//!
//! # Account (requires auth)
//! GET  /orders                 - Order history
//! GET  /orders/{id}/invoice    - Printable invoice
//! GET  /profile                - Account overview
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, order_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router. Form submissions are rate limited.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(auth_rate_limiter())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(auth_rate_limiter())),
        )
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route(
            "/{id}/reviews",
            post(products::add_review).layer(order_rate_limiter()),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(checkout::show).merge(post(checkout::place).layer(order_rate_limiter())),
        )
        .route("/summary", get(checkout::summary))
        .route("/coupon", post(checkout::apply_coupon))
        .route("/coupon/remove", post(checkout::remove_coupon))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::index))
        .route("/orders/{id}/invoice", get(orders::invoice))
        .route("/profile", get(profile::show))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/it-solutions", get(home::it_solutions))
        .route("/store", get(products::store))
        .route("/shop/{category}", get(products::category))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .merge(account_routes())
        .nest("/auth", auth_routes())
}
