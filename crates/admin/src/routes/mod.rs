//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (allowlisted emails only)
//! GET  /auth/login                             - Login page
//! POST /auth/login                             - Login action
//! POST /auth/logout                            - Logout action
//!
//! # Dashboard
//! GET  /                                       - Statistics and recent orders
//!
//! # Products
//! GET  /products                               - Product listing
//! GET  /products/new                           - New product form
//! POST /products                               - Create product
//! GET  /products/{id}/edit                     - Edit form, variants and reviews
//! POST /products/{id}                          - Update product
//! POST /products/{id}/delete                   - Delete product
//! POST /products/{id}/variants                 - Add variant
//! POST /products/{id}/variants/{vid}/delete    - Remove variant
//! POST /products/{id}/variants/{vid}/default   - Make variant the default
//!
//! # Uploads
//! POST /uploads/image                          - Multipart image to Cloudinary (JSON)
//!
//! # Orders
//! GET  /orders?status=                         - Order listing, filtered by status
//! GET  /orders/{id}                            - Order detail
//! POST /orders/{id}/status                     - Change status
//! POST /orders/{id}/tracking                   - Set or clear tracking id
//! POST /orders/{id}/delete                     - Delete order
//! GET  /orders/{id}/invoice                    - Printable invoice
//!
//! # Coupons
//! GET  /coupons                                - Coupon listing and create form
//! POST /coupons                                - Create coupon
//! GET  /coupons/generate-code                  - Random code (fragment)
//! POST /coupons/{id}/toggle                    - Activate or deactivate
//! POST /coupons/{id}/delete                    - Delete coupon
//!
//! # Settings
//! GET  /settings                               - Settings form
//! POST /settings                               - Save settings
//! POST /settings/reset                         - Restore defaults
//!
//! # Reviews
//! POST /reviews/{product_id}/{review_id}/delete - Delete review
//! ```

pub mod auth;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod settings;
pub mod uploads;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/new", get(products::new_product))
        .route("/{id}", post(products::update))
        .route("/{id}/edit", get(products::edit))
        .route("/{id}/delete", post(products::delete))
        .route("/{id}/variants", post(products::add_variant))
        .route("/{id}/variants/{variant_id}/delete", post(products::delete_variant))
        .route(
            "/{id}/variants/{variant_id}/default",
            post(products::set_default_variant),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", post(orders::update_status))
        .route("/{id}/tracking", post(orders::update_tracking))
        .route("/{id}/delete", post(orders::delete))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::index).post(coupons::create))
        .route("/generate-code", get(coupons::generate))
        .route("/{id}/toggle", post(coupons::toggle))
        .route("/{id}/delete", post(coupons::delete))
}

/// Create all routes for the admin panel.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/products", product_routes())
        .route(
            "/uploads/image",
            post(uploads::upload_image).layer(DefaultBodyLimit::max(uploads::BODY_LIMIT)),
        )
        .nest("/orders", order_routes())
        .nest("/coupons", coupon_routes())
        .route("/settings", get(settings::show).post(settings::update))
        .route("/settings/reset", post(settings::reset))
        .route(
            "/reviews/{product_id}/{review_id}/delete",
            post(reviews::delete),
        )
}
