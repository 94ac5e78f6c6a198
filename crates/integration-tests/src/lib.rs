//! Integration test harness for InnovaCart.
//!
//! Each test boots the real storefront or admin router on an ephemeral port,
//! backed by the in-process database and identity provider, and drives it
//! over HTTP with a cookie-carrying `reqwest` client.
//!
//! # Running Tests
//!
//! ```bash
//! task test:integration
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use chrono::{Days, Utc};
use reqwest::{Client, Response, redirect};
use rust_decimal::Decimal;
use secrecy::SecretString;

use innovacart_admin::config::AdminConfig;
use innovacart_core::catalog::{Product, ProductVariant};
use innovacart_core::coupon::{Coupon, expiry_from_date};
use innovacart_core::{DiscountType, ProductId, VariantId};
use innovacart_firebase::{
    AuthUser, FirebaseConfig, IdentityClient, RealtimeDatabase, Repositories,
};
use innovacart_storefront::config::StorefrontConfig;

/// Password used for every test account.
pub const PASSWORD: &str = "correct-horse";

/// Email on the admin allowlist.
pub const ADMIN_EMAIL: &str = "owner@innovacart.test";

const SESSION_SECRET: &str = "integration-test-session-secret-0123456789-abcdefghijklmnopqrstuv";

/// Shared in-process backends, seeded directly by tests.
#[derive(Clone)]
pub struct Backend {
    pub database: RealtimeDatabase,
    pub identity: IdentityClient,
    pub repos: Repositories,
}

impl Backend {
    #[must_use]
    pub fn new() -> Self {
        let database = RealtimeDatabase::memory();
        Self {
            repos: Repositories::new(database.clone()),
            identity: IdentityClient::memory(),
            database,
        }
    }

    /// Store a simple product without variants.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub async fn product(&self, name: &str, price: i64, category: &str) -> Product {
        let product = Product {
            id: ProductId::default(),
            name: name.to_string(),
            description: format!("{name} for tests"),
            price: Decimal::from(price),
            category: category.to_string(),
            image: String::new(),
            stock: 25,
            has_variants: false,
            variants: Vec::new(),
            created_at: Utc::now(),
        };
        self.repos
            .products
            .add(product)
            .await
            .expect("Failed to seed product")
    }

    /// Store a product with variants given as `(id, price override, stock)`.
    /// The first variant is the default; names are the upper-cased ids.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub async fn product_with_variants(
        &self,
        name: &str,
        price: i64,
        category: &str,
        variants: &[(&str, Option<i64>, u32)],
    ) -> Product {
        let mut product = Product {
            id: ProductId::default(),
            name: name.to_string(),
            description: format!("{name} for tests"),
            price: Decimal::from(price),
            category: category.to_string(),
            image: String::new(),
            stock: 0,
            has_variants: false,
            variants: Vec::new(),
            created_at: Utc::now(),
        };
        for (id, price, stock) in variants {
            product.add_variant(ProductVariant {
                id: VariantId::new(*id),
                name: id.to_uppercase(),
                price: price.map(Decimal::from),
                stock: *stock,
                default: false,
            });
        }
        self.repos
            .products
            .add(product)
            .await
            .expect("Failed to seed product")
    }

    /// Change the stock of a product without variants.
    ///
    /// # Panics
    ///
    /// Panics if the product is missing or the write fails.
    pub async fn set_stock(&self, product: &Product, stock: u32) {
        let mut updated = product.clone();
        updated.stock = stock;
        self.repos
            .products
            .update(&product.id, updated)
            .await
            .expect("Failed to update stock");
    }

    /// Store an active coupon valid for a week.
    ///
    /// # Panics
    ///
    /// Panics if the write fails.
    pub async fn coupon(&self, code: &str, discount: i64, discount_type: DiscountType) -> Coupon {
        let expires = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(7))
            .expect("date in range");
        let coupon = Coupon::new(
            code,
            Decimal::from(discount),
            discount_type,
            10,
            expiry_from_date(expires),
        );
        self.repos
            .coupons
            .add(coupon)
            .await
            .expect("Failed to seed coupon")
    }

    /// Create a customer account.
    ///
    /// # Panics
    ///
    /// Panics if the account exists.
    pub async fn account(&self, email: &str) -> AuthUser {
        self.identity
            .sign_up(email, PASSWORD, Some("Test Customer"))
            .await
            .expect("Failed to create account")
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

/// A running server plus a client holding its cookies.
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
}

impl TestServer {
    /// Serve `app` on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot bind.
    pub async fn spawn(app: Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        // Redirects are asserted on, never followed.
        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            client,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// Post a urlencoded form.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Post a form the way HTMX does.
    ///
    /// # Panics
    ///
    /// Panics if the request fails.
    pub async fn htmx_post(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .header("HX-Request", "true")
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }
}

/// `Location` header of a redirect response.
///
/// # Panics
///
/// Panics if the header is missing.
#[must_use]
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("Response has no Location header")
        .to_string()
}

fn firebase() -> FirebaseConfig {
    FirebaseConfig::memory()
}

/// Storefront config for local plain-HTTP tests.
#[must_use]
pub fn storefront_config() -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        firebase: firebase(),
        cache_ttl: Duration::from_secs(60),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Admin config allowing only [`ADMIN_EMAIL`].
#[must_use]
pub fn admin_config() -> AdminConfig {
    AdminConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        session_secret: SecretString::from(SESSION_SECRET),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        firebase: firebase(),
        cloudinary: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// Start the storefront over `backend`.
pub async fn storefront(backend: &Backend) -> TestServer {
    let state = innovacart_storefront::state::AppState::from_parts(
        storefront_config(),
        backend.database.clone(),
        backend.identity.clone(),
    );
    TestServer::spawn(innovacart_storefront::app(state)).await
}

/// Start the admin panel over `backend`.
pub async fn admin(backend: &Backend) -> TestServer {
    let state = innovacart_admin::state::AppState::from_parts(
        admin_config(),
        backend.database.clone(),
        backend.identity.clone(),
        None,
    );
    TestServer::spawn(innovacart_admin::app(state)).await
}

/// Start the admin panel and sign in as [`ADMIN_EMAIL`].
///
/// # Panics
///
/// Panics if sign-in does not redirect to the dashboard.
pub async fn signed_in_admin(backend: &Backend) -> TestServer {
    backend.account(ADMIN_EMAIL).await;
    let server = admin(backend).await;
    let response = server
        .post(
            "/auth/login",
            &[("email", ADMIN_EMAIL), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(location(&response), "/", "admin sign-in failed");
    server
}
