//! Typed repositories over the database paths.
//!
//! | Path | Repository |
//! |------|------------|
//! | `settings` | [`SettingsRepository`] |
//! | `products/{id}` | [`ProductRepository`] |
//! | `orders/{id}` | [`OrderRepository`] |
//! | `coupons/{id}` | [`CouponRepository`] |
//! | `reviews/{productId}/{id}` | [`ReviewRepository`] |
//! | `admins` | [`AdminRepository`] |

mod admins;
mod cache;
mod coupons;
mod orders;
mod products;
mod reviews;
mod settings;

pub use admins::{AdminRecord, AdminRepository};
pub use cache::CatalogCache;
pub use coupons::CouponRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use settings::SettingsRepository;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::database::RealtimeDatabase;

/// Current time truncated to the millisecond precision the database stores.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Every repository over one database handle.
#[derive(Debug, Clone)]
pub struct Repositories {
    pub database: RealtimeDatabase,
    pub settings: SettingsRepository,
    pub products: ProductRepository,
    pub orders: OrderRepository,
    pub coupons: CouponRepository,
    pub reviews: ReviewRepository,
    pub admins: AdminRepository,
}

impl Repositories {
    /// Repositories that always read through to the database.
    #[must_use]
    pub fn new(database: RealtimeDatabase) -> Self {
        Self::build(database, None)
    }

    /// Repositories that cache settings and product reads for `ttl`.
    #[must_use]
    pub fn cached(database: RealtimeDatabase, ttl: Duration) -> Self {
        Self::build(database, Some(CatalogCache::new(ttl)))
    }

    fn build(database: RealtimeDatabase, cache: Option<CatalogCache>) -> Self {
        Self {
            settings: SettingsRepository::new(database.clone(), cache.clone()),
            products: ProductRepository::new(database.clone(), cache),
            orders: OrderRepository::new(database.clone()),
            coupons: CouponRepository::new(database.clone()),
            reviews: ReviewRepository::new(database.clone()),
            admins: AdminRepository::new(database.clone()),
            database,
        }
    }
}
