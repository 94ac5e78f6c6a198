//! InnovaCart Firebase - clients for the hosted backend.
//!
//! # Modules
//!
//! - [`config`] - Connection settings shared by the binaries
//! - [`database`] - Realtime Database client (REST or in-memory)
//! - [`auth`] - Identity Toolkit email/password accounts
//! - [`repositories`] - Typed access to settings, products, orders, coupons,
//!   reviews and the admin roster
//! - [`push_id`] - Chronologically ordered record keys
//!
//! Both clients have an in-memory transport so the binaries and tests run
//! without network access.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod push_id;
pub mod repositories;

pub use auth::{AuthError, AuthUser, IdentityClient, is_admin};
pub use config::FirebaseConfig;
pub use database::RealtimeDatabase;
pub use error::{FirebaseError, RepositoryError};
pub use repositories::Repositories;
