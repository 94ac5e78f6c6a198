//! InnovaCart Core - Shared domain library.
//!
//! This crate provides the domain model used across all InnovaCart components:
//! - `firebase` - Realtime Database and Identity Toolkit clients
//! - `storefront` - Public-facing shop
//! - `admin` - Store administration dashboard
//! - `cli` - Maintenance commands
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Everything that reaches a network lives in
//! `innovacart-firebase` or the binaries.
//!
//! # Modules
//!
//! - [`types`] - Keys, money, email and status enums
//! - [`catalog`] - Products, variants and category matching
//! - [`cart`] - Session cart arithmetic
//! - [`coupon`] - Coupon validation and discounts
//! - [`delivery`] - Districts and delivery charges
//! - [`order`] - Orders, checkout validation and dashboard statistics
//! - [`invoice`] - Display-ready invoice figures
//! - [`review`] - Product reviews and ratings
//! - [`settings`] - Site settings record

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod delivery;
pub mod invoice;
pub mod order;
pub mod review;
pub mod settings;
pub mod types;

pub use types::*;
