//! Core types for InnovaCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{PriceError, TAKA, format_taka, parse_amount, round_money};
pub use status::*;
