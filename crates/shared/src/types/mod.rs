//! Common types used across the application.

pub mod currency;
pub mod id;

pub use currency::{BASE_CURRENCY, CurrencyCode};
pub use id::*;
