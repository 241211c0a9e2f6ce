//! Core dashboard logic for Dashbank.
//!
//! This crate contains pure dashboard logic with ZERO HTTP or store dependencies.
//! Collaborators are reached through the async traits in [`ports`].
//!
//! # Modules
//!
//! - `currency` - Reverse exchange rates and conversion to base currency
//! - `aggregation` - Multi-currency totals and their rendering
//! - `selection` - Bounded multi-select
//! - `modules` - Module catalog, ordering and item visibility
//! - `session` - One user's dashboard, degrading on every failure
//! - `notice` - Dismissible, auto-expiring notices
//! - `fetch` - Last-request-wins fetch gate

pub mod aggregation;
pub mod currency;
pub mod error;
pub mod fetch;
pub mod modules;
pub mod notice;
pub mod ports;
pub mod selection;
pub mod session;

pub use error::{DashboardError, ValidationError};
