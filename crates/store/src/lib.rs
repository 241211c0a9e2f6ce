//! Adapters for the Dashbank core ports.
//!
//! This crate provides:
//! - `HttpDocumentStore` for the module catalog, preferences and collections
//! - `HttpRateSource` for exchange rates, with `CachedRateSource` in front
//! - `InMemoryStore` implementing every port for tests and demos

pub mod cache;
pub mod error;
pub mod http;
pub mod memory;
pub mod rates;

pub use cache::CachedRateSource;
pub use error::StoreError;
pub use http::HttpDocumentStore;
pub use memory::{InMemoryStore, Operation};
pub use rates::HttpRateSource;
