//! Shared types, errors, and configuration for Dashbank.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes
//! - Typed IDs for document-store entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
