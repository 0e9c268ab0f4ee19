//! TelcoX Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the TelcoX customer-account backend. It includes:
//!
//! - Domain models (Customer, Consumption, Billing, Service, etc.)
//! - Repository traits implemented by the storage layer
//! - Unified error handling with HTTP response mapping
//! - Application configuration
//! - An injectable clock for date-dependent rules

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
