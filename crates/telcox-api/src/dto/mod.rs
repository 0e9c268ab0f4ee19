//! Data Transfer Objects (DTOs) for API requests and responses
//!
//! Decimal quantities are rendered as JSON numbers.

pub mod billing;
pub mod common;
pub mod consumption;
pub mod customer;
pub mod service;
pub mod usage;

pub use billing::*;
pub use common::*;
pub use consumption::*;
pub use customer::*;
pub use service::*;
pub use usage::*;
