//! Domain models for TelcoX
//!
//! This module contains all the core domain models used throughout the application.

pub mod billing;
pub mod consumption;
pub mod customer;
pub mod service;

pub use billing::{Billing, BillingPayment, DEFAULT_CURRENCY};
pub use consumption::{Consumption, ConsumptionType};
pub use customer::{Customer, Status};
pub use service::{CustomerService, Service};
