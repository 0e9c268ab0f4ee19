//! HTTP request handlers

pub mod billing;
pub mod consumption;
pub mod customer;
pub mod customer_service;
pub mod health;
pub mod payment;
pub mod service;
pub mod usage;

pub use billing::configure as configure_billing;
pub use consumption::configure as configure_consumption;
pub use customer::configure as configure_customer;
pub use customer_service::configure as configure_customer_service;
pub use health::configure as configure_health;
pub use payment::configure as configure_payment;
pub use service::configure as configure_service;
pub use usage::configure as configure_usage;
