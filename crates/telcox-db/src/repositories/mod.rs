//! Repository implementations
//!
//! This module contains concrete implementations of all repository traits
//! defined in telcox-core, using sqlx for PostgreSQL access.

pub mod billing_repo;
pub mod consumption_repo;
pub mod customer_repo;
pub mod payment_repo;
pub mod service_repo;

pub use billing_repo::PgBillingRepository;
pub use consumption_repo::PgConsumptionRepository;
pub use customer_repo::PgCustomerRepository;
pub use payment_repo::PgPaymentRepository;
pub use service_repo::{PgCustomerServiceRepository, PgServiceRepository};
