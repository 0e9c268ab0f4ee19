//! TelcoX Storage Layer
//!
//! This crate provides the persistence side of the TelcoX backend. It includes:
//!
//! - Connection pool management and embedded migrations with sqlx
//! - PostgreSQL repository implementations for all domain entities
//! - An in-memory store implementing the same traits
//! - `Repositories`, the bundle of trait objects handed to services and handlers

pub mod memory;
pub mod pool;
pub mod repositories;

use std::sync::Arc;
use telcox_core::traits::{
    BillingRepository, ConsumptionRepository, CustomerRepository, CustomerServiceRepository,
    PaymentRepository, ServiceRepository,
};

pub use memory::MemoryStore;
pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use sqlx::PgPool;
pub use telcox_core::{AppError, AppResult};

/// Repository handles shared across the application
#[derive(Clone)]
pub struct Repositories {
    pub customers: Arc<dyn CustomerRepository>,
    pub consumptions: Arc<dyn ConsumptionRepository>,
    pub billings: Arc<dyn BillingRepository>,
    pub payments: Arc<dyn PaymentRepository>,
    pub services: Arc<dyn ServiceRepository>,
    pub customer_services: Arc<dyn CustomerServiceRepository>,
    /// Storage backend name reported by the health endpoint
    pub backend: &'static str,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            customers: Arc::new(PgCustomerRepository::new(pool.clone())),
            consumptions: Arc::new(PgConsumptionRepository::new(pool.clone())),
            billings: Arc::new(PgBillingRepository::new(pool.clone())),
            payments: Arc::new(PgPaymentRepository::new(pool.clone())),
            services: Arc::new(PgServiceRepository::new(pool.clone())),
            customer_services: Arc::new(PgCustomerServiceRepository::new(pool)),
            backend: "postgres",
        }
    }

    /// Every repository served by one in-memory store
    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            customers: store.clone(),
            consumptions: store.clone(),
            billings: store.clone(),
            payments: store.clone(),
            services: store.clone(),
            customer_services: store,
            backend: "memory",
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories")
            .field("backend", &self.backend)
            .finish()
    }
}
