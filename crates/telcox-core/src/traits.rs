//! Common traits for repositories
//!
//! Defines the storage abstractions the services and handlers are written
//! against. PostgreSQL and in-memory implementations live in `telcox-db`.

use crate::error::AppError;
use crate::models::{Billing, BillingPayment, Consumption, Customer, CustomerService, Service, Status};
use async_trait::async_trait;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    /// Find entity by ID
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;

    /// Find all entities with pagination, ordered by ID
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;

    /// Count total entities
    async fn count(&self) -> Result<i64, AppError>;

    /// Create a new entity
    ///
    /// Store-assigned identifiers in `entity` are ignored.
    async fn create(&self, entity: &T) -> Result<T, AppError>;

    /// Update an existing entity
    async fn update(&self, entity: &T) -> Result<T, AppError>;

    /// Delete entity by ID
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// Customer repository trait with specialized methods
#[async_trait]
pub trait CustomerRepository: Repository<Customer, String> {
    /// List customers with the given status
    async fn find_by_status(&self, status: Status) -> Result<Vec<Customer>, AppError>;
}

/// Consumption repository trait
///
/// This is the store shared by the simulator, the reset operation and the
/// background updater.
#[async_trait]
pub trait ConsumptionRepository: Repository<Consumption, i32> {
    /// All records of a customer, ordered by ID
    async fn find_by_customer(&self, customer_id: &str) -> Result<Vec<Consumption>, AppError>;

    /// Persist engine-computed counters for a batch of records atomically
    ///
    /// Each record is written only if its stored `version` still equals the
    /// version it was read with; the stored version is then incremented. If
    /// any record fails that check the whole batch is rolled back and
    /// `AppError::Conflict` is returned. Returns the number of rows written.
    async fn commit_batch(&self, records: &[Consumption]) -> Result<usize, AppError>;
}

/// Billing repository trait with specialized methods
#[async_trait]
pub trait BillingRepository: Repository<Billing, i32> {
    /// First billing account of a customer
    async fn find_by_customer(&self, customer_id: &str) -> Result<Option<Billing>, AppError>;
}

/// Billing payment repository trait with specialized methods
#[async_trait]
pub trait PaymentRepository: Repository<BillingPayment, i32> {
    /// Most recent payment of a billing account by payment date
    async fn find_latest_by_billing(
        &self,
        billing_id: i32,
    ) -> Result<Option<BillingPayment>, AppError>;
}

/// Service repository trait with specialized methods
#[async_trait]
pub trait ServiceRepository: Repository<Service, String> {
    /// Services assigned to a customer
    async fn find_by_customer(&self, customer_id: &str) -> Result<Vec<Service>, AppError>;
}

/// Customer/service assignment repository
#[async_trait]
pub trait CustomerServiceRepository: Send + Sync {
    async fn find_all(&self) -> Result<Vec<CustomerService>, AppError>;

    async fn find(
        &self,
        customer_id: &str,
        service_id: &str,
    ) -> Result<Option<CustomerService>, AppError>;

    async fn create(&self, assignment: &CustomerService) -> Result<CustomerService, AppError>;

    async fn delete(&self, customer_id: &str, service_id: &str) -> Result<bool, AppError>;
}

/// Pagination parameters
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 1000),
        }
    }

    /// Rows to skip, saturating for pages far past the end
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}
