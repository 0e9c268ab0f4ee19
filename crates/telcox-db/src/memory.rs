//! In-memory store
//!
//! A process-local implementation of every repository trait, used when no
//! database URL is configured and by the service and API test suites. It
//! enforces the same keys, cascades and optimistic version checks as the
//! PostgreSQL schema, and can simulate an outage.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use telcox_core::{
    models::{Billing, BillingPayment, Consumption, Customer, CustomerService, Service, Status},
    traits::{
        BillingRepository, ConsumptionRepository, CustomerRepository, CustomerServiceRepository,
        PaymentRepository, Repository, ServiceRepository,
    },
    AppError, AppResult,
};
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct State {
    customers: BTreeMap<String, Customer>,
    consumptions: BTreeMap<i32, Consumption>,
    billings: BTreeMap<i32, Billing>,
    payments: BTreeMap<i32, BillingPayment>,
    services: BTreeMap<String, Service>,
    assignments: BTreeSet<(String, String)>,
}

fn next_id<V>(map: &BTreeMap<i32, V>) -> i32 {
    map.keys().next_back().map_or(1, |id| id + 1)
}

fn page<V: Clone>(values: impl Iterator<Item = V>, limit: i64, offset: i64) -> Vec<V> {
    values
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

/// Thread-safe in-memory implementation of all repositories
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    fail_commits: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail as if the database were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make `commit_batch` fail while reads keep working
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            warn!("In-memory store is marked unavailable");
            return Err(AppError::Database("Store unavailable".to_string()));
        }
        Ok(())
    }
}

// ==================== Customers ====================

#[async_trait]
impl Repository<Customer, String> for MemoryStore {
    async fn find_by_id(&self, id: String) -> AppResult<Option<Customer>> {
        self.check_available()?;
        Ok(self.state.read().customers.get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Customer>> {
        self.check_available()?;
        Ok(page(self.state.read().customers.values().cloned(), limit, offset))
    }

    async fn count(&self) -> AppResult<i64> {
        self.check_available()?;
        Ok(self.state.read().customers.len() as i64)
    }

    async fn create(&self, entity: &Customer) -> AppResult<Customer> {
        self.check_available()?;
        let mut state = self.state.write();
        if state.customers.contains_key(&entity.id) {
            return Err(AppError::AlreadyExists(format!(
                "Customer {} already exists",
                entity.id
            )));
        }
        state.customers.insert(entity.id.clone(), entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &Customer) -> AppResult<Customer> {
        self.check_available()?;
        let mut state = self.state.write();
        let slot = state
            .customers
            .get_mut(&entity.id)
            .ok_or_else(|| AppError::not_found("Customer"))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: String) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write();
        if state.customers.remove(&id).is_none() {
            return Ok(false);
        }

        // Mirror the ON DELETE CASCADE rules of the schema
        state.consumptions.retain(|_, c| c.customer_id != id);
        let billing_ids: Vec<i32> = state
            .billings
            .values()
            .filter(|b| b.customer_id == id)
            .map(|b| b.id)
            .collect();
        state.billings.retain(|_, b| b.customer_id != id);
        state
            .payments
            .retain(|_, p| !billing_ids.contains(&p.billing_id));
        state.assignments.retain(|(customer_id, _)| *customer_id != id);

        debug!("Deleted customer {} and dependent rows", id);
        Ok(true)
    }
}

#[async_trait]
impl CustomerRepository for MemoryStore {
    async fn find_by_status(&self, status: Status) -> AppResult<Vec<Customer>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .customers
            .values()
            .filter(|c| c.status == status)
            .cloned()
            .collect())
    }
}

// ==================== Consumptions ====================

#[async_trait]
impl Repository<Consumption, i32> for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Consumption>> {
        self.check_available()?;
        Ok(self.state.read().consumptions.get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Consumption>> {
        self.check_available()?;
        Ok(page(
            self.state.read().consumptions.values().cloned(),
            limit,
            offset,
        ))
    }

    async fn count(&self) -> AppResult<i64> {
        self.check_available()?;
        Ok(self.state.read().consumptions.len() as i64)
    }

    async fn create(&self, entity: &Consumption) -> AppResult<Consumption> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.customers.contains_key(&entity.customer_id) {
            return Err(AppError::not_found("Customer"));
        }
        let duplicate = state
            .consumptions
            .values()
            .any(|c| c.customer_id == entity.customer_id && c.kind == entity.kind);
        if duplicate {
            return Err(AppError::AlreadyExists(format!(
                "Consumption of type {} already exists for customer {}",
                entity.kind, entity.customer_id
            )));
        }

        let record = Consumption {
            id: next_id(&state.consumptions),
            version: 0,
            ..entity.clone()
        };
        state.consumptions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, entity: &Consumption) -> AppResult<Consumption> {
        self.check_available()?;
        let mut state = self.state.write();
        let slot = state
            .consumptions
            .get_mut(&entity.id)
            .ok_or_else(|| AppError::not_found("Consumption"))?;
        let version = slot.version + 1;
        *slot = Consumption {
            version,
            ..entity.clone()
        };
        Ok(slot.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        self.check_available()?;
        Ok(self.state.write().consumptions.remove(&id).is_some())
    }
}

#[async_trait]
impl ConsumptionRepository for MemoryStore {
    async fn find_by_customer(&self, customer_id: &str) -> AppResult<Vec<Consumption>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .consumptions
            .values()
            .filter(|c| c.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn commit_batch(&self, records: &[Consumption]) -> AppResult<usize> {
        self.check_available()?;
        if records.is_empty() {
            return Ok(0);
        }
        if self.fail_commits.load(Ordering::SeqCst) {
            warn!("Simulated commit failure for {} records", records.len());
            return Err(AppError::Transaction(
                "Failed to commit transaction: simulated outage".to_string(),
            ));
        }

        let mut state = self.state.write();

        // Validate every version before touching anything so the batch is all-or-nothing
        for record in records {
            let current = state.consumptions.get(&record.id).map(|c| c.version);
            if current != Some(record.version) {
                warn!(
                    "Consumption {} changed concurrently (read version {}, stored {:?})",
                    record.id, record.version, current
                );
                return Err(AppError::Conflict(format!(
                    "Consumption {} was modified concurrently",
                    record.id
                )));
            }
        }

        for record in records {
            if let Some(stored) = state.consumptions.get_mut(&record.id) {
                stored.used = record.used;
                stored.percentage = record.percentage;
                stored.reset_date = record.reset_date;
                stored.version += 1;
            }
        }

        Ok(records.len())
    }
}

// ==================== Billing ====================

#[async_trait]
impl Repository<Billing, i32> for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Billing>> {
        self.check_available()?;
        Ok(self.state.read().billings.get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Billing>> {
        self.check_available()?;
        Ok(page(self.state.read().billings.values().cloned(), limit, offset))
    }

    async fn count(&self) -> AppResult<i64> {
        self.check_available()?;
        Ok(self.state.read().billings.len() as i64)
    }

    async fn create(&self, entity: &Billing) -> AppResult<Billing> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.customers.contains_key(&entity.customer_id) {
            return Err(AppError::not_found("Customer"));
        }
        let billing = Billing {
            id: next_id(&state.billings),
            ..entity.clone()
        };
        state.billings.insert(billing.id, billing.clone());
        Ok(billing)
    }

    async fn update(&self, entity: &Billing) -> AppResult<Billing> {
        self.check_available()?;
        let mut state = self.state.write();
        let slot = state
            .billings
            .get_mut(&entity.id)
            .ok_or_else(|| AppError::not_found("Billing"))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write();
        let removed = state.billings.remove(&id).is_some();
        if removed {
            state.payments.retain(|_, p| p.billing_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl BillingRepository for MemoryStore {
    async fn find_by_customer(&self, customer_id: &str) -> AppResult<Option<Billing>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .billings
            .values()
            .find(|b| b.customer_id == customer_id)
            .cloned())
    }
}

// ==================== Payments ====================

#[async_trait]
impl Repository<BillingPayment, i32> for MemoryStore {
    async fn find_by_id(&self, id: i32) -> AppResult<Option<BillingPayment>> {
        self.check_available()?;
        Ok(self.state.read().payments.get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<BillingPayment>> {
        self.check_available()?;
        Ok(page(self.state.read().payments.values().cloned(), limit, offset))
    }

    async fn count(&self) -> AppResult<i64> {
        self.check_available()?;
        Ok(self.state.read().payments.len() as i64)
    }

    async fn create(&self, entity: &BillingPayment) -> AppResult<BillingPayment> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.billings.contains_key(&entity.billing_id) {
            return Err(AppError::not_found("Billing"));
        }
        let payment = BillingPayment {
            id: next_id(&state.payments),
            ..entity.clone()
        };
        state.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn update(&self, entity: &BillingPayment) -> AppResult<BillingPayment> {
        self.check_available()?;
        let mut state = self.state.write();
        let slot = state
            .payments
            .get_mut(&entity.id)
            .ok_or_else(|| AppError::not_found("Payment"))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: i32) -> AppResult<bool> {
        self.check_available()?;
        Ok(self.state.write().payments.remove(&id).is_some())
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn find_latest_by_billing(&self, billing_id: i32) -> AppResult<Option<BillingPayment>> {
        self.check_available()?;
        // Undated payments sort before any dated one, ties go to the newest id
        Ok(self
            .state
            .read()
            .payments
            .values()
            .filter(|p| p.billing_id == billing_id)
            .max_by_key(|p| (p.payment_date, p.id))
            .cloned())
    }
}

// ==================== Services ====================

#[async_trait]
impl Repository<Service, String> for MemoryStore {
    async fn find_by_id(&self, id: String) -> AppResult<Option<Service>> {
        self.check_available()?;
        Ok(self.state.read().services.get(&id).cloned())
    }

    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Service>> {
        self.check_available()?;
        Ok(page(self.state.read().services.values().cloned(), limit, offset))
    }

    async fn count(&self) -> AppResult<i64> {
        self.check_available()?;
        Ok(self.state.read().services.len() as i64)
    }

    async fn create(&self, entity: &Service) -> AppResult<Service> {
        self.check_available()?;
        let mut state = self.state.write();
        if state.services.contains_key(&entity.id) {
            return Err(AppError::AlreadyExists(format!(
                "Service {} already exists",
                entity.id
            )));
        }
        state.services.insert(entity.id.clone(), entity.clone());
        Ok(entity.clone())
    }

    async fn update(&self, entity: &Service) -> AppResult<Service> {
        self.check_available()?;
        let mut state = self.state.write();
        let slot = state
            .services
            .get_mut(&entity.id)
            .ok_or_else(|| AppError::not_found("Service"))?;
        *slot = entity.clone();
        Ok(entity.clone())
    }

    async fn delete(&self, id: String) -> AppResult<bool> {
        self.check_available()?;
        let mut state = self.state.write();
        let removed = state.services.remove(&id).is_some();
        if removed {
            state.assignments.retain(|(_, service_id)| *service_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl ServiceRepository for MemoryStore {
    async fn find_by_customer(&self, customer_id: &str) -> AppResult<Vec<Service>> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state
            .assignments
            .iter()
            .filter(|(c, _)| c == customer_id)
            .filter_map(|(_, s)| state.services.get(s).cloned())
            .collect())
    }
}

#[async_trait]
impl CustomerServiceRepository for MemoryStore {
    async fn find_all(&self) -> AppResult<Vec<CustomerService>> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .assignments
            .iter()
            .map(|(customer_id, service_id)| CustomerService {
                customer_id: customer_id.clone(),
                service_id: service_id.clone(),
            })
            .collect())
    }

    async fn find(&self, customer_id: &str, service_id: &str) -> AppResult<Option<CustomerService>> {
        self.check_available()?;
        let key = (customer_id.to_string(), service_id.to_string());
        Ok(self
            .state
            .read()
            .assignments
            .contains(&key)
            .then(|| CustomerService {
                customer_id: key.0.clone(),
                service_id: key.1.clone(),
            }))
    }

    async fn create(&self, assignment: &CustomerService) -> AppResult<CustomerService> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.customers.contains_key(&assignment.customer_id)
            || !state.services.contains_key(&assignment.service_id)
        {
            return Err(AppError::NotFound(
                "Customer or service not found".to_string(),
            ));
        }
        let inserted = state.assignments.insert((
            assignment.customer_id.clone(),
            assignment.service_id.clone(),
        ));
        if !inserted {
            return Err(AppError::AlreadyExists(
                "Service already assigned to customer".to_string(),
            ));
        }
        Ok(assignment.clone())
    }

    async fn delete(&self, customer_id: &str, service_id: &str) -> AppResult<bool> {
        self.check_available()?;
        Ok(self
            .state
            .write()
            .assignments
            .remove(&(customer_id.to_string(), service_id.to_string())))
    }
}
