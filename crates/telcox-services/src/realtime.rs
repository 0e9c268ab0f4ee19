//! Realtime snapshot
//!
//! Gathers everything the customer dashboard shows in one read: profile,
//! consumption counters, billing account with its latest payment and the
//! assigned services.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use telcox_core::{
    models::{Billing, BillingPayment, Consumption, ConsumptionType, Customer, Service},
    traits::{
        BillingRepository, ConsumptionRepository, CustomerRepository, PaymentRepository,
        ServiceRepository,
    },
    AppError, AppResult, Clock,
};
use telcox_db::Repositories;
use tracing::{debug, instrument};

/// Point-in-time view of a customer account
#[derive(Debug, Clone)]
pub struct RealtimeSnapshot {
    pub taken_at: DateTime<Utc>,
    pub customer: Customer,
    pub consumptions: Vec<Consumption>,
    pub billing: Option<Billing>,
    pub last_payment: Option<BillingPayment>,
    pub services: Vec<Service>,
}

impl RealtimeSnapshot {
    /// Record of the given type, if the customer has one
    pub fn consumption(&self, kind: ConsumptionType) -> Option<&Consumption> {
        self.consumptions.iter().find(|c| c.kind == kind)
    }
}

/// Read-only service assembling realtime snapshots
pub struct RealtimeService {
    customers: Arc<dyn CustomerRepository>,
    consumptions: Arc<dyn ConsumptionRepository>,
    billings: Arc<dyn BillingRepository>,
    payments: Arc<dyn PaymentRepository>,
    services: Arc<dyn ServiceRepository>,
    clock: Arc<dyn Clock>,
}

impl RealtimeService {
    pub fn new(repos: &Repositories, clock: Arc<dyn Clock>) -> Self {
        Self {
            customers: repos.customers.clone(),
            consumptions: repos.consumptions.clone(),
            billings: repos.billings.clone(),
            payments: repos.payments.clone(),
            services: repos.services.clone(),
            clock,
        }
    }

    /// Build the snapshot for a customer
    ///
    /// Fails with `NotFound("Customer not found")` for an unknown id.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, customer_id: &str) -> AppResult<RealtimeSnapshot> {
        let customer = self
            .customers
            .find_by_id(customer_id.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Customer"))?;

        let consumptions = self.consumptions.find_by_customer(customer_id).await?;
        let billing = self.billings.find_by_customer(customer_id).await?;

        let last_payment = match &billing {
            Some(billing) => self.payments.find_latest_by_billing(billing.id).await?,
            None => None,
        };

        let services = self.services.find_by_customer(customer_id).await?;

        debug!(
            "Snapshot for {}: {} records, {} services",
            customer_id,
            consumptions.len(),
            services.len()
        );

        Ok(RealtimeSnapshot {
            taken_at: self.clock.now(),
            customer,
            consumptions,
            billing,
            last_payment,
            services,
        })
    }
}
