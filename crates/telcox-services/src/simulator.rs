//! Usage service
//!
//! Request-triggered operations on a customer's consumption records:
//! - `simulate` applies one burst increment to every record
//! - `reset` starts a new cycle for every record
//!
//! Both read the records, compute new counters and commit them as one
//! version-checked batch. A batch rejected because another writer got there
//! first is recomputed from fresh reads, up to the configured attempt count.

use chrono::Duration;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use telcox_core::{
    config::UsageConfig,
    traits::{ConsumptionRepository, CustomerRepository},
    AppError, AppResult, Clock,
};
use telcox_db::Repositories;
use tracing::{debug, info, instrument, warn};

use crate::usage_engine::{apply_increment, IncrementSource, BURST};

/// Simulate and reset operations over the shared store
pub struct UsageService {
    customers: Arc<dyn CustomerRepository>,
    consumptions: Arc<dyn ConsumptionRepository>,
    clock: Arc<dyn Clock>,
    source: Mutex<Box<dyn IncrementSource>>,
    config: UsageConfig,
}

impl UsageService {
    /// Create a new usage service
    pub fn new(
        repos: &Repositories,
        clock: Arc<dyn Clock>,
        source: Box<dyn IncrementSource>,
        config: UsageConfig,
    ) -> Self {
        Self {
            customers: repos.customers.clone(),
            consumptions: repos.consumptions.clone(),
            clock,
            source: Mutex::new(source),
            config,
        }
    }

    /// Current instant according to the injected clock
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Apply one burst increment to each of the customer's records
    ///
    /// Returns one change description per record, e.g. `"Minutes: +7min"`.
    /// A customer without records yields an empty list.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the customer does not exist
    /// - `Conflict` if concurrent writers kept winning for every attempt
    /// - persistence errors from the store, with nothing written
    #[instrument(skip(self))]
    pub async fn simulate(&self, customer_id: &str) -> AppResult<Vec<String>> {
        let updates = self
            .with_conflict_retry("simulate", move || self.try_simulate(customer_id))
            .await?;

        info!(
            "Simulated usage for customer {}: {} records updated",
            customer_id,
            updates.len()
        );

        Ok(updates)
    }

    /// Start a new cycle for each of the customer's records
    ///
    /// Sets `used` to zero and the reset date to today plus the configured
    /// cycle length. Returns the number of records reset.
    ///
    /// # Errors
    ///
    /// Same as [`UsageService::simulate`].
    #[instrument(skip(self))]
    pub async fn reset(&self, customer_id: &str) -> AppResult<usize> {
        let count = self
            .with_conflict_retry("reset", move || self.try_reset(customer_id))
            .await?;

        info!("Reset {} consumption records for customer {}", count, customer_id);

        Ok(count)
    }

    async fn try_simulate(&self, customer_id: &str) -> AppResult<Vec<String>> {
        self.ensure_customer(customer_id).await?;

        let records = self.consumptions.find_by_customer(customer_id).await?;
        if records.is_empty() {
            debug!("Customer {} has no consumption records", customer_id);
            return Ok(Vec::new());
        }

        let mut updated = Vec::with_capacity(records.len());
        let mut updates = Vec::with_capacity(records.len());
        {
            let mut source = self.source.lock();
            for record in &records {
                let increment = BURST.draw(record.kind, &mut **source);
                let (next, description) = apply_increment(record, increment);
                updated.push(next);
                updates.push(description);
            }
        }

        self.consumptions.commit_batch(&updated).await?;

        Ok(updates)
    }

    async fn try_reset(&self, customer_id: &str) -> AppResult<usize> {
        self.ensure_customer(customer_id).await?;

        let records = self.consumptions.find_by_customer(customer_id).await?;
        let reset_date = self.clock.today() + Duration::days(self.config.reset_cycle_days);

        let updated: Vec<_> = records
            .into_iter()
            .map(|mut record| {
                record.used = Decimal::ZERO;
                record.refresh_percentage();
                record.reset_date = Some(reset_date);
                record
            })
            .collect();

        self.consumptions.commit_batch(&updated).await
    }

    async fn ensure_customer(&self, customer_id: &str) -> AppResult<()> {
        self.customers
            .find_by_id(customer_id.to_string())
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("Customer"))
    }

    /// Run `op` again while it fails with `Conflict`, up to the attempt limit
    async fn with_conflict_retry<T, F, Fut>(&self, operation: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.config.max_conflict_retries.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Err(AppError::Conflict(reason)) if attempt < max_attempts => {
                    warn!(
                        "Concurrent write during {} (attempt {}/{}): {}",
                        operation, attempt, max_attempts, reason
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
