//! Background auto-updater
//!
//! Periodically applies small usage increments to every active customer so
//! dashboards see counters move. The job is owned by the process: `spawn`
//! returns a handle whose `shutdown` cancels the loop and waits for it.
//!
//! A pass reads everything it needs, computes the new counters and commits
//! them as one version-checked batch. A failing or panicking pass writes
//! nothing, is logged, and the loop carries on at the next tick.

use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use telcox_core::{
    models::Status,
    traits::{ConsumptionRepository, CustomerRepository},
    AppError, AppResult, Clock,
};
use telcox_db::Repositories;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::usage_engine::{apply_increment, IncrementSource, TRICKLE};

/// Outcome of one successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// 1-based pass number since the updater was created
    pub pass: u64,
    pub customers_scanned: usize,
    pub records_examined: usize,
    pub records_updated: usize,
    pub completed_at: DateTime<Utc>,
}

/// Periodic usage updater
pub struct AutoUpdater {
    customers: Arc<dyn CustomerRepository>,
    consumptions: Arc<dyn ConsumptionRepository>,
    clock: Arc<dyn Clock>,
    source: Box<dyn IncrementSource>,
    period: Duration,
    passes: u64,
}

impl AutoUpdater {
    /// Create a new updater running every `period` (at least one second)
    pub fn new(
        repos: &Repositories,
        clock: Arc<dyn Clock>,
        source: Box<dyn IncrementSource>,
        period: Duration,
    ) -> Self {
        Self {
            customers: repos.customers.clone(),
            consumptions: repos.consumptions.clone(),
            clock,
            source,
            period: period.max(Duration::from_secs(1)),
            passes: 0,
        }
    }

    /// Number of passes attempted so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one pass over all active customers
    ///
    /// Records already at their cap are skipped, as are zero draws. On any
    /// store failure nothing is written and `AppError::BackgroundPass` is
    /// returned carrying the pass number.
    #[instrument(skip(self), fields(pass = self.passes + 1))]
    pub async fn run_pass(&mut self) -> AppResult<PassReport> {
        self.passes += 1;
        let pass = self.passes;

        self.execute_pass(pass)
            .await
            .map_err(|e| AppError::BackgroundPass {
                pass,
                reason: e.to_string(),
            })
    }

    async fn execute_pass(&mut self, pass: u64) -> AppResult<PassReport> {
        let customers = self.customers.find_by_status(Status::Active).await?;

        let mut records_examined = 0;
        let mut updated = Vec::new();

        for customer in &customers {
            let records = self.consumptions.find_by_customer(&customer.id).await?;
            records_examined += records.len();

            for record in records.iter().filter(|r| !r.is_capped()) {
                let increment = TRICKLE.draw(record.kind, &mut *self.source);
                if increment.is_zero() {
                    continue;
                }
                let (next, description) = apply_increment(record, increment);
                debug!("Customer {} {}", customer.id, description);
                updated.push(next);
            }
        }

        let records_updated = self.consumptions.commit_batch(&updated).await?;

        Ok(PassReport {
            pass,
            customers_scanned: customers.len(),
            records_examined,
            records_updated,
            completed_at: self.clock.now(),
        })
    }

    /// `run_pass`, with a panic inside the pass reported as a failed pass
    async fn run_pass_isolated(&mut self) -> AppResult<PassReport> {
        let outcome = AssertUnwindSafe(self.run_pass()).catch_unwind().await;
        match outcome {
            Ok(result) => result,
            Err(panic) => Err(AppError::BackgroundPass {
                pass: self.passes,
                reason: format!("panicked: {}", panic_message(panic.as_ref())),
            }),
        }
    }

    /// Start the loop on the tokio runtime
    ///
    /// The first pass runs immediately. Ticks missed while a pass is running
    /// are delayed rather than replayed.
    pub fn spawn(self, cancel: CancellationToken) -> AutoUpdaterHandle {
        let token = cancel.clone();
        let task = tokio::spawn(self.run(token));

        AutoUpdaterHandle { cancel, task }
    }

    async fn run(mut self, cancel: CancellationToken) -> u64 {
        info!(
            "Auto-updater started with a {}s interval",
            self.period.as_secs_f64()
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.run_pass_isolated().await {
                Ok(report) => info!(
                    pass = report.pass,
                    customers = report.customers_scanned,
                    examined = report.records_examined,
                    updated = report.records_updated,
                    "Auto-update pass completed"
                ),
                Err(e) => error!(code = e.error_code(), "{}", e),
            }
        }

        info!("Auto-updater stopped after {} passes", self.passes);
        self.passes
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Handle to a running auto-updater
pub struct AutoUpdaterHandle {
    cancel: CancellationToken,
    task: JoinHandle<u64>,
}

impl AutoUpdaterHandle {
    /// Token that stops the loop when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the loop and wait for the in-flight pass to finish
    ///
    /// Returns the number of passes attempted.
    pub async fn shutdown(self) -> AppResult<u64> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| AppError::Internal(format!("Auto-updater task failed: {}", e)))
    }
}
