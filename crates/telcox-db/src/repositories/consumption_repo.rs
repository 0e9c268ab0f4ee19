//! Consumption repository implementation
//!
//! PostgreSQL-backed storage for consumption counters. Every write bumps the
//! row `version`; `commit_batch` uses it as an optimistic lock so concurrent
//! read-modify-write sequences cannot silently overwrite each other.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use telcox_core::{
    models::{Consumption, ConsumptionType},
    traits::{ConsumptionRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument, warn};

const SELECT_COLUMNS: &str =
    "id, customer_id, type, used, total, unit, percentage, reset_date, version";

/// PostgreSQL implementation of ConsumptionRepository
pub struct PgConsumptionRepository {
    pool: PgPool,
}

impl PgConsumptionRepository {
    /// Create a new consumption repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database type string to enum
    fn parse_type(s: &str) -> ConsumptionType {
        ConsumptionType::from_str(s).unwrap_or(ConsumptionType::Data)
    }
}

#[async_trait]
impl Repository<Consumption, i32> for PgConsumptionRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Consumption>> {
        debug!("Finding consumption by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, ConsumptionRow>(&format!(
            "SELECT {} FROM consumption WHERE id = $1",
            SELECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding consumption {}: {}", id, e);
            AppError::Database(format!("Failed to find consumption: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Consumption>> {
        let rows = sqlx::query_as::<sqlx::Postgres, ConsumptionRow>(&format!(
            "SELECT {} FROM consumption ORDER BY id LIMIT $1 OFFSET $2",
            SELECT_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding consumptions: {}", e);
            AppError::Database(format!("Failed to fetch consumptions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM consumption")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting consumptions: {}", e);
                AppError::Database(format!("Failed to count consumptions: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Consumption) -> AppResult<Consumption> {
        debug!(
            "Creating {} consumption for customer {}",
            entity.kind, entity.customer_id
        );

        let row = sqlx::query_as::<sqlx::Postgres, ConsumptionRow>(&format!(
            r#"
            INSERT INTO consumption (customer_id, type, used, total, unit, percentage, reset_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(&entity.customer_id)
        .bind(entity.kind.as_str())
        .bind(entity.used)
        .bind(entity.total)
        .bind(&entity.unit)
        .bind(entity.percentage)
        .bind(entity.reset_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating consumption: {}", e);
            let message = e.to_string();
            if message.contains("unique constraint") {
                AppError::AlreadyExists(format!(
                    "Consumption of type {} already exists for customer {}",
                    entity.kind, entity.customer_id
                ))
            } else if message.contains("foreign key constraint") {
                AppError::not_found("Customer")
            } else {
                AppError::Database(format!("Failed to create consumption: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Consumption) -> AppResult<Consumption> {
        debug!("Updating consumption: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, ConsumptionRow>(&format!(
            r#"
            UPDATE consumption
            SET customer_id = $2,
                type = $3,
                used = $4,
                total = $5,
                unit = $6,
                percentage = $7,
                reset_date = $8,
                version = version + 1
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(entity.id)
        .bind(&entity.customer_id)
        .bind(entity.kind.as_str())
        .bind(entity.used)
        .bind(entity.total)
        .bind(&entity.unit)
        .bind(entity.percentage)
        .bind(entity.reset_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating consumption {}: {}", entity.id, e);
            AppError::Database(format!("Failed to update consumption: {}", e))
        })?
        .ok_or_else(|| AppError::not_found("Consumption"))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting consumption: {}", id);

        let result = sqlx::query("DELETE FROM consumption WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting consumption {}: {}", id, e);
                AppError::Database(format!("Failed to delete consumption: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ConsumptionRepository for PgConsumptionRepository {
    #[instrument(skip(self))]
    async fn find_by_customer(&self, customer_id: &str) -> AppResult<Vec<Consumption>> {
        debug!("Finding consumptions for customer: {}", customer_id);

        let rows = sqlx::query_as::<sqlx::Postgres, ConsumptionRow>(&format!(
            "SELECT {} FROM consumption WHERE customer_id = $1 ORDER BY id",
            SELECT_COLUMNS
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error finding consumptions for customer {}: {}",
                customer_id, e
            );
            AppError::Database(format!("Failed to fetch consumptions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, records), fields(batch = records.len()))]
    async fn commit_batch(&self, records: &[Consumption]) -> AppResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        // Start transaction
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        for record in records {
            let result = sqlx::query(
                r#"
                UPDATE consumption
                SET used = $3,
                    percentage = $4,
                    reset_date = $5,
                    version = version + 1
                WHERE id = $1 AND version = $2
                "#,
            )
            .bind(record.id)
            .bind(record.version)
            .bind(record.used)
            .bind(record.percentage)
            .bind(record.reset_date)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to write consumption {}: {}", record.id, e);
                AppError::Database(format!("Failed to write consumption: {}", e))
            })?;

            if result.rows_affected() == 0 {
                // Dropping the transaction rolls back the rows written so far
                warn!(
                    "Consumption {} changed concurrently (read version {}), rolling back batch",
                    record.id, record.version
                );
                return Err(AppError::Conflict(format!(
                    "Consumption {} was modified concurrently",
                    record.id
                )));
            }
        }

        // Commit transaction
        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        debug!("Committed {} consumption records", records.len());

        Ok(records.len())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ConsumptionRow {
    id: i32,
    customer_id: String,
    #[sqlx(rename = "type")]
    kind: String,
    used: Decimal,
    total: Decimal,
    unit: String,
    percentage: Option<Decimal>,
    reset_date: Option<NaiveDate>,
    version: i32,
}

impl From<ConsumptionRow> for Consumption {
    fn from(row: ConsumptionRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            kind: PgConsumptionRepository::parse_type(&row.kind),
            used: row.used,
            total: row.total,
            unit: row.unit,
            percentage: row.percentage,
            reset_date: row.reset_date,
            version: row.version,
        }
    }
}
