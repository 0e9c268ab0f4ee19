//! Billing repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use telcox_core::{
    models::Billing,
    traits::{BillingRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of BillingRepository
pub struct PgBillingRepository {
    pool: PgPool,
}

impl PgBillingRepository {
    /// Create a new billing repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Billing, i32> for PgBillingRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<Billing>> {
        debug!("Finding billing by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, BillingRow>(
            r#"
            SELECT id, customer_id, current_balance, currency, next_bill_date, monthly_fee
            FROM billing
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding billing {}: {}", id, e);
            AppError::Database(format!("Failed to find billing: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Billing>> {
        let rows = sqlx::query_as::<sqlx::Postgres, BillingRow>(
            r#"
            SELECT id, customer_id, current_balance, currency, next_bill_date, monthly_fee
            FROM billing
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding billings: {}", e);
            AppError::Database(format!("Failed to fetch billings: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM billing")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting billings: {}", e);
                AppError::Database(format!("Failed to count billings: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Billing) -> AppResult<Billing> {
        debug!("Creating billing for customer: {}", entity.customer_id);

        let row = sqlx::query_as::<sqlx::Postgres, BillingRow>(
            r#"
            INSERT INTO billing (customer_id, current_balance, currency, next_bill_date, monthly_fee)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, customer_id, current_balance, currency, next_bill_date, monthly_fee
            "#,
        )
        .bind(&entity.customer_id)
        .bind(entity.current_balance)
        .bind(&entity.currency)
        .bind(entity.next_bill_date)
        .bind(entity.monthly_fee)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating billing: {}", e);
            if e.to_string().contains("foreign key constraint") {
                AppError::not_found("Customer")
            } else {
                AppError::Database(format!("Failed to create billing: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Billing) -> AppResult<Billing> {
        debug!("Updating billing: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, BillingRow>(
            r#"
            UPDATE billing
            SET customer_id = $2,
                current_balance = $3,
                currency = $4,
                next_bill_date = $5,
                monthly_fee = $6
            WHERE id = $1
            RETURNING id, customer_id, current_balance, currency, next_bill_date, monthly_fee
            "#,
        )
        .bind(entity.id)
        .bind(&entity.customer_id)
        .bind(entity.current_balance)
        .bind(&entity.currency)
        .bind(entity.next_bill_date)
        .bind(entity.monthly_fee)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating billing {}: {}", entity.id, e);
            AppError::Database(format!("Failed to update billing: {}", e))
        })?
        .ok_or_else(|| AppError::not_found("Billing"))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting billing: {}", id);

        let result = sqlx::query("DELETE FROM billing WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting billing {}: {}", id, e);
                AppError::Database(format!("Failed to delete billing: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BillingRepository for PgBillingRepository {
    #[instrument(skip(self))]
    async fn find_by_customer(&self, customer_id: &str) -> AppResult<Option<Billing>> {
        let result = sqlx::query_as::<sqlx::Postgres, BillingRow>(
            r#"
            SELECT id, customer_id, current_balance, currency, next_bill_date, monthly_fee
            FROM billing
            WHERE customer_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error finding billing for customer {}: {}",
                customer_id, e
            );
            AppError::Database(format!("Failed to find billing: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct BillingRow {
    id: i32,
    customer_id: String,
    current_balance: Option<Decimal>,
    currency: Option<String>,
    next_bill_date: Option<NaiveDate>,
    monthly_fee: Option<Decimal>,
}

impl From<BillingRow> for Billing {
    fn from(row: BillingRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            current_balance: row.current_balance,
            currency: row.currency,
            next_bill_date: row.next_bill_date,
            monthly_fee: row.monthly_fee,
        }
    }
}
