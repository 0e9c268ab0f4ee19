//! Billing payment repository implementation

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use telcox_core::{
    models::BillingPayment,
    traits::{PaymentRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of PaymentRepository
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<BillingPayment, i32> for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i32) -> AppResult<Option<BillingPayment>> {
        debug!("Finding payment by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT id, billing_id, amount, payment_date, method
            FROM billing_payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment {}: {}", id, e);
            AppError::Database(format!("Failed to find payment: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<BillingPayment>> {
        let rows = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT id, billing_id, amount, payment_date, method
            FROM billing_payments
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payments: {}", e);
            AppError::Database(format!("Failed to fetch payments: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM billing_payments")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting payments: {}", e);
                AppError::Database(format!("Failed to count payments: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &BillingPayment) -> AppResult<BillingPayment> {
        debug!("Creating payment for billing: {}", entity.billing_id);

        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            INSERT INTO billing_payments (billing_id, amount, payment_date, method)
            VALUES ($1, $2, $3, $4)
            RETURNING id, billing_id, amount, payment_date, method
            "#,
        )
        .bind(entity.billing_id)
        .bind(entity.amount)
        .bind(entity.payment_date)
        .bind(&entity.method)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating payment: {}", e);
            if e.to_string().contains("foreign key constraint") {
                AppError::not_found("Billing")
            } else {
                AppError::Database(format!("Failed to create payment: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &BillingPayment) -> AppResult<BillingPayment> {
        debug!("Updating payment: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            UPDATE billing_payments
            SET billing_id = $2,
                amount = $3,
                payment_date = $4,
                method = $5
            WHERE id = $1
            RETURNING id, billing_id, amount, payment_date, method
            "#,
        )
        .bind(entity.id)
        .bind(entity.billing_id)
        .bind(entity.amount)
        .bind(entity.payment_date)
        .bind(&entity.method)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating payment {}: {}", entity.id, e);
            AppError::Database(format!("Failed to update payment: {}", e))
        })?
        .ok_or_else(|| AppError::not_found("Payment"))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i32) -> AppResult<bool> {
        debug!("Deleting payment: {}", id);

        let result = sqlx::query("DELETE FROM billing_payments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting payment {}: {}", id, e);
                AppError::Database(format!("Failed to delete payment: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    #[instrument(skip(self))]
    async fn find_latest_by_billing(&self, billing_id: i32) -> AppResult<Option<BillingPayment>> {
        let result = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT id, billing_id, amount, payment_date, method
            FROM billing_payments
            WHERE billing_id = $1
            ORDER BY payment_date DESC NULLS LAST, id DESC
            LIMIT 1
            "#,
        )
        .bind(billing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error finding last payment for billing {}: {}",
                billing_id, e
            );
            AppError::Database(format!("Failed to find payment: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: i32,
    billing_id: i32,
    amount: Decimal,
    payment_date: Option<NaiveDate>,
    method: Option<String>,
}

impl From<PaymentRow> for BillingPayment {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            billing_id: row.billing_id,
            amount: row.amount,
            payment_date: row.payment_date,
            method: row.method,
        }
    }
}
