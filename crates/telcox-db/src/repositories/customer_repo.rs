//! Customer repository implementation
//!
//! Provides PostgreSQL-backed storage for customer entities.

use async_trait::async_trait;
use sqlx::PgPool;
use telcox_core::{
    models::{Customer, Status},
    traits::{CustomerRepository, Repository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of CustomerRepository
pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    /// Create a new customer repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Convert database status string to enum
    fn parse_status(s: &str) -> Status {
        Status::from_str(s).unwrap_or(Status::Active)
    }
}

#[async_trait]
impl Repository<Customer, String> for PgCustomerRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: String) -> AppResult<Option<Customer>> {
        debug!("Finding customer by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, CustomerRow>(
            r#"
            SELECT id, name, email, phone, plan, status
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(&id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding customer {}: {}", id, e);
            AppError::Database(format!("Failed to find customer: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Customer>> {
        debug!(
            "Finding all customers with limit {} offset {}",
            limit, offset
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CustomerRow>(
            r#"
            SELECT id, name, email, phone, plan, status
            FROM customers
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding customers: {}", e);
            AppError::Database(format!("Failed to fetch customers: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting customers: {}", e);
                AppError::Database(format!("Failed to count customers: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Customer) -> AppResult<Customer> {
        debug!("Creating customer: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, CustomerRow>(
            r#"
            INSERT INTO customers (id, name, email, phone, plan, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, phone, plan, status
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.name)
        .bind(&entity.email)
        .bind(&entity.phone)
        .bind(&entity.plan)
        .bind(entity.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating customer: {}", e);
            if e.to_string().contains("unique constraint") {
                AppError::AlreadyExists(format!("Customer {} already exists", entity.id))
            } else {
                AppError::Database(format!("Failed to create customer: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Customer) -> AppResult<Customer> {
        debug!("Updating customer: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, CustomerRow>(
            r#"
            UPDATE customers
            SET name = $2,
                email = $3,
                phone = $4,
                plan = $5,
                status = $6
            WHERE id = $1
            RETURNING id, name, email, phone, plan, status
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.name)
        .bind(&entity.email)
        .bind(&entity.phone)
        .bind(&entity.plan)
        .bind(entity.status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating customer {}: {}", entity.id, e);
            AppError::Database(format!("Failed to update customer: {}", e))
        })?
        .ok_or_else(|| AppError::not_found("Customer"))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: String) -> AppResult<bool> {
        debug!("Deleting customer: {}", id);

        // Consumptions, billings and assignments cascade in the schema
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(&id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting customer {}: {}", id, e);
                AppError::Database(format!("Failed to delete customer: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    #[instrument(skip(self))]
    async fn find_by_status(&self, status: Status) -> AppResult<Vec<Customer>> {
        debug!("Finding customers with status: {}", status);

        let rows = sqlx::query_as::<sqlx::Postgres, CustomerRow>(
            r#"
            SELECT id, name, email, phone, plan, status
            FROM customers
            WHERE status = $1
            ORDER BY id
            "#,
        )
        .bind(status.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding customers by status: {}", e);
            AppError::Database(format!("Failed to fetch customers: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    plan: Option<String>,
    status: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            plan: row.plan,
            status: PgCustomerRepository::parse_status(&row.status),
        }
    }
}
