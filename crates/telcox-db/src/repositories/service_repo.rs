//! Service and customer/service assignment repositories

use async_trait::async_trait;
use sqlx::PgPool;
use telcox_core::{
    models::{CustomerService, Service, Status},
    traits::{CustomerServiceRepository, Repository, ServiceRepository},
    AppError, AppResult,
};
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of ServiceRepository
pub struct PgServiceRepository {
    pool: PgPool,
}

impl PgServiceRepository {
    /// Create a new service repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository<Service, String> for PgServiceRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: String) -> AppResult<Option<Service>> {
        debug!("Finding service by id: {}", id);

        let result = sqlx::query_as::<sqlx::Postgres, ServiceRow>(
            "SELECT id, name, description, status FROM services WHERE id = $1",
        )
        .bind(&id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding service {}: {}", id, e);
            AppError::Database(format!("Failed to find service: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<Service>> {
        let rows = sqlx::query_as::<sqlx::Postgres, ServiceRow>(
            r#"
            SELECT id, name, description, status
            FROM services
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding services: {}", e);
            AppError::Database(format!("Failed to fetch services: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting services: {}", e);
                AppError::Database(format!("Failed to count services: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &Service) -> AppResult<Service> {
        debug!("Creating service: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, ServiceRow>(
            r#"
            INSERT INTO services (id, name, description, status)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, status
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(entity.status.to_string())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating service: {}", e);
            if e.to_string().contains("unique constraint") {
                AppError::AlreadyExists(format!("Service {} already exists", entity.id))
            } else {
                AppError::Database(format!("Failed to create service: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &Service) -> AppResult<Service> {
        debug!("Updating service: {}", entity.id);

        let row = sqlx::query_as::<sqlx::Postgres, ServiceRow>(
            r#"
            UPDATE services
            SET name = $2,
                description = $3,
                status = $4
            WHERE id = $1
            RETURNING id, name, description, status
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.name)
        .bind(&entity.description)
        .bind(entity.status.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating service {}: {}", entity.id, e);
            AppError::Database(format!("Failed to update service: {}", e))
        })?
        .ok_or_else(|| AppError::not_found("Service"))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: String) -> AppResult<bool> {
        debug!("Deleting service: {}", id);

        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(&id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting service {}: {}", id, e);
                AppError::Database(format!("Failed to delete service: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    #[instrument(skip(self))]
    async fn find_by_customer(&self, customer_id: &str) -> AppResult<Vec<Service>> {
        let rows = sqlx::query_as::<sqlx::Postgres, ServiceRow>(
            r#"
            SELECT s.id, s.name, s.description, s.status
            FROM services s
            INNER JOIN customer_services cs ON cs.service_id = s.id
            WHERE cs.customer_id = $1
            ORDER BY s.id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!(
                "Database error finding services for customer {}: {}",
                customer_id, e
            );
            AppError::Database(format!("Failed to fetch services: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// PostgreSQL implementation of CustomerServiceRepository
pub struct PgCustomerServiceRepository {
    pool: PgPool,
}

impl PgCustomerServiceRepository {
    /// Create a new assignment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerServiceRepository for PgCustomerServiceRepository {
    #[instrument(skip(self))]
    async fn find_all(&self) -> AppResult<Vec<CustomerService>> {
        let rows = sqlx::query_as::<sqlx::Postgres, AssignmentRow>(
            "SELECT customer_id, service_id FROM customer_services ORDER BY customer_id, service_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding assignments: {}", e);
            AppError::Database(format!("Failed to fetch customer services: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        customer_id: &str,
        service_id: &str,
    ) -> AppResult<Option<CustomerService>> {
        let result = sqlx::query_as::<sqlx::Postgres, AssignmentRow>(
            r#"
            SELECT customer_id, service_id
            FROM customer_services
            WHERE customer_id = $1 AND service_id = $2
            "#,
        )
        .bind(customer_id)
        .bind(service_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding assignment: {}", e);
            AppError::Database(format!("Failed to find customer service: {}", e))
        })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn create(&self, assignment: &CustomerService) -> AppResult<CustomerService> {
        debug!(
            "Assigning service {} to customer {}",
            assignment.service_id, assignment.customer_id
        );

        let row = sqlx::query_as::<sqlx::Postgres, AssignmentRow>(
            r#"
            INSERT INTO customer_services (customer_id, service_id)
            VALUES ($1, $2)
            RETURNING customer_id, service_id
            "#,
        )
        .bind(&assignment.customer_id)
        .bind(&assignment.service_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating assignment: {}", e);
            let message = e.to_string();
            if message.contains("duplicate key") || message.contains("unique constraint") {
                AppError::AlreadyExists("Service already assigned to customer".to_string())
            } else if message.contains("foreign key constraint") {
                AppError::NotFound("Customer or service not found".to_string())
            } else {
                AppError::Database(format!("Failed to assign service: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, customer_id: &str, service_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM customer_services WHERE customer_id = $1 AND service_id = $2",
        )
        .bind(customer_id)
        .bind(service_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error deleting assignment: {}", e);
            AppError::Database(format!("Failed to unassign service: {}", e))
        })?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: String,
    name: String,
    description: Option<String>,
    status: String,
}

impl From<ServiceRow> for Service {
    fn from(row: ServiceRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            status: Status::from_str(&row.status).unwrap_or(Status::Active),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    customer_id: String,
    service_id: String,
}

impl From<AssignmentRow> for CustomerService {
    fn from(row: AssignmentRow) -> Self {
        Self {
            customer_id: row.customer_id,
            service_id: row.service_id,
        }
    }
}
