//! Customer handlers
//!
//! HTTP handlers for customer management endpoints.

use crate::dto::{
    CustomerCreateRequest, CustomerResponse, CustomerUpdateRequest, MessageResponse,
    PaginationParams,
};
use actix_web::{web, HttpResponse};
use telcox_core::AppError;
use telcox_db::Repositories;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// List customers
///
/// GET /customers
#[instrument(skip(repos))]
pub async fn list_customers(
    repos: web::Data<Repositories>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = query.pagination();
    let customers = repos.customers.find_all(page.limit(), page.offset()).await?;

    debug!("Listing {} customers", customers.len());

    let response: Vec<CustomerResponse> = customers.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// Create a new customer
///
/// POST /customers
#[instrument(skip(repos, req))]
pub async fn create_customer(
    repos: web::Data<Repositories>,
    req: web::Json<CustomerCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Customer creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let customer = req.to_customer()?;
    let created = repos.customers.create(&customer).await?;

    info!(id = %created.id, "Customer created");

    Ok(HttpResponse::Created().json(MessageResponse::new("Customer created")))
}

/// Get a single customer
///
/// GET /customers/{id}
#[instrument(skip(repos))]
pub async fn get_customer(
    repos: web::Data<Repositories>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer = repos
        .customers
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;

    Ok(HttpResponse::Ok().json(CustomerResponse::from(customer)))
}

/// Update a customer
///
/// PUT /customers/{id}
#[instrument(skip(repos, req))]
pub async fn update_customer(
    repos: web::Data<Repositories>,
    path: web::Path<String>,
    req: web::Json<CustomerUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let mut customer = repos
        .customers
        .find_by_id(id.clone())
        .await?
        .ok_or_else(|| AppError::not_found("Customer"))?;

    req.validate().map_err(|e| {
        warn!("Customer update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    req.apply_to(&mut customer)?;
    repos.customers.update(&customer).await?;

    info!(id = %id, "Customer updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Customer updated")))
}

/// Delete a customer and everything attached to it
///
/// DELETE /customers/{id}
#[instrument(skip(repos))]
pub async fn delete_customer(
    repos: web::Data<Repositories>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if !repos.customers.delete(id.clone()).await? {
        return Err(AppError::not_found("Customer"));
    }

    info!(id = %id, "Customer deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Customer deleted")))
}

/// Configure customer routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customers")
            .route("", web::get().to(list_customers))
            .route("", web::post().to(create_customer))
            .route("/{id}", web::get().to(get_customer))
            .route("/{id}", web::put().to(update_customer))
            .route("/{id}", web::delete().to(delete_customer)),
    );
}
