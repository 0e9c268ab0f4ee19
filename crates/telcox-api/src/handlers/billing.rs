//! Billing account handlers

use crate::dto::{
    BillingCreateRequest, BillingResponse, BillingUpdateRequest, MessageResponse,
    PaginationParams,
};
use actix_web::{web, HttpResponse};
use telcox_core::AppError;
use telcox_db::Repositories;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// GET /billings
#[instrument(skip(repos))]
pub async fn list_billings(
    repos: web::Data<Repositories>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = query.pagination();
    let billings = repos.billings.find_all(page.limit(), page.offset()).await?;

    debug!("Listing {} billing accounts", billings.len());

    let response: Vec<BillingResponse> = billings.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /billings
#[instrument(skip(repos, req))]
pub async fn create_billing(
    repos: web::Data<Repositories>,
    req: web::Json<BillingCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Billing creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = repos.billings.create(&req.to_billing()).await?;

    info!(id = created.id, customer_id = %created.customer_id, "Billing created");

    Ok(HttpResponse::Created().json(MessageResponse::new("Billing created")))
}

/// GET /billings/{id}
#[instrument(skip(repos))]
pub async fn get_billing(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let billing = repos
        .billings
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Billing"))?;

    Ok(HttpResponse::Ok().json(BillingResponse::from(billing)))
}

/// PUT /billings/{id}
#[instrument(skip(repos, req))]
pub async fn update_billing(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
    req: web::Json<BillingUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let mut billing = repos
        .billings
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Billing"))?;

    req.validate().map_err(|e| {
        warn!("Billing update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    req.apply_to(&mut billing);
    repos.billings.update(&billing).await?;

    info!(id, "Billing updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Billing updated")))
}

/// DELETE /billings/{id}
#[instrument(skip(repos))]
pub async fn delete_billing(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if !repos.billings.delete(id).await? {
        return Err(AppError::not_found("Billing"));
    }

    info!(id, "Billing deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Billing deleted")))
}

/// Configure billing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/billings")
            .route("", web::get().to(list_billings))
            .route("", web::post().to(create_billing))
            .route("/{id}", web::get().to(get_billing))
            .route("/{id}", web::put().to(update_billing))
            .route("/{id}", web::delete().to(delete_billing)),
    );
}
