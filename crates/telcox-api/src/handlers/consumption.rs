//! Consumption handlers
//!
//! Direct maintenance of consumption records. Counters written here go
//! through the same versioned store as the usage simulator.

use crate::dto::{
    ConsumptionCreateRequest, ConsumptionResponse, ConsumptionUpdateRequest, MessageResponse,
    PaginationParams,
};
use actix_web::{web, HttpResponse};
use telcox_core::AppError;
use telcox_db::Repositories;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// GET /consumptions
#[instrument(skip(repos))]
pub async fn list_consumptions(
    repos: web::Data<Repositories>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = query.pagination();
    let records = repos
        .consumptions
        .find_all(page.limit(), page.offset())
        .await?;

    debug!("Listing {} consumption records", records.len());

    let response: Vec<ConsumptionResponse> = records.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /consumptions
#[instrument(skip(repos, req))]
pub async fn create_consumption(
    repos: web::Data<Repositories>,
    req: web::Json<ConsumptionCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Consumption creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let record = req.to_consumption()?;
    let created = repos.consumptions.create(&record).await?;

    info!(
        id = created.id,
        customer_id = %created.customer_id,
        kind = %created.kind,
        "Consumption created"
    );

    Ok(HttpResponse::Created().json(MessageResponse::new("Consumption created")))
}

/// GET /consumptions/{id}
#[instrument(skip(repos))]
pub async fn get_consumption(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let record = repos
        .consumptions
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Consumption"))?;

    Ok(HttpResponse::Ok().json(ConsumptionResponse::from(record)))
}

/// PUT /consumptions/{id}
#[instrument(skip(repos, req))]
pub async fn update_consumption(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
    req: web::Json<ConsumptionUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let mut record = repos
        .consumptions
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Consumption"))?;

    req.validate().map_err(|e| {
        warn!("Consumption update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    req.apply_to(&mut record)?;
    repos.consumptions.update(&record).await?;

    info!(id, "Consumption updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Consumption updated")))
}

/// DELETE /consumptions/{id}
#[instrument(skip(repos))]
pub async fn delete_consumption(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if !repos.consumptions.delete(id).await? {
        return Err(AppError::not_found("Consumption"));
    }

    info!(id, "Consumption deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Consumption deleted")))
}

/// Configure consumption routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/consumptions")
            .route("", web::get().to(list_consumptions))
            .route("", web::post().to(create_consumption))
            .route("/{id}", web::get().to(get_consumption))
            .route("/{id}", web::put().to(update_consumption))
            .route("/{id}", web::delete().to(delete_consumption)),
    );
}
