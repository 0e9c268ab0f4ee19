//! Service catalogue handlers

use crate::dto::{
    MessageResponse, PaginationParams, ServiceCreateRequest, ServiceResponse,
    ServiceUpdateRequest,
};
use actix_web::{web, HttpResponse};
use telcox_core::AppError;
use telcox_db::Repositories;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// GET /services
#[instrument(skip(repos))]
pub async fn list_services(
    repos: web::Data<Repositories>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = query.pagination();
    let services = repos.services.find_all(page.limit(), page.offset()).await?;

    debug!("Listing {} services", services.len());

    let response: Vec<ServiceResponse> = services.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /services
#[instrument(skip(repos, req))]
pub async fn create_service(
    repos: web::Data<Repositories>,
    req: web::Json<ServiceCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Service creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = repos.services.create(&req.to_service()?).await?;

    info!(id = %created.id, "Service created");

    Ok(HttpResponse::Created().json(MessageResponse::new("Service created")))
}

/// GET /services/{id}
#[instrument(skip(repos))]
pub async fn get_service(
    repos: web::Data<Repositories>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let service = repos
        .services
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Service"))?;

    Ok(HttpResponse::Ok().json(ServiceResponse::from(service)))
}

/// PUT /services/{id}
#[instrument(skip(repos, req))]
pub async fn update_service(
    repos: web::Data<Repositories>,
    path: web::Path<String>,
    req: web::Json<ServiceUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let mut service = repos
        .services
        .find_by_id(id.clone())
        .await?
        .ok_or_else(|| AppError::not_found("Service"))?;

    req.validate().map_err(|e| {
        warn!("Service update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    req.apply_to(&mut service)?;
    repos.services.update(&service).await?;

    info!(id = %id, "Service updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Service updated")))
}

/// DELETE /services/{id}
#[instrument(skip(repos))]
pub async fn delete_service(
    repos: web::Data<Repositories>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if !repos.services.delete(id.clone()).await? {
        return Err(AppError::not_found("Service"));
    }

    info!(id = %id, "Service deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Service deleted")))
}

/// Configure service routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/services")
            .route("", web::get().to(list_services))
            .route("", web::post().to(create_service))
            .route("/{id}", web::get().to(get_service))
            .route("/{id}", web::put().to(update_service))
            .route("/{id}", web::delete().to(delete_service)),
    );
}
