//! Customer/service assignment handlers

use crate::dto::{CustomerServiceDto, MessageResponse};
use actix_web::{web, HttpResponse};
use telcox_core::{models::CustomerService, AppError};
use telcox_db::Repositories;
use tracing::{info, instrument, warn};
use validator::Validate;

/// GET /customer_services
#[instrument(skip(repos))]
pub async fn list_assignments(repos: web::Data<Repositories>) -> Result<HttpResponse, AppError> {
    let assignments = repos.customer_services.find_all().await?;

    let response: Vec<CustomerServiceDto> = assignments.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /customer_services
#[instrument(skip(repos, req))]
pub async fn assign_service(
    repos: web::Data<Repositories>,
    req: web::Json<CustomerServiceDto>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Assignment validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let assignment = CustomerService::from(&*req);
    repos.customer_services.create(&assignment).await?;

    info!(
        customer_id = %assignment.customer_id,
        service_id = %assignment.service_id,
        "Service assigned"
    );

    Ok(HttpResponse::Created().json(MessageResponse::new("Service assigned to customer")))
}

/// DELETE /customer_services/{customer_id}/{service_id}
#[instrument(skip(repos))]
pub async fn unassign_service(
    repos: web::Data<Repositories>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AppError> {
    let (customer_id, service_id) = path.into_inner();

    if !repos
        .customer_services
        .delete(&customer_id, &service_id)
        .await?
    {
        return Err(AppError::not_found("CustomerService"));
    }

    info!(customer_id = %customer_id, service_id = %service_id, "Service unassigned");

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Service unassigned from customer",
    )))
}

/// Configure assignment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/customer_services")
            .route("", web::get().to(list_assignments))
            .route("", web::post().to(assign_service))
            .route(
                "/{customer_id}/{service_id}",
                web::delete().to(unassign_service),
            ),
    );
}
