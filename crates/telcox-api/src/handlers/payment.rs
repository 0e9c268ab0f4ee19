//! Billing payment handlers

use crate::dto::{
    MessageResponse, PaginationParams, PaymentCreateRequest, PaymentResponse,
    PaymentUpdateRequest,
};
use actix_web::{web, HttpResponse};
use telcox_core::AppError;
use telcox_db::Repositories;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// GET /billing_payments
#[instrument(skip(repos))]
pub async fn list_payments(
    repos: web::Data<Repositories>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let page = query.pagination();
    let payments = repos.payments.find_all(page.limit(), page.offset()).await?;

    debug!("Listing {} payments", payments.len());

    let response: Vec<PaymentResponse> = payments.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(response))
}

/// POST /billing_payments
#[instrument(skip(repos, req))]
pub async fn create_payment(
    repos: web::Data<Repositories>,
    req: web::Json<PaymentCreateRequest>,
) -> Result<HttpResponse, AppError> {
    req.validate().map_err(|e| {
        warn!("Payment creation validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    let created = repos.payments.create(&req.to_payment()).await?;

    info!(
        id = created.id,
        billing_id = created.billing_id,
        amount = %created.amount,
        "Payment created"
    );

    Ok(HttpResponse::Created().json(MessageResponse::new("Payment created")))
}

/// GET /billing_payments/{id}
#[instrument(skip(repos))]
pub async fn get_payment(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let payment = repos
        .payments
        .find_by_id(path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;

    Ok(HttpResponse::Ok().json(PaymentResponse::from(payment)))
}

/// PUT /billing_payments/{id}
#[instrument(skip(repos, req))]
pub async fn update_payment(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
    req: web::Json<PaymentUpdateRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let mut payment = repos
        .payments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Payment"))?;

    req.validate().map_err(|e| {
        warn!("Payment update validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    req.apply_to(&mut payment);
    repos.payments.update(&payment).await?;

    info!(id, "Payment updated");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Payment updated")))
}

/// DELETE /billing_payments/{id}
#[instrument(skip(repos))]
pub async fn delete_payment(
    repos: web::Data<Repositories>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if !repos.payments.delete(id).await? {
        return Err(AppError::not_found("Payment"));
    }

    info!(id, "Payment deleted");

    Ok(HttpResponse::Ok().json(MessageResponse::new("Payment deleted")))
}

/// Configure payment routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/billing_payments")
            .route("", web::get().to(list_payments))
            .route("", web::post().to(create_payment))
            .route("/{id}", web::get().to(get_payment))
            .route("/{id}", web::put().to(update_payment))
            .route("/{id}", web::delete().to(delete_payment)),
    );
}
