//! Customer usage handlers
//!
//! Realtime dashboard data plus the simulate and reset operations.

use crate::dto::{RealtimeResponse, ResetConsumptionResponse, SimulateUsageResponse};
use actix_web::{web, HttpResponse};
use telcox_core::AppError;
use telcox_services::{RealtimeService, UsageService};
use tracing::{info, instrument};

/// Consolidated realtime view of a customer
///
/// GET /api/customer/{id}/realtime
#[instrument(skip(realtime))]
pub async fn get_realtime(
    realtime: web::Data<RealtimeService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let snapshot = realtime.snapshot(&customer_id).await?;

    Ok(HttpResponse::Ok().json(RealtimeResponse::from(snapshot)))
}

/// Apply one burst of simulated usage to every counter of a customer
///
/// POST /api/customer/{id}/simulate-usage
#[instrument(skip(usage))]
pub async fn simulate_usage(
    usage: web::Data<UsageService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let updates = usage.simulate(&customer_id).await?;

    info!(customer_id = %customer_id, updates = updates.len(), "Usage simulated");

    Ok(HttpResponse::Ok().json(SimulateUsageResponse::new(updates, usage.now())))
}

/// Start a new consumption cycle for a customer
///
/// POST /api/customer/{id}/reset-consumption
#[instrument(skip(usage))]
pub async fn reset_consumption(
    usage: web::Data<UsageService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let count = usage.reset(&customer_id).await?;

    info!(customer_id = %customer_id, records = count, "Consumption reset");

    Ok(HttpResponse::Ok().json(ResetConsumptionResponse::new(usage.now())))
}

/// Configure usage routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/customer")
            .route("/{id}/realtime", web::get().to(get_realtime))
            .route("/{id}/simulate-usage", web::post().to(simulate_usage))
            .route("/{id}/reset-consumption", web::post().to(reset_consumption)),
    );
}
