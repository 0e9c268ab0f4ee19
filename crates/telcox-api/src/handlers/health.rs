//! Health check handler

use crate::dto::HealthResponse;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use telcox_db::Repositories;

/// Service name reported by the health endpoint
pub const SERVICE_NAME: &str = "TelcoX Backend";

/// GET /api/health
pub async fn health_check(repos: web::Data<Repositories>) -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        database: repos.backend.to_string(),
    })
}

/// Configure health route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health_check));
}
