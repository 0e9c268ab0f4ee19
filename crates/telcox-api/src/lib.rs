//! API layer for the TelcoX backend
//!
//! HTTP handlers for the customer dashboard: realtime usage, usage
//! simulation, consumption resets and CRUD over the account tables.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

use actix_web::{
    error::{JsonPayloadError, QueryPayloadError},
    web, HttpRequest,
};
use telcox_core::AppError;
use tracing::warn;

pub use dto::{MessageResponse, PaginationParams};
pub use handlers::{
    configure_billing, configure_consumption, configure_customer, configure_customer_service,
    configure_health, configure_payment, configure_service, configure_usage,
};

/// JSON extractor configuration
///
/// Malformed bodies and missing required fields are reported with the same
/// `{"error": ...}` envelope as every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        warn!("Rejected request body: {}", err);
        AppError::Validation(err.to_string()).into()
    })
}

/// Query string extractor configuration, same envelope as `json_config`
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        warn!("Rejected query string: {}", err);
        AppError::Validation(err.to_string()).into()
    })
}

/// Register every route of the API
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health)
        .configure(configure_usage)
        .configure(configure_customer)
        .configure(configure_consumption)
        .configure(configure_billing)
        .configure(configure_payment)
        .configure(configure_service)
        .configure(configure_customer_service);
}
