//! Common DTOs used across the API

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use telcox_core::{models::Status, traits::Pagination, AppError, AppResult};
use validator::Validate;

/// Plain `{"message": ...}` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pagination query parameters for list endpoints
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 1000))]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    1000
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

/// Decimal rendered as a JSON number
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Optional decimal rendered as a JSON number, absent values become 0
#[inline]
pub fn to_f64_or_zero(value: Option<Decimal>) -> f64 {
    value.map(to_f64).unwrap_or_default()
}

/// Parse a lifecycle status field
pub fn parse_status(value: &str) -> AppResult<Status> {
    Status::from_str(value)
        .ok_or_else(|| AppError::Validation(format!("Invalid status: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decimal_conversion() {
        assert_eq!(to_f64(dec!(1.25)), 1.25);
        assert_eq!(to_f64_or_zero(None), 0.0);
        assert_eq!(to_f64_or_zero(Some(dec!(29.99))), 29.99);
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("Inactive").unwrap(), Status::Inactive);
        assert!(matches!(
            parse_status("suspended"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_pagination_defaults() {
        let params = PaginationParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.pagination().offset(), 0);
        assert_eq!(params.pagination().limit(), 1000);

        let params = PaginationParams {
            page: 0,
            per_page: 10,
        };
        assert!(params.validate().is_err());
    }
}
