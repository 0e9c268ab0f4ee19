//! Consumption DTOs
//!
//! Request and response types for consumption record endpoints. The derived
//! `percentage` is recomputed from `used`/`total` unless the caller supplies it.

use super::common::to_f64;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use telcox_core::{
    models::{Consumption, ConsumptionType},
    AppError, AppResult,
};
use validator::Validate;

fn parse_type(value: &str) -> AppResult<ConsumptionType> {
    ConsumptionType::from_str(value)
        .ok_or_else(|| AppError::Validation(format!("Invalid consumption type: {}", value)))
}

fn ensure_non_negative(field: &str, value: Decimal) -> AppResult<()> {
    if value < Decimal::ZERO {
        return Err(AppError::Validation(format!("{} must not be negative", field)));
    }
    Ok(())
}

fn ensure_within_total(used: Decimal, total: Decimal) -> AppResult<()> {
    if used > total {
        return Err(AppError::Validation(format!(
            "used ({}) must not exceed total ({})",
            used, total
        )));
    }
    Ok(())
}

/// Consumption creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConsumptionCreateRequest {
    #[validate(length(min = 1, max = 50, message = "Customer id is required"))]
    pub customer_id: String,

    /// "data", "minutes" or "sms"
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Consumption type is required"))]
    pub kind: String,

    #[serde(default)]
    pub used: Decimal,

    pub total: Decimal,

    /// Defaults to the type's unit (GB, min, SMS)
    #[validate(length(max = 10))]
    pub unit: Option<String>,

    pub percentage: Option<Decimal>,

    pub reset_date: Option<NaiveDate>,
}

impl ConsumptionCreateRequest {
    /// Convert to Consumption entity
    pub fn to_consumption(&self) -> AppResult<Consumption> {
        let kind = parse_type(&self.kind)?;
        ensure_non_negative("used", self.used)?;
        ensure_non_negative("total", self.total)?;
        ensure_within_total(self.used, self.total)?;

        let percentage = match self.percentage {
            Some(percentage) => Some(percentage),
            None => Consumption::compute_percentage(self.used, self.total),
        };

        Ok(Consumption {
            id: 0,
            customer_id: self.customer_id.clone(),
            kind,
            used: self.used,
            total: self.total,
            unit: self
                .unit
                .clone()
                .unwrap_or_else(|| kind.default_unit().to_string()),
            percentage,
            reset_date: self.reset_date,
            version: 0,
        })
    }
}

/// Consumption update request, absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ConsumptionUpdateRequest {
    #[validate(length(min = 1, max = 50))]
    pub customer_id: Option<String>,

    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub used: Option<Decimal>,

    pub total: Option<Decimal>,

    #[validate(length(max = 10))]
    pub unit: Option<String>,

    pub percentage: Option<Decimal>,

    pub reset_date: Option<NaiveDate>,
}

impl ConsumptionUpdateRequest {
    pub fn apply_to(&self, record: &mut Consumption) -> AppResult<()> {
        let kind = self.kind.as_deref().map(parse_type).transpose()?;
        if let Some(used) = self.used {
            ensure_non_negative("used", used)?;
        }
        if let Some(total) = self.total {
            ensure_non_negative("total", total)?;
        }
        ensure_within_total(
            self.used.unwrap_or(record.used),
            self.total.unwrap_or(record.total),
        )?;

        if let Some(customer_id) = &self.customer_id {
            record.customer_id = customer_id.clone();
        }
        if let Some(kind) = kind {
            record.kind = kind;
        }
        if let Some(used) = self.used {
            record.used = used;
        }
        if let Some(total) = self.total {
            record.total = total;
        }
        if let Some(unit) = &self.unit {
            record.unit = unit.clone();
        }
        if let Some(reset_date) = self.reset_date {
            record.reset_date = Some(reset_date);
        }

        match self.percentage {
            Some(percentage) => record.percentage = Some(percentage),
            None if self.used.is_some() || self.total.is_some() => record.refresh_percentage(),
            None => {}
        }

        Ok(())
    }
}

/// Consumption response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionResponse {
    pub id: i32,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub used: f64,
    pub total: f64,
    pub unit: String,
    pub percentage: Option<f64>,
    pub reset_date: Option<NaiveDate>,
}

impl From<Consumption> for ConsumptionResponse {
    fn from(record: Consumption) -> Self {
        Self {
            id: record.id,
            customer_id: record.customer_id,
            kind: record.kind.to_string(),
            used: to_f64(record.used),
            total: to_f64(record.total),
            unit: record.unit,
            percentage: record.percentage.map(to_f64),
            reset_date: record.reset_date,
        }
    }
}
