//! Consumption model
//!
//! A consumption record is one (customer, usage type) counter pair with a
//! derived percentage and a reset date. Records are keyed logically by
//! `(customer_id, kind)`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Usage counter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsumptionType {
    /// Mobile data, counted in GB
    Data,
    /// Voice minutes
    Minutes,
    /// Text messages
    Sms,
}

impl fmt::Display for ConsumptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConsumptionType {
    /// All types, in display order
    pub const ALL: [ConsumptionType; 3] = [
        ConsumptionType::Data,
        ConsumptionType::Minutes,
        ConsumptionType::Sms,
    ];

    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "data" => Some(ConsumptionType::Data),
            "minutes" => Some(ConsumptionType::Minutes),
            "sms" => Some(ConsumptionType::Sms),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionType::Data => "data",
            ConsumptionType::Minutes => "minutes",
            ConsumptionType::Sms => "sms",
        }
    }

    /// Label used in change descriptions
    pub fn label(&self) -> &'static str {
        match self {
            ConsumptionType::Data => "Data",
            ConsumptionType::Minutes => "Minutes",
            ConsumptionType::Sms => "SMS",
        }
    }

    /// Suffix appended to increments in change descriptions
    pub fn suffix(&self) -> &'static str {
        match self {
            ConsumptionType::Data => "GB",
            ConsumptionType::Minutes => "min",
            ConsumptionType::Sms => "",
        }
    }

    /// Display unit used when a customer has no record of this type
    pub fn default_unit(&self) -> &'static str {
        match self {
            ConsumptionType::Data => "GB",
            ConsumptionType::Minutes => "min",
            ConsumptionType::Sms => "SMS",
        }
    }
}

/// Consumption record entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consumption {
    /// Surrogate identifier
    pub id: i32,

    /// Owning customer
    pub customer_id: String,

    /// Usage type
    #[serde(rename = "type")]
    pub kind: ConsumptionType,

    /// Amount consumed in the current cycle
    pub used: Decimal,

    /// Cycle allowance (cap)
    pub total: Decimal,

    /// Display unit
    pub unit: String,

    /// `round(used / total * 100, 1)`, absent when `total` is zero
    pub percentage: Option<Decimal>,

    /// Date the next cycle starts
    pub reset_date: Option<NaiveDate>,

    /// Optimistic concurrency stamp, bumped by every committed write
    pub version: i32,
}

impl Consumption {
    /// Derive the usage percentage for a used/total pair
    ///
    /// Returns `None` when `total` is not positive or the ratio falls outside
    /// the decimal range.
    pub fn compute_percentage(used: Decimal, total: Decimal) -> Option<Decimal> {
        if total <= Decimal::ZERO {
            return None;
        }
        used.checked_div(total)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|percentage| percentage.round_dp(1))
    }

    /// Recompute `percentage` from the current counters
    pub fn refresh_percentage(&mut self) {
        self.percentage = Self::compute_percentage(self.used, self.total);
    }

    /// Check if the counter has reached its cap
    #[inline]
    pub fn is_capped(&self) -> bool {
        self.used >= self.total
    }
}

impl Default for Consumption {
    fn default() -> Self {
        Self {
            id: 0,
            customer_id: String::new(),
            kind: ConsumptionType::Data,
            used: Decimal::ZERO,
            total: Decimal::ZERO,
            unit: ConsumptionType::Data.default_unit().to_string(),
            percentage: None,
            reset_date: None,
            version: 0,
        }
    }
}
