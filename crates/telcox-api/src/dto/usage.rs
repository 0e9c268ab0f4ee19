//! Realtime, usage simulation and health DTOs

use super::common::{to_f64, to_f64_or_zero};
use super::customer::CustomerResponse;
use super::service::ServiceResponse;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use telcox_core::models::{
    Billing, BillingPayment, Consumption, ConsumptionType, DEFAULT_CURRENCY,
};
use telcox_services::RealtimeSnapshot;

fn date_or_empty(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

/// Response of `POST /api/customer/{id}/simulate-usage`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateUsageResponse {
    pub message: String,
    /// One description per updated record, e.g. "Data: +0.25GB"
    pub updates: Vec<String>,
    pub timestamp: String,
}

impl SimulateUsageResponse {
    pub fn new(updates: Vec<String>, at: DateTime<Utc>) -> Self {
        Self {
            message: "Usage simulated successfully".to_string(),
            updates,
            timestamp: at.to_rfc3339(),
        }
    }
}

/// Response of `POST /api/customer/{id}/reset-consumption`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConsumptionResponse {
    pub message: String,
    pub timestamp: String,
}

impl ResetConsumptionResponse {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            message: "Consumption reset successfully".to_string(),
            timestamp: at.to_rfc3339(),
        }
    }
}

/// One counter in the realtime view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionSummary {
    pub used: f64,
    pub total: f64,
    pub unit: String,
    pub percentage: f64,
    /// ISO date, empty when unknown
    pub reset_date: String,
}

impl ConsumptionSummary {
    /// Placeholder for a type the customer has no record of
    pub fn empty(kind: ConsumptionType) -> Self {
        Self {
            used: 0.0,
            total: 0.0,
            unit: kind.default_unit().to_string(),
            percentage: 0.0,
            reset_date: String::new(),
        }
    }
}

impl From<&Consumption> for ConsumptionSummary {
    fn from(record: &Consumption) -> Self {
        Self {
            used: to_f64(record.used),
            total: to_f64(record.total),
            unit: record.unit.clone(),
            percentage: to_f64_or_zero(record.percentage),
            reset_date: date_or_empty(record.reset_date),
        }
    }
}

/// All three counters, present even when the customer lacks a record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsumptionBreakdown {
    pub data: ConsumptionSummary,
    pub minutes: ConsumptionSummary,
    pub sms: ConsumptionSummary,
}

/// Latest payment in the realtime view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastPayment {
    pub amount: f64,
    pub date: String,
    pub method: Option<String>,
}

impl From<BillingPayment> for LastPayment {
    fn from(payment: BillingPayment) -> Self {
        Self {
            amount: to_f64(payment.amount),
            date: date_or_empty(payment.payment_date),
            method: payment.method,
        }
    }
}

/// Billing block of the realtime view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingSummary {
    pub current_balance: f64,
    pub currency: String,
    pub next_bill_date: String,
    pub monthly_fee: f64,
    pub last_payment: Option<LastPayment>,
}

impl BillingSummary {
    fn new(billing: Option<&Billing>, last_payment: Option<BillingPayment>) -> Self {
        let last_payment = last_payment.map(LastPayment::from);
        match billing {
            Some(billing) => Self {
                current_balance: to_f64_or_zero(billing.current_balance),
                currency: billing.currency_or_default().to_string(),
                next_bill_date: date_or_empty(billing.next_bill_date),
                monthly_fee: to_f64_or_zero(billing.monthly_fee),
                last_payment,
            },
            None => Self {
                current_balance: 0.0,
                currency: DEFAULT_CURRENCY.to_string(),
                next_bill_date: String::new(),
                monthly_fee: 0.0,
                last_payment,
            },
        }
    }
}

/// Response of `GET /api/customer/{id}/realtime`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeResponse {
    pub timestamp: String,
    pub customer: CustomerResponse,
    pub consumption: ConsumptionBreakdown,
    pub billing: BillingSummary,
    pub services: Vec<ServiceResponse>,
}

impl From<RealtimeSnapshot> for RealtimeResponse {
    fn from(snapshot: RealtimeSnapshot) -> Self {
        let summary = |kind: ConsumptionType| {
            snapshot
                .consumption(kind)
                .map(ConsumptionSummary::from)
                .unwrap_or_else(|| ConsumptionSummary::empty(kind))
        };

        let consumption = ConsumptionBreakdown {
            data: summary(ConsumptionType::Data),
            minutes: summary(ConsumptionType::Minutes),
            sms: summary(ConsumptionType::Sms),
        };
        let billing = BillingSummary::new(snapshot.billing.as_ref(), snapshot.last_payment);

        Self {
            timestamp: snapshot.taken_at.to_rfc3339(),
            customer: snapshot.customer.into(),
            consumption,
            billing,
            services: snapshot.services.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response of `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    /// Active storage backend ("postgres" or "memory")
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use telcox_core::models::Customer;

    fn snapshot() -> RealtimeSnapshot {
        RealtimeSnapshot {
            taken_at: Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
            customer: Customer {
                id: "CUST001".to_string(),
                name: "Ana".to_string(),
                ..Default::default()
            },
            consumptions: vec![Consumption {
                customer_id: "CUST001".to_string(),
                kind: ConsumptionType::Minutes,
                used: dec!(150),
                total: dec!(500),
                unit: "min".to_string(),
                percentage: Some(dec!(30.0)),
                reset_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                ..Default::default()
            }],
            billing: None,
            last_payment: None,
            services: Vec::new(),
        }
    }

    #[test]
    fn test_missing_types_get_defaults() {
        let response = RealtimeResponse::from(snapshot());

        assert_eq!(response.consumption.data, ConsumptionSummary::empty(ConsumptionType::Data));
        assert_eq!(response.consumption.sms.unit, "SMS");
        assert_eq!(response.consumption.minutes.used, 150.0);
        assert_eq!(response.consumption.minutes.percentage, 30.0);
        assert_eq!(response.consumption.minutes.reset_date, "2024-02-01");
    }

    #[test]
    fn test_missing_billing_defaults_to_eur() {
        let response = RealtimeResponse::from(snapshot());

        assert_eq!(response.billing.currency, "EUR");
        assert_eq!(response.billing.current_balance, 0.0);
        assert_eq!(response.billing.next_bill_date, "");
        assert!(response.billing.last_payment.is_none());
        assert_eq!(response.timestamp, "2024-01-15T10:00:00+00:00");
    }

    #[test]
    fn test_simulate_response_message() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let response = SimulateUsageResponse::new(vec!["SMS: +2".to_string()], at);
        assert_eq!(response.message, "Usage simulated successfully");
        assert!(DateTime::parse_from_rfc3339(&response.timestamp).is_ok());
    }
}
