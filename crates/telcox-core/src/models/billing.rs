//! Billing models
//!
//! A billing account per customer and the payments made against it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default currency shown when a billing row leaves it empty
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Billing entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Billing {
    pub id: i32,
    pub customer_id: String,
    pub current_balance: Option<Decimal>,
    /// Currency code (ISO 4217)
    pub currency: Option<String>,
    pub next_bill_date: Option<NaiveDate>,
    pub monthly_fee: Option<Decimal>,
}

impl Billing {
    /// Currency with the display default applied
    pub fn currency_or_default(&self) -> &str {
        self.currency
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }
}

/// Payment made against a billing account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BillingPayment {
    pub id: i32,
    pub billing_id: i32,
    pub amount: Decimal,
    pub payment_date: Option<NaiveDate>,
    /// Payment method, e.g. "card" or "transfer"
    pub method: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_default() {
        let billing = Billing::default();
        assert_eq!(billing.currency_or_default(), "EUR");

        let billing = Billing {
            currency: Some("USD".to_string()),
            ..Default::default()
        };
        assert_eq!(billing.currency_or_default(), "USD");
    }
}
