//! Billing and payment DTOs

use super::common::to_f64;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use telcox_core::models::{Billing, BillingPayment};
use validator::Validate;

/// Billing account creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BillingCreateRequest {
    #[validate(length(min = 1, max = 50, message = "Customer id is required"))]
    pub customer_id: String,

    pub current_balance: Option<Decimal>,

    /// Currency code (ISO 4217)
    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,

    pub next_bill_date: Option<NaiveDate>,

    pub monthly_fee: Option<Decimal>,
}

impl BillingCreateRequest {
    /// Convert to Billing entity
    pub fn to_billing(&self) -> Billing {
        Billing {
            id: 0,
            customer_id: self.customer_id.clone(),
            current_balance: self.current_balance,
            currency: self.currency.clone(),
            next_bill_date: self.next_bill_date,
            monthly_fee: self.monthly_fee,
        }
    }
}

/// Billing account update request, absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct BillingUpdateRequest {
    #[validate(length(min = 1, max = 50))]
    pub customer_id: Option<String>,

    pub current_balance: Option<Decimal>,

    #[validate(length(equal = 3, message = "Currency must be a 3-letter code"))]
    pub currency: Option<String>,

    pub next_bill_date: Option<NaiveDate>,

    pub monthly_fee: Option<Decimal>,
}

impl BillingUpdateRequest {
    pub fn apply_to(&self, billing: &mut Billing) {
        if let Some(customer_id) = &self.customer_id {
            billing.customer_id = customer_id.clone();
        }
        if self.current_balance.is_some() {
            billing.current_balance = self.current_balance;
        }
        if self.currency.is_some() {
            billing.currency = self.currency.clone();
        }
        if self.next_bill_date.is_some() {
            billing.next_bill_date = self.next_bill_date;
        }
        if self.monthly_fee.is_some() {
            billing.monthly_fee = self.monthly_fee;
        }
    }
}

/// Billing account response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingResponse {
    pub id: i32,
    pub customer_id: String,
    pub current_balance: Option<f64>,
    pub currency: Option<String>,
    pub next_bill_date: Option<NaiveDate>,
    pub monthly_fee: Option<f64>,
}

impl From<Billing> for BillingResponse {
    fn from(billing: Billing) -> Self {
        Self {
            id: billing.id,
            customer_id: billing.customer_id,
            current_balance: billing.current_balance.map(to_f64),
            currency: billing.currency,
            next_bill_date: billing.next_bill_date,
            monthly_fee: billing.monthly_fee.map(to_f64),
        }
    }
}

/// Payment creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentCreateRequest {
    #[validate(range(min = 1, message = "Billing id is required"))]
    pub billing_id: i32,

    pub amount: Decimal,

    pub payment_date: Option<NaiveDate>,

    /// e.g. "card", "transfer", "direct_debit"
    #[validate(length(max = 50))]
    pub method: Option<String>,
}

impl PaymentCreateRequest {
    /// Convert to BillingPayment entity
    pub fn to_payment(&self) -> BillingPayment {
        BillingPayment {
            id: 0,
            billing_id: self.billing_id,
            amount: self.amount,
            payment_date: self.payment_date,
            method: self.method.clone(),
        }
    }
}

/// Payment update request, absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PaymentUpdateRequest {
    #[validate(range(min = 1))]
    pub billing_id: Option<i32>,

    pub amount: Option<Decimal>,

    pub payment_date: Option<NaiveDate>,

    #[validate(length(max = 50))]
    pub method: Option<String>,
}

impl PaymentUpdateRequest {
    pub fn apply_to(&self, payment: &mut BillingPayment) {
        if let Some(billing_id) = self.billing_id {
            payment.billing_id = billing_id;
        }
        if let Some(amount) = self.amount {
            payment.amount = amount;
        }
        if self.payment_date.is_some() {
            payment.payment_date = self.payment_date;
        }
        if self.method.is_some() {
            payment.method = self.method.clone();
        }
    }
}

/// Payment response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentResponse {
    pub id: i32,
    pub billing_id: i32,
    pub amount: f64,
    pub payment_date: Option<NaiveDate>,
    pub method: Option<String>,
}

impl From<BillingPayment> for PaymentResponse {
    fn from(payment: BillingPayment) -> Self {
        Self {
            id: payment.id,
            billing_id: payment.billing_id,
            amount: to_f64(payment.amount),
            payment_date: payment.payment_date,
            method: payment.method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_validation() {
        let req = BillingCreateRequest {
            customer_id: "CUST001".to_string(),
            current_balance: Some(dec!(45.50)),
            currency: Some("EURO".to_string()),
            next_bill_date: None,
            monthly_fee: Some(dec!(29.99)),
        };
        assert!(req.validate().is_err());

        let req = BillingCreateRequest {
            currency: Some("EUR".to_string()),
            ..req
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_partial_payment_update() {
        let mut payment = PaymentCreateRequest {
            billing_id: 1,
            amount: dec!(29.99),
            payment_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            method: Some("card".to_string()),
        }
        .to_payment();

        PaymentUpdateRequest {
            amount: Some(dec!(31.50)),
            ..Default::default()
        }
        .apply_to(&mut payment);

        assert_eq!(payment.amount, dec!(31.50));
        assert_eq!(payment.method.as_deref(), Some("card"));
        assert_eq!(payment.payment_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }
}
