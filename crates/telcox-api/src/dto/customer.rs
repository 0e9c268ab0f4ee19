//! Customer DTOs

use super::common::parse_status;
use serde::{Deserialize, Serialize};
use telcox_core::{
    models::{Customer, Status},
    AppResult,
};
use validator::Validate;

/// Customer creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerCreateRequest {
    /// External identifier, e.g. "CUST001"
    #[validate(length(min = 1, max = 50, message = "Customer id is required"))]
    pub id: String,

    #[validate(length(min = 1, max = 100, message = "Customer name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(max = 50))]
    pub plan: Option<String>,

    /// "active" (default) or "inactive"
    pub status: Option<String>,
}

impl CustomerCreateRequest {
    /// Convert to Customer entity
    pub fn to_customer(&self) -> AppResult<Customer> {
        let status = match &self.status {
            Some(status) => parse_status(status)?,
            None => Status::Active,
        };

        Ok(Customer {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            plan: self.plan.clone(),
            status,
        })
    }
}

/// Customer update request, absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CustomerUpdateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(max = 50))]
    pub plan: Option<String>,

    pub status: Option<String>,
}

impl CustomerUpdateRequest {
    pub fn apply_to(&self, customer: &mut Customer) -> AppResult<()> {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            customer.phone = Some(phone.clone());
        }
        if let Some(plan) = &self.plan {
            customer.plan = Some(plan.clone());
        }
        if let Some(status) = &self.status {
            customer.status = parse_status(status)?;
        }
        Ok(())
    }
}

/// Customer response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub plan: Option<String>,
    pub status: String,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            phone: customer.phone,
            plan: customer.plan,
            status: customer.status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_validation() {
        let req = CustomerCreateRequest {
            id: "CUST001".to_string(),
            name: "Ana Garcia".to_string(),
            email: Some("ana@telcox.es".to_string()),
            phone: None,
            plan: Some("Premium 50GB".to_string()),
            status: None,
        };
        assert!(req.validate().is_ok());
        assert_eq!(req.to_customer().unwrap().status, Status::Active);

        let req = CustomerCreateRequest {
            name: String::new(),
            email: Some("not-an-email".to_string()),
            ..req
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_partial_update() {
        let mut customer = Customer {
            id: "CUST001".to_string(),
            name: "Ana".to_string(),
            plan: Some("Basic".to_string()),
            ..Default::default()
        };

        let req = CustomerUpdateRequest {
            status: Some("inactive".to_string()),
            ..Default::default()
        };
        req.apply_to(&mut customer).unwrap();

        assert_eq!(customer.name, "Ana");
        assert_eq!(customer.plan.as_deref(), Some("Basic"));
        assert_eq!(customer.status, Status::Inactive);
    }
}
