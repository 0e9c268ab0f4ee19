//! Service catalogue and assignment DTOs

use super::common::parse_status;
use serde::{Deserialize, Serialize};
use telcox_core::{
    models::{CustomerService, Service, Status},
    AppResult,
};
use validator::Validate;

/// Service creation request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceCreateRequest {
    #[validate(length(min = 1, max = 50, message = "Service id is required"))]
    pub id: String,

    #[validate(length(min = 1, max = 100, message = "Service name is required"))]
    pub name: String,

    pub description: Option<String>,

    pub status: Option<String>,
}

impl ServiceCreateRequest {
    /// Convert to Service entity
    pub fn to_service(&self) -> AppResult<Service> {
        let status = match &self.status {
            Some(status) => parse_status(status)?,
            None => Status::Active,
        };

        Ok(Service {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            status,
        })
    }
}

/// Service update request, absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ServiceUpdateRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub status: Option<String>,
}

impl ServiceUpdateRequest {
    pub fn apply_to(&self, service: &mut Service) -> AppResult<()> {
        if let Some(name) = &self.name {
            service.name = name.clone();
        }
        if self.description.is_some() {
            service.description = self.description.clone();
        }
        if let Some(status) = &self.status {
            service.status = parse_status(status)?;
        }
        Ok(())
    }
}

/// Service response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
}

impl From<Service> for ServiceResponse {
    fn from(service: Service) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            status: service.status.to_string(),
        }
    }
}

/// Assignment of a service to a customer, used for both request and response
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct CustomerServiceDto {
    #[validate(length(min = 1, max = 50, message = "Customer id is required"))]
    pub customer_id: String,

    #[validate(length(min = 1, max = 50, message = "Service id is required"))]
    pub service_id: String,
}

impl From<CustomerService> for CustomerServiceDto {
    fn from(assignment: CustomerService) -> Self {
        Self {
            customer_id: assignment.customer_id,
            service_id: assignment.service_id,
        }
    }
}

impl From<&CustomerServiceDto> for CustomerService {
    fn from(dto: &CustomerServiceDto) -> Self {
        Self {
            customer_id: dto.customer_id.clone(),
            service_id: dto.service_id.clone(),
        }
    }
}
