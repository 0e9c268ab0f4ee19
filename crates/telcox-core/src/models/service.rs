//! Value-added services and their assignment to customers

use super::customer::Status;
use serde::{Deserialize, Serialize};

/// Service catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub status: Status,
}

/// Assignment of a service to a customer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerService {
    pub customer_id: String,
    pub service_id: String,
}
