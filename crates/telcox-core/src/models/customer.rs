//! Customer model
//!
//! Represents subscribers of the telecom operator. Only active customers take
//! part in the periodic usage simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by customers and services
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => write!(f, "active"),
            Status::Inactive => write!(f, "inactive"),
        }
    }
}

impl Status {
    /// Parse from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Status::Active),
            "inactive" => Some(Status::Inactive),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Status::Active)
    }
}

/// Customer entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// External customer identifier (e.g. "CUST001")
    pub id: String,

    /// Display name
    pub name: String,

    pub email: Option<String>,

    pub phone: Option<String>,

    /// Commercial plan name
    pub plan: Option<String>,

    pub status: Status,
}

impl Customer {
    /// Check if customer takes part in auto-update passes
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl Default for Customer {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            email: None,
            phone: None,
            plan: None,
            status: Status::Active,
        }
    }
}
