//! Error types for provisioning requests.

use std::fmt;

/// A provisioning request is incomplete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A required field is empty.
    EmptyField { field: &'static str },
    /// The department tag contains the tag separator.
    InvalidDepartment { department: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField { field } => write!(f, "{field} must not be empty"),
            Self::InvalidDepartment { department } => {
                write!(f, "department '{department}' must not contain ','")
            }
        }
    }
}

impl std::error::Error for RequestError {}
