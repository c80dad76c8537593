use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ProfileField;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{field} is missing or not a number")]
    MissingField { field: ProfileField },
    #[error("{field} must be {}", describe_range(.min, .max))]
    OutOfRange {
        field: ProfileField,
        value: f64,
        min: f64,
        max: Option<f64>,
    },
}

impl ValidationError {
    pub fn field(&self) -> ProfileField {
        match self {
            Self::MissingField { field } | Self::OutOfRange { field, .. } => *field,
        }
    }
}

fn describe_range(min: &f64, max: &Option<f64>) -> String {
    match max {
        Some(max) => format!("between {min} and {max}"),
        None => format!("at least {min}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "snake_case")]
pub enum ErrorKind {
    Validation(ValidationError),
    Network,
    Timeout,
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind:?}: {message}")]
pub struct RequestFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl RequestFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }
}

impl From<ValidationError> for RequestFailure {
    fn from(value: ValidationError) -> Self {
        let message = value.to_string();
        Self {
            kind: ErrorKind::Validation(value),
            message,
        }
    }
}
