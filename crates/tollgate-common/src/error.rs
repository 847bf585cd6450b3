//! Error types for Tollgate metering
//!
//! Provides a unified error type covering local validation, backend
//! rejections, and construction-time misconfiguration.

use thiserror::Error;

/// Result type alias using MeterError
pub type Result<T> = std::result::Result<T, MeterError>;

/// Unified error type for Tollgate operations
#[derive(Debug, Error)]
pub enum MeterError {
    // Malformed event or missing field, detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    // Backend rejected a structurally valid submission
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Missing or invalid api key / event name
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Upstream client-specific failure
    #[error("Provider error: {0}")]
    Provider(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Batch scheduler was cleaned up
    #[error("Batch scheduler has been retired")]
    SchedulerRetired,

    // Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeterError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            MeterError::Validation(_) => "VALIDATION_ERROR",
            MeterError::Api { .. } => "API_ERROR",
            MeterError::Configuration(_) => "CONFIGURATION_ERROR",
            MeterError::Provider(_) => "PROVIDER_ERROR",
            MeterError::Serialization(_) => "SERIALIZATION_ERROR",
            MeterError::SchedulerRetired => "SCHEDULER_RETIRED",
            MeterError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP-like status associated with this error
    pub fn status_code(&self) -> u16 {
        match self {
            MeterError::Validation(_) => 400,
            MeterError::Api { status, .. } => *status,
            MeterError::SchedulerRetired => 409,
            _ => 500,
        }
    }

    /// Shorthand for an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        MeterError::Api {
            status,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MeterError {
    fn from(err: serde_json::Error) -> Self {
        MeterError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for MeterError {
    fn from(err: anyhow::Error) -> Self {
        MeterError::Internal(err.to_string())
    }
}
