use thiserror::Error;

use crate::validators::ValidationError;

/// Errors surfaced by an entity store
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Entity store error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{0}")]
    Validation(#[from] ValidationError),
}

impl StoreError {
    /// Stable machine-readable code for logs and notices
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => error_codes::DEVICE_NOT_FOUND,
            StoreError::Backend(_) => error_codes::STORE_ERROR,
            StoreError::Serialization(_) => error_codes::SERIALIZATION_ERROR,
            StoreError::Validation(err) => err.code,
        }
    }

    /// Short reason suitable for a user-facing notice
    pub fn reason(&self) -> String {
        match self {
            StoreError::NotFound(_) => "device no longer exists".to_string(),
            StoreError::Backend(msg) => msg.clone(),
            StoreError::Serialization(_) => "unexpected response from server".to_string(),
            StoreError::Validation(err) => err.message.clone(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Common error codes used across the crate
pub mod error_codes {
    // Validation errors
    pub const MISSING_FIELD: &str = "MISSING_FIELD";
    pub const INVALID_VALUE: &str = "INVALID_VALUE";

    // Not found errors
    pub const DEVICE_NOT_FOUND: &str = "DEVICE_NOT_FOUND";

    // Store errors
    pub const STORE_ERROR: &str = "STORE_ERROR";
    pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";

    // View errors
    pub const SUBMIT_IN_FLIGHT: &str = "SUBMIT_IN_FLIGHT";
    pub const VIEW_CLOSED: &str = "VIEW_CLOSED";

    // Session errors
    pub const SESSION_ERROR: &str = "SESSION_ERROR";
}
