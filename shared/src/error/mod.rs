//! Unified error system
//!
//! - [`ErrorCode`]: standardized numeric codes shared with UI consumers
//! - [`ValidationError`]: local input rejection, raised before any network call

mod codes;

pub use codes::{ErrorCode, InvalidErrorCode};

use thiserror::Error;

/// Field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Result of validating an input payload
pub type ValidationResult = Result<(), ValidationError>;
