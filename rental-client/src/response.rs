//! Outcome wrapper
//!
//! Uniform discriminated result handed to UI consumers: every operation can
//! be rendered as `{success, message, code, data?, details?}` without the
//! caller matching on [`ClientError`].

use serde::Serialize;
use serde_json::Value;

// Re-export for convenience
pub use shared::error::ErrorCode;

use crate::error::{ClientError, ClientResult};

/// Discriminated operation result
#[derive(Debug, Clone, Serialize)]
pub struct Outcome<T: Serialize> {
    pub success: bool,
    /// Human-readable message ("success" on success)
    pub message: String,
    /// Error code (0 = success)
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Server-provided error list, when any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<T: Serialize> Outcome<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: "success".to_string(),
            code: ErrorCode::Success.code(),
            data: Some(data),
            details: None,
        }
    }

    pub fn error_with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: code.code(),
            data: None,
            details: None,
        }
    }

    /// Build from a client error, keeping the server's message and details
    ///
    /// A blank message falls back to the code's default text.
    pub fn from_error(err: ClientError) -> Self {
        let code = err.code();
        let (message, details) = match err {
            ClientError::Api {
                message, details, ..
            } => (message, details),
            other => (other.to_string(), None),
        };
        let message = if message.trim().is_empty() {
            code.message().to_string()
        } else {
            message
        };
        Self {
            success: false,
            message,
            code: code.code(),
            data: None,
            details,
        }
    }

    pub fn into_result(self) -> Result<Option<T>, String> {
        if self.success {
            Ok(self.data)
        } else {
            Err(self.message)
        }
    }
}

impl<T: Serialize> From<ClientResult<T>> for Outcome<T> {
    fn from(result: ClientResult<T>) -> Self {
        match result {
            Ok(data) => Outcome::success(data),
            Err(err) => Outcome::from_error(err),
        }
    }
}
