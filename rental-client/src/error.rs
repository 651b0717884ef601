//! Client error types

use shared::error::{ErrorCode, ValidationError};
use shared::permissions::Capability;
use thiserror::Error;

/// Client error type
///
/// Local failures (`PermissionDenied`, `NotAuthenticated`, `Validation`) are
/// raised before any request leaves the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Capability check failed for the current identity
    #[error("Permission denied: {0}")]
    PermissionDenied(Capability),

    /// Operation needs a session
    #[error("Authentication required")]
    NotAuthenticated,

    /// Local input validation failed
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Could not reach the server
    #[error("Connection error: {0}")]
    Connection(String),

    /// Server answered 401
    #[error("{0}")]
    Unauthorized(String),

    /// Login or registration answered 401
    #[error("{0}")]
    InvalidCredentials(String),

    /// Server rejected the request (non-2xx)
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Response did not carry the expected data
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Durable storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Timeout or connection failure, i.e. worth retrying
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Timeout(_) | ClientError::Connection(_))
    }

    /// HTTP status of a server rejection
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Unauthorized(_) | ClientError::InvalidCredentials(_) => Some(401),
            _ => None,
        }
    }

    /// Map to the most specific ErrorCode
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::PermissionDenied(_) => ErrorCode::PermissionDenied,
            ClientError::NotAuthenticated => ErrorCode::NotAuthenticated,
            ClientError::Validation(_) => ErrorCode::ValidationFailed,
            ClientError::Timeout(_) => ErrorCode::TimeoutError,
            ClientError::Connection(_) => ErrorCode::NetworkError,
            ClientError::Unauthorized(_) => ErrorCode::SessionExpired,
            ClientError::InvalidCredentials(_) => ErrorCode::InvalidCredentials,
            ClientError::Api { status, .. } => match *status {
                400 | 422 => ErrorCode::ValidationFailed,
                403 => ErrorCode::PermissionDenied,
                404 => ErrorCode::NotFound,
                409 => ErrorCode::AlreadyExists,
                500..=599 => ErrorCode::InternalError,
                _ => ErrorCode::InvalidRequest,
            },
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                ErrorCode::InvalidResponse
            }
            ClientError::Storage(_) => ErrorCode::StorageError,
            ClientError::Config(_) => ErrorCode::ConfigError,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
