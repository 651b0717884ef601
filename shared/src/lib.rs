//! Shared types for the rental client
//!
//! Wire models, identifier normalization, roles and the capability matrix,
//! and the unified error codes. Nothing here performs I/O.

pub mod client;
pub mod error;
pub mod models;
pub mod permissions;
pub mod types;

// Re-exports
pub use client::{AuthResponse, Identity, LoginRequest, ProfileUpdate, RegisterRequest};
pub use error::{ErrorCode, ValidationError};
pub use permissions::{Capability, PermissionMatrix, can};
pub use types::EntityId;
