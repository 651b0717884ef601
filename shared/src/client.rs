//! Auth-related types shared by the client core and its consumers
//!
//! Request/response DTOs for the authentication endpoints and the
//! identity record kept client-side after login.

use serde::{Deserialize, Serialize};

use crate::models::Role;
use crate::types::EntityId;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Login / register response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(alias = "accessToken", alias = "access_token")]
    pub token: String,
    pub user: Identity,
}

/// Authenticated user profile held client-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Raw role name as sent by the backend; see [`Identity::role_kind`]
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Identity {
    /// Parsed role, `None` when the backend sent an unknown name
    pub fn role_kind(&self) -> Option<Role> {
        Role::parse(&self.role)
    }

    /// Coarse check using the role order
    pub fn has_role_at_least(&self, minimum: Role) -> bool {
        self.role_kind().is_some_and(|role| role >= minimum)
    }
}

/// Own-profile update payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl ProfileUpdate {
    /// Apply the set fields onto an identity
    pub fn apply_to(&self, identity: &mut Identity) {
        if let Some(name) = &self.name {
            identity.name = name.clone();
        }
        if let Some(phone) = &self.phone {
            identity.phone = Some(phone.clone());
        }
        if let Some(gender) = &self.gender {
            identity.gender = Some(gender.clone());
        }
        if let Some(bio) = &self.bio {
            identity.bio = Some(bio.clone());
        }
    }
}
