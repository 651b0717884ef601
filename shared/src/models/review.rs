//! Review Model

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::types::EntityId;

/// Review entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(alias = "_id")]
    pub id: EntityId,
    /// Empty when the backend omits it on nested review lists
    #[serde(default, alias = "department_id", alias = "deptId")]
    pub department_id: EntityId,
    #[serde(default, alias = "user_name")]
    pub user_name: Option<String>,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default, alias = "created_at")]
    pub created_at: String,
}

/// Create review payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewCreate {
    pub rating: u8,
    pub comment: String,
}

impl ReviewCreate {
    pub fn validate(&self) -> ValidationResult {
        if !(1..=5).contains(&self.rating) {
            return Err(ValidationError::new("rating", "must be between 1 and 5"));
        }
        if self.comment.trim().is_empty() {
            return Err(ValidationError::new("comment", "must not be empty"));
        }
        Ok(())
    }
}
