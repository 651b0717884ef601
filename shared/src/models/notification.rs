//! Notification Model

use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// Notification severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    /// Unknown kinds deserialize as `Info`
    #[default]
    #[serde(other)]
    Info,
}

/// Notification entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(alias = "_id")]
    pub id: EntityId,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, alias = "isRead", alias = "is_read")]
    pub read: bool,
    #[serde(default, alias = "createdAt", alias = "created_at")]
    pub timestamp: String,
    #[serde(default, alias = "departmentId", skip_serializing_if = "Option::is_none")]
    pub department_id: Option<EntityId>,
}

/// Unread counter response (`{"count": n}` or `{"unreadCount": n}`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCount {
    #[serde(alias = "unreadCount", alias = "unread_count")]
    pub count: u32,
}

/// Count unread entries in a collection
pub fn count_unread(notifications: &[Notification]) -> u32 {
    notifications.iter().filter(|n| !n.read).count() as u32
}
