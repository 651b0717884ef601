//! Notifications and the unread counter
//!
//! The counter is cached separately from the collection and may lag it
//! until the next counter poll.

use serde_json::Value;
use shared::EntityId;
use shared::models::{Notification, UnreadCount, count_unread};
use tokio::sync::watch;

use super::Gateway;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiRequest;
use crate::payload;

const LIST_KEYS: &[&str] = &["notifications", "items", "results"];

fn parse_unread(body: Value) -> Option<u32> {
    match payload::unwrap_data(body) {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        other => serde_json::from_value::<UnreadCount>(other)
            .ok()
            .map(|unread| unread.count),
    }
}

impl Gateway {
    pub async fn notifications(&self) -> Vec<Notification> {
        self.inner.caches.notifications.snapshot().await
    }

    /// Cached unread counter
    pub fn unread_count(&self) -> u32 {
        *self.inner.unread.borrow()
    }

    pub fn subscribe_unread(&self) -> watch::Receiver<u32> {
        self.inner.unread.subscribe()
    }

    /// Fetch notifications, replacing the cache and the counter
    pub async fn fetch_notifications(&self) -> ClientResult<Vec<Notification>> {
        self.require_token()?;
        let body = self
            .send("fetch_notifications", ApiRequest::get("notifications"))
            .await?;
        let notifications: Vec<Notification> =
            payload::list_of(body, LIST_KEYS, "notifications")?;
        self.inner
            .caches
            .notifications
            .replace(notifications.clone())
            .await;
        self.inner.unread.send_replace(count_unread(&notifications));
        Ok(notifications)
    }

    /// Fetch the unread counter; returns `(previous, current)`
    pub async fn fetch_unread_count(&self) -> ClientResult<(u32, u32)> {
        self.read_unread_count(false).await
    }

    pub(crate) async fn read_unread_count(&self, quiet: bool) -> ClientResult<(u32, u32)> {
        let token = self.require_token()?;
        let request = ApiRequest::get("notifications/unread-count");
        let body = if quiet {
            self.send_quiet(request).await?
        } else {
            self.send("fetch_unread_count", request).await?
        };
        let count = parse_unread(body).ok_or_else(|| {
            ClientError::InvalidResponse("unread count missing from response".into())
        })?;
        if self.inner.session.token().as_deref() != Some(token.as_str()) {
            return Err(ClientError::NotAuthenticated);
        }
        let previous = self.inner.unread.send_replace(count);
        Ok((previous, count))
    }

    pub async fn mark_notification_read(&self, id: impl Into<EntityId>) -> ClientResult<()> {
        let id = id.into();
        self.require_token()?;
        self.send(
            "mark_notification_read",
            ApiRequest::put(format!("notifications/{}/read", id)),
        )
        .await?;

        let mut was_unread = false;
        self.inner
            .caches
            .notifications
            .update(id.as_str(), |notification| {
                was_unread = !notification.read;
                notification.read = true;
            })
            .await;
        if was_unread {
            self.decrement_unread();
        }
        Ok(())
    }

    pub async fn mark_all_notifications_read(&self) -> ClientResult<()> {
        self.require_token()?;
        self.send(
            "mark_all_notifications_read",
            ApiRequest::put("notifications/read-all"),
        )
        .await?;
        self.inner
            .caches
            .notifications
            .update_all(|notification| notification.read = true)
            .await;
        self.inner.unread.send_replace(0);
        Ok(())
    }

    pub async fn delete_notification(&self, id: impl Into<EntityId>) -> ClientResult<()> {
        let id = id.into();
        self.require_token()?;
        self.send(
            "delete_notification",
            ApiRequest::delete(format!("notifications/{}", id)),
        )
        .await?;
        let removed = self.inner.caches.notifications.remove(id.as_str()).await;
        if removed.is_some_and(|notification| !notification.read) {
            self.decrement_unread();
        }
        Ok(())
    }

    fn decrement_unread(&self) {
        self.inner.unread.send_modify(|count| *count = count.saturating_sub(1));
    }
}
