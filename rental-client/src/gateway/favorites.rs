//! Favorites
//!
//! Membership lives in two places: the in-memory cache and the durable
//! snapshot under [`FAVORITES_KEY`]. Every successful mutation writes both;
//! a failed server read falls back to the durable copy.

use serde::Deserialize;
use serde_json::{Value, json};
use shared::EntityId;

use super::Gateway;
use crate::error::ClientResult;
use crate::http::ApiRequest;
use crate::payload;
use crate::storage::FAVORITES_KEY;

const LIST_KEYS: &[&str] = &["favorites", "items", "results"];
const ID_KEYS: &[&str] = &["departmentId", "department_id", "deptId", "dept_id"];

/// Listing id referenced by one favorites entry
///
/// Entries may be bare ids, `{departmentId}` rows, or embedded listings.
pub fn favorite_id(entry: &Value) -> Option<EntityId> {
    let id = match entry {
        Value::String(_) | Value::Number(_) => EntityId::deserialize(entry).ok()?,
        Value::Object(map) => {
            if let Some(id) = ID_KEYS.iter().find_map(|key| map.get(*key)).and_then(favorite_id) {
                id
            } else if let Some(department) = map.get("department") {
                favorite_id(department)?
            } else {
                map.get("id").or_else(|| map.get("_id")).and_then(favorite_id)?
            }
        }
        _ => return None,
    };
    (!id.is_empty()).then_some(id)
}

impl Gateway {
    /// Cached favorite listing ids
    pub async fn favorites(&self) -> Vec<EntityId> {
        self.inner.caches.favorites.snapshot().await
    }

    pub async fn is_favorite(&self, department_id: impl Into<EntityId>) -> bool {
        let id = department_id.into();
        self.inner.caches.favorites.contains(id.as_str()).await
    }

    /// Cold start: load the durable snapshot into the cache
    pub async fn load_favorites(&self) -> Vec<EntityId> {
        let ids = self.read_durable_favorites().await;
        self.inner.caches.favorites.replace(ids.clone()).await;
        tracing::debug!(count = ids.len(), "Favorites loaded from storage");
        ids
    }

    /// Fetch favorites from the server
    ///
    /// On failure the durable snapshot is served instead.
    pub async fn fetch_favorites(&self) -> ClientResult<Vec<EntityId>> {
        self.require_token()?;
        let fetched = match self
            .send("fetch_favorites", ApiRequest::get("favorites"))
            .await
        {
            Ok(body) => payload::extract_list(body, LIST_KEYS),
            Err(e) => {
                tracing::warn!(error = %e, "Favorites fetch failed, using stored snapshot");
                None
            }
        };

        let Some(entries) = fetched else {
            return Ok(self.load_favorites().await);
        };

        let mut ids: Vec<EntityId> = Vec::with_capacity(entries.len());
        for id in entries.iter().filter_map(favorite_id) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        self.inner.caches.favorites.replace(ids.clone()).await;
        self.persist_favorites(&ids).await;
        Ok(ids)
    }

    /// Flip membership of a listing; returns the new membership
    ///
    /// Local state changes only after the server accepted the call.
    pub async fn toggle_favorite(&self, department_id: impl Into<EntityId>) -> ClientResult<bool> {
        let id = department_id.into();
        self.require_token()?;

        let cache = &self.inner.caches.favorites;
        let is_member = cache.contains(id.as_str()).await;
        if is_member {
            self.send(
                "remove_favorite",
                ApiRequest::delete(format!("favorites/{}", id)),
            )
            .await?;
            cache.remove(id.as_str()).await;
        } else {
            let request = ApiRequest::post("favorites").json(&json!({ "departmentId": id }))?;
            self.send("add_favorite", request).await?;
            cache.upsert(id.clone()).await;
        }

        self.persist_favorites(&cache.snapshot().await).await;
        tracing::debug!(department_id = %id, favorite = !is_member, "Favorite toggled");
        Ok(!is_member)
    }

    async fn read_durable_favorites(&self) -> Vec<EntityId> {
        match self.inner.storage.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<EntityId>>(&raw) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored favorites are corrupt, ignoring");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored favorites");
                Vec::new()
            }
        }
    }

    async fn persist_favorites(&self, ids: &[EntityId]) {
        let result = match serde_json::to_string(ids) {
            Ok(raw) => self.inner.storage.set(FAVORITES_KEY, raw).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist favorites");
        }
    }
}
