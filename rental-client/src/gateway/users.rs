//! User management (manageUsers)

use shared::models::{Role, RoleUpdate};
use shared::permissions::Capability;
use shared::{EntityId, Identity};

use super::Gateway;
use crate::error::{ClientError, ClientResult};
use crate::http::ApiRequest;
use crate::payload;

const LIST_KEYS: &[&str] = &["users", "items", "results"];
const ENTITY_KEYS: &[&str] = &["user"];

impl Gateway {
    pub async fn users(&self) -> Vec<Identity> {
        self.inner.caches.users.snapshot().await
    }

    pub async fn fetch_users(&self) -> ClientResult<Vec<Identity>> {
        self.guard(Capability::ManageUsers)?;
        let body = self.send("fetch_users", ApiRequest::get("users")).await?;
        let users: Vec<Identity> = payload::list_of(body, LIST_KEYS, "users")?;
        self.inner.caches.users.replace(users.clone()).await;
        Ok(users)
    }

    pub async fn update_user_role(
        &self,
        id: impl Into<EntityId>,
        role: Role,
    ) -> ClientResult<Identity> {
        let id = id.into();
        self.guard(Capability::ManageUsers)?;

        let request = ApiRequest::put(format!("users/{}/role", id)).json(&RoleUpdate { role })?;
        let body = self.send("update_user_role", request).await?;

        let cache = &self.inner.caches.users;
        let user = match payload::entity_of::<Identity>(body, ENTITY_KEYS) {
            Some(user) => {
                cache.upsert(user.clone()).await;
                user
            }
            None => {
                cache
                    .update(id.as_str(), |user| user.role = role.as_str().to_string())
                    .await;
                cache.get(id.as_str()).await.ok_or_else(|| {
                    ClientError::InvalidResponse(format!("user {} not in cache or response", id))
                })?
            }
        };
        crate::security_log!(INFO, "role_changed", target_user = %id, role = %role);
        Ok(user)
    }

    pub async fn delete_user(&self, id: impl Into<EntityId>) -> ClientResult<()> {
        let id = id.into();
        self.guard(Capability::ManageUsers)?;
        self.send("delete_user", ApiRequest::delete(format!("users/{}", id)))
            .await?;
        self.inner.caches.users.remove(id.as_str()).await;
        crate::security_log!(INFO, "user_deleted", target_user = %id);
        Ok(())
    }
}
