//! Listings (departments)

use std::collections::HashSet;

use shared::EntityId;
use shared::models::{Department, DepartmentCreate, DepartmentUpdate};
use shared::permissions::Capability;

use super::{Gateway, find_created};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiRequest;
use crate::payload;

const LIST_KEYS: &[&str] = &["departments", "items", "results"];
const ENTITY_KEYS: &[&str] = &["department"];

impl Gateway {
    /// Cached listings
    pub async fn departments(&self) -> Vec<Department> {
        self.inner.caches.departments.snapshot().await
    }

    /// Cached listing by id (numeric and string ids compare equal)
    pub async fn department(&self, id: impl Into<EntityId>) -> Option<Department> {
        let id = id.into();
        self.inner.caches.departments.get(id.as_str()).await
    }

    /// Fetch all listings, replacing the cache
    pub async fn fetch_departments(&self) -> ClientResult<Vec<Department>> {
        let body = self
            .send("fetch_departments", ApiRequest::get("departments"))
            .await?;
        let departments: Vec<Department> = payload::list_of(body, LIST_KEYS, "departments")?;
        // Wholesale replace drops local-only listings with the rest
        let mut local = self.inner.local_departments.lock().await;
        local.clear();
        self.inner
            .caches
            .departments
            .replace(departments.clone())
            .await;
        drop(local);
        tracing::debug!(count = departments.len(), "Departments fetched");
        Ok(departments)
    }

    /// Fetch one listing and merge it into the cache
    pub async fn fetch_department(&self, id: impl Into<EntityId>) -> ClientResult<Department> {
        let id = id.into();
        let body = self
            .send("fetch_department", ApiRequest::get(format!("departments/{}", id)))
            .await?;
        let department: Department = payload::entity_of(body, ENTITY_KEYS).ok_or_else(|| {
            ClientError::InvalidResponse(format!("department {} missing from response", id))
        })?;
        self.store_server_department(department.clone()).await;
        Ok(department)
    }

    /// Create a listing
    ///
    /// Without a session the record is kept locally under the next local
    /// id and no request is made.
    pub async fn create_department(
        &self,
        mut create: DepartmentCreate,
    ) -> ClientResult<Department> {
        create.clean();
        create.validate()?;

        if self.inner.session.token().is_none() {
            let cache = &self.inner.caches.departments;
            let id = self.next_local_id(cache).await;
            let department = create.into_department(id);
            let mut local = self.inner.local_departments.lock().await;
            local.insert(department.id.clone());
            cache.push(department.clone()).await;
            drop(local);
            tracing::info!(id = %department.id, "Department created locally");
            return Ok(department);
        }

        self.guard(Capability::CreateDepartment)?;
        let known: HashSet<EntityId> = self
            .departments()
            .await
            .into_iter()
            .map(|department| department.id)
            .collect();
        let request = ApiRequest::post("departments").json(&create)?;
        let body = self.send("create_department", request).await?;

        let department = match payload::entity_of::<Department>(body, ENTITY_KEYS) {
            Some(department) => {
                self.store_server_department(department.clone()).await;
                department
            }
            None => self.resolve_created_department(&known, create).await,
        };
        tracing::info!(id = %department.id, "Department created");
        Ok(department)
    }

    /// Created on the server but not echoed: re-read the listings
    ///
    /// When the new record cannot be identified the submitted fields are
    /// returned under an empty id and nothing is cached.
    async fn resolve_created_department(
        &self,
        known: &HashSet<EntityId>,
        create: DepartmentCreate,
    ) -> Department {
        match self.fetch_departments().await {
            Ok(departments) => {
                if let Some(department) =
                    find_created(known, departments, |d| d.name == create.name)
                {
                    return department;
                }
                tracing::warn!("Created department not found in listings");
            }
            Err(e) => tracing::warn!(error = %e, "Re-fetch after create failed"),
        }
        create.into_department(EntityId::default())
    }

    /// Merge a server record, moving a local-only listing off its id first
    async fn store_server_department(&self, department: Department) {
        let cache = &self.inner.caches.departments;
        let mut local = self.inner.local_departments.lock().await;
        if local.remove(&department.id) {
            let moved = self.next_local_id(cache).await;
            cache
                .update(department.id.as_str(), |listing| listing.id = moved.clone())
                .await;
            tracing::info!(from = %department.id, to = %moved, "Local listing re-keyed");
            local.insert(moved);
        }
        cache.upsert(department).await;
    }

    /// Update a listing; the cache is merged by id on success
    pub async fn update_department(
        &self,
        id: impl Into<EntityId>,
        mut update: DepartmentUpdate,
    ) -> ClientResult<Department> {
        let id = id.into();
        self.guard(Capability::EditDepartment)?;
        update.clean();
        update.validate()?;

        let request = ApiRequest::put(format!("departments/{}", id)).json(&update)?;
        let body = self.send("update_department", request).await?;

        let cache = &self.inner.caches.departments;
        if let Some(department) = payload::entity_of::<Department>(body, ENTITY_KEYS) {
            self.store_server_department(department.clone()).await;
            return Ok(department);
        }
        if cache.update(id.as_str(), |department| department.apply(&update)).await {
            return cache.get(id.as_str()).await.ok_or_else(|| {
                ClientError::InvalidResponse(format!("department {} vanished from cache", id))
            });
        }
        // Not cached and not echoed back: ask for the authoritative record
        self.fetch_department(id).await
    }

    /// Delete a listing; filtered out of the cache on success
    pub async fn delete_department(&self, id: impl Into<EntityId>) -> ClientResult<()> {
        let id = id.into();
        self.guard(Capability::DeleteDepartment)?;
        self.send(
            "delete_department",
            ApiRequest::delete(format!("departments/{}", id)),
        )
        .await?;
        self.inner.caches.departments.remove(id.as_str()).await;
        self.inner.local_departments.lock().await.remove(&id);
        tracing::info!(id = %id, "Department deleted");
        Ok(())
    }
}
