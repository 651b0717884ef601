//! Mutation Gateway
//!
//! Wraps every backend call of the resource collections. The protocol is
//! the same for all of them:
//!
//! - fetch: replace the cached collection wholesale on success, leave it
//!   untouched on failure
//! - create / update / delete: call the backend first and patch the cache
//!   (append / merge by id / filter out) only on a 2xx reply
//! - protected operations check the capability before any request is built
//!
//! Concurrent writers resolve as last-response-wins; each cache exposes a
//! revision counter bumped on every write.

mod departments;
mod favorites;
mod notifications;
mod reports;
mod reservations;
mod reviews;
mod users;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;
use shared::models::{Department, Notification, Reservation, Review};
use shared::permissions::Capability;
use shared::{EntityId, Identity};
use tokio::sync::{Mutex, RwLock, watch};

use crate::cache::{Identified, ResourceCache};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiRequest;
use crate::session::SessionStore;
use crate::storage::KeyValueStore;

pub use favorites::favorite_id;

/// Cached server collections
#[derive(Debug, Default)]
pub struct Caches {
    pub departments: ResourceCache<Department>,
    pub reservations: ResourceCache<Reservation>,
    pub favorites: ResourceCache<EntityId>,
    pub notifications: ResourceCache<Notification>,
    pub users: ResourceCache<Identity>,
    /// Reviews keyed by department id
    pub reviews: RwLock<HashMap<EntityId, Vec<Review>>>,
}

struct GatewayInner {
    session: SessionStore,
    storage: Arc<dyn KeyValueStore>,
    caches: Caches,
    unread: watch::Sender<u32>,
    /// Last id handed to a local-only record
    local_ids: AtomicU64,
    /// Listings that exist only on this client
    local_departments: Mutex<HashSet<EntityId>>,
}

/// Mutation Gateway over the shared session
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("session", &self.inner.session)
            .field("unread", &*self.inner.unread.borrow())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(session: SessionStore, storage: Arc<dyn KeyValueStore>) -> Self {
        let (unread, _) = watch::channel(0);
        Self {
            inner: Arc::new(GatewayInner {
                session,
                storage,
                caches: Caches::default(),
                unread,
                local_ids: AtomicU64::new(0),
                local_departments: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    pub fn caches(&self) -> &Caches {
        &self.inner.caches
    }

    /// Reservations, notifications or accounts are cached
    pub async fn holds_user_data(&self) -> bool {
        let caches = &self.inner.caches;
        !caches.reservations.is_empty().await
            || caches.reservations.is_loaded().await
            || !caches.notifications.is_empty().await
            || !caches.users.is_empty().await
    }

    /// Empty user-scoped caches (logout)
    ///
    /// Listings are public and stay. The durable favorites snapshot stays
    /// for offline continuity; only the in-memory set is dropped.
    pub async fn clear_user_data(&self) {
        let caches = &self.inner.caches;
        caches.reservations.clear().await;
        caches.favorites.clear().await;
        caches.notifications.clear().await;
        caches.users.clear().await;
        self.inner.unread.send_replace(0);
        tracing::debug!("User-scoped caches cleared");
    }

    // ========== Shared plumbing ==========

    fn guard(&self, capability: Capability) -> ClientResult<()> {
        self.inner.session.require(capability)
    }

    fn require_token(&self) -> ClientResult<String> {
        self.inner.session.require_token()
    }

    /// Authenticated request; failures are logged under `operation`
    async fn send(&self, operation: &'static str, request: ApiRequest) -> ClientResult<Value> {
        self.inner
            .session
            .send(request)
            .await
            .inspect_err(|e| log_failure(operation, e))
    }

    /// Authenticated request without failure logging (background polls)
    async fn send_quiet(&self, request: ApiRequest) -> ClientResult<Value> {
        self.inner.session.send(request).await
    }

    /// Next local-only id not already present in `cache`
    async fn next_local_id<T: Identified + Clone>(
        &self,
        cache: &ResourceCache<T>,
    ) -> EntityId {
        loop {
            let n = self.inner.local_ids.fetch_add(1, Ordering::SeqCst) + 1;
            let id = EntityId::from(n);
            if !cache.contains(id.as_str()).await {
                return id;
            }
        }
    }
}

/// Record produced by a create whose reply did not echo it
///
/// Picks the first entry of a re-fetched collection whose id was not known
/// before the call, preferring one that matches the submitted payload.
fn find_created<T, F>(known: &HashSet<EntityId>, items: Vec<T>, matches: F) -> Option<T>
where
    T: Identified,
    F: Fn(&T) -> bool,
{
    let fresh: Vec<T> = items
        .into_iter()
        .filter(|item| !known.contains(item.id()))
        .collect();
    let index = fresh.iter().position(&matches).unwrap_or(0);
    fresh.into_iter().nth(index)
}

/// Log a failed backend operation; local rejections stay quiet
pub(crate) fn log_failure(operation: &'static str, err: &ClientError) {
    match err {
        ClientError::PermissionDenied(_)
        | ClientError::NotAuthenticated
        | ClientError::Validation(_) => {}
        ClientError::Api { status, .. } => {
            tracing::warn!(operation, status, error = %err, "Request rejected");
        }
        _ => tracing::warn!(operation, error = %err, "Request failed"),
    }
}
