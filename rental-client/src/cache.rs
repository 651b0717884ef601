//! Remote Resource Cache
//!
//! In-memory mirror of one server collection. Fetches replace the whole
//! collection; mutations patch it by id. Every write bumps a revision so the
//! last-write-wins policy is observable.

use std::sync::Arc;

use shared::models::{Department, Notification, Reservation, Review};
use shared::{EntityId, Identity};
use tokio::sync::RwLock;

/// Entities addressable by string id
pub trait Identified {
    fn id(&self) -> &EntityId;
}

impl Identified for Department {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Reservation {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Notification {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Review {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for Identity {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

impl Identified for EntityId {
    fn id(&self) -> &EntityId {
        self
    }
}

#[derive(Debug)]
struct Collection<T> {
    items: Vec<T>,
    loaded: bool,
    revision: u64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
            revision: 0,
        }
    }
}

impl<T> Collection<T> {
    fn touch(&mut self) {
        self.revision += 1;
    }
}

/// Cached collection, shared between clones
#[derive(Debug)]
pub struct ResourceCache<T> {
    inner: Arc<RwLock<Collection<T>>>,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collection::default())),
        }
    }
}

impl<T: Identified + Clone> ResourceCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection (successful fetch)
    pub async fn replace(&self, items: Vec<T>) {
        let mut collection = self.inner.write().await;
        collection.items = items;
        collection.loaded = true;
        collection.touch();
    }

    /// Replace the collection and return what it held before
    pub async fn swap(&self, items: Vec<T>) -> (Vec<T>, bool) {
        let mut collection = self.inner.write().await;
        let previous = std::mem::replace(&mut collection.items, items);
        let was_loaded = std::mem::replace(&mut collection.loaded, true);
        collection.touch();
        (previous, was_loaded)
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.inner.read().await.items.clone()
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.inner
            .read()
            .await
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.inner.read().await.items.iter().any(|item| item.id() == id)
    }

    /// Append (create)
    pub async fn push(&self, item: T) {
        let mut collection = self.inner.write().await;
        collection.items.push(item);
        collection.touch();
    }

    /// Replace by id, appending when absent
    pub async fn upsert(&self, item: T) {
        let mut collection = self.inner.write().await;
        match collection.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => *existing = item,
            None => collection.items.push(item),
        }
        collection.touch();
    }

    /// Patch the entity with `id` in place; false when absent
    pub async fn update<F>(&self, id: &str, patch: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let mut collection = self.inner.write().await;
        let Some(existing) = collection.items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };
        patch(existing);
        collection.touch();
        true
    }

    /// Patch every entity
    pub async fn update_all<F>(&self, mut patch: F)
    where
        F: FnMut(&mut T),
    {
        let mut collection = self.inner.write().await;
        collection.items.iter_mut().for_each(&mut patch);
        collection.touch();
    }

    /// Filter out by id
    pub async fn remove(&self, id: &str) -> Option<T> {
        let mut collection = self.inner.write().await;
        let index = collection.items.iter().position(|item| item.id() == id)?;
        let removed = collection.items.remove(index);
        collection.touch();
        Some(removed)
    }

    /// Empty the collection and mark it not loaded
    pub async fn clear(&self) {
        let mut collection = self.inner.write().await;
        collection.items.clear();
        collection.loaded = false;
        collection.touch();
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.items.is_empty()
    }

    /// At least one fetch has succeeded since the last clear
    pub async fn is_loaded(&self) -> bool {
        self.inner.read().await.loaded
    }

    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: EntityId,
        value: u32,
    }

    impl Identified for Row {
        fn id(&self) -> &EntityId {
            &self.id
        }
    }

    fn row(id: u32, value: u32) -> Row {
        Row {
            id: EntityId::from(id),
            value,
        }
    }

    #[tokio::test]
    async fn test_replace_is_wholesale() {
        let cache = ResourceCache::new();
        cache.replace(vec![row(1, 1), row(2, 2)]).await;
        cache.replace(vec![row(3, 3)]).await;
        assert_eq!(cache.snapshot().await, vec![row(3, 3)]);
        assert!(cache.is_loaded().await);
    }

    #[tokio::test]
    async fn test_lookups_compare_ids_as_strings() {
        let cache = ResourceCache::new();
        cache.replace(vec![row(5, 50)]).await;
        assert_eq!(cache.get("5").await, Some(row(5, 50)));
        assert!(cache.contains("5").await);
        assert!(!cache.contains("05").await);
    }

    #[tokio::test]
    async fn test_upsert_update_remove() {
        let cache = ResourceCache::new();
        cache.push(row(1, 1)).await;
        cache.upsert(row(1, 10)).await;
        cache.upsert(row(2, 2)).await;
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("1").await.map(|r| r.value), Some(10));

        assert!(cache.update("2", |r| r.value = 20).await);
        assert!(!cache.update("9", |r| r.value = 0).await);
        assert_eq!(cache.get("2").await.map(|r| r.value), Some(20));

        assert_eq!(cache.remove("1").await, Some(row(1, 10)));
        assert_eq!(cache.remove("1").await, None);
        assert_eq!(cache.snapshot().await, vec![row(2, 20)]);
    }

    #[tokio::test]
    async fn test_revision_counts_writes_only() {
        let cache = ResourceCache::new();
        assert_eq!(cache.revision().await, 0);
        cache.replace(vec![row(1, 1)]).await;
        cache.get("1").await;
        cache.snapshot().await;
        assert_eq!(cache.revision().await, 1);
        // a miss is not a write
        cache.update("9", |_| {}).await;
        cache.remove("9").await;
        assert_eq!(cache.revision().await, 1);
        cache.clear().await;
        assert_eq!(cache.revision().await, 2);
        assert!(!cache.is_loaded().await);
    }

    #[tokio::test]
    async fn test_swap_reports_previous() {
        let cache = ResourceCache::new();
        let (previous, was_loaded) = cache.swap(vec![row(1, 1)]).await;
        assert!(previous.is_empty());
        assert!(!was_loaded);
        let (previous, was_loaded) = cache.swap(vec![row(2, 2)]).await;
        assert_eq!(previous, vec![row(1, 1)]);
        assert!(was_loaded);
    }
}
