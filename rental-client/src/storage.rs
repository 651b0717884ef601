//! Durable key-value storage
//!
//! Holds the auth token and the favorites snapshot across restarts.
//! The core needs only `get` / `set` / `remove`.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{ClientError, ClientResult};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "auth_token";
/// Storage key for the favorites snapshot (JSON array of ids)
pub const FAVORITES_KEY: &str = "favorites";

/// Async key-value store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> ClientResult<()>;
    async fn remove(&self, key: &str) -> ClientResult<()>;
}

/// In-memory store (tests, ephemeral sessions)
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> ClientResult<()> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// JSON-file backed store
///
/// The whole map is rewritten on every change through a sibling temp file
/// and a rename, so a crash mid-write leaves the previous file intact. The
/// file is created on first write together with its parent directory.
#[derive(Debug)]
pub struct FileStore {
    file_path: PathBuf,
    entries: Mutex<Option<BTreeMap<String, String>>>,
}

impl FileStore {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn load(&self) -> ClientResult<BTreeMap<String, String>> {
        match tokio::fs::read_to_string(&self.file_path).await {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => Ok(entries),
                Err(e) => {
                    // Next write replaces the unreadable file
                    tracing::warn!(
                        path = %self.file_path.display(),
                        error = %e,
                        "Store file is corrupt, starting empty"
                    );
                    Ok(BTreeMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::Storage(e.to_string())),
        }
    }

    async fn save(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ClientError::Storage(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, content)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))?;
        tokio::fs::rename(&staging, &self.file_path)
            .await
            .map_err(|e| ClientError::Storage(e.to_string()))
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.file_path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let mut guard = self.entries.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        Ok(guard.as_ref().and_then(|map| map.get(key).cloned()))
    }

    async fn set(&self, key: &str, value: String) -> ClientResult<()> {
        let mut guard = self.entries.lock().await;
        let mut entries = match guard.take() {
            Some(entries) => entries,
            None => self.load().await?,
        };
        entries.insert(key.to_string(), value);
        let result = self.save(&entries).await;
        *guard = Some(entries);
        result
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        let mut guard = self.entries.lock().await;
        let mut entries = match guard.take() {
            Some(entries) => entries,
            None => self.load().await?,
        };
        let existed = entries.remove(key).is_some();
        let result = if existed { self.save(&entries).await } else { Ok(()) };
        *guard = Some(entries);
        result
    }
}
