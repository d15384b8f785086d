use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;

use crate::error::AppResult;

/// Fixed keys under which board state is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// The active identity
    Identity,
    /// Streamer → recommendations
    Recommendations,
    /// Admin audit log
    AuditLog,
}

impl Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageKey::Identity => write!(f, "streamrec_user"),
            StorageKey::Recommendations => write!(f, "streamrec_recommendations"),
            StorageKey::AuditLog => write!(f, "streamrec_admin_log"),
        }
    }
}

/// String-keyed store of JSON documents
///
/// Backends only move text around; encoding lives in [`load_json`] and
/// [`save_json`].
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> AppResult<()>;

    /// Stores a value that expires after `ttl` seconds
    async fn set_ex(&self, key: &str, value: String, ttl: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Reads and decodes a persisted document, falling back to its default when absent
pub async fn load_json<T>(store: &dyn KeyValueStore, key: StorageKey) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(&key.to_string()).await? {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(T::default()),
    }
}

/// Reads and decodes a persisted document that may be absent
pub async fn load_optional_json<T>(store: &dyn KeyValueStore, key: StorageKey) -> AppResult<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get(&key.to_string()).await? {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Encodes and writes a document, replacing whatever was stored under `key`
pub async fn save_json<T>(store: &dyn KeyValueStore, key: StorageKey, value: &T) -> AppResult<()>
where
    T: Serialize,
{
    let json = serde_json::to_string(value)?;
    store.set(&key.to_string(), json).await?;
    tracing::debug!(key = %key, backend = store.name(), "Persisted document");
    Ok(())
}
