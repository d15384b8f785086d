use std::fmt::Display;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::db::KeyValueStore;
use crate::error::AppResult;

/// Keys for cached metadata responses; each encodes every request parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    MovieSearch {
        query: String,
        language: String,
        include_adult: bool,
        page: u32,
    },
    Popular {
        language: String,
        include_adult: bool,
        page: u32,
    },
    MovieDetails {
        movie_id: u64,
        language: String,
    },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieSearch {
                query,
                language,
                include_adult,
                page,
            } => write!(
                f,
                "tmdb:search:{}:{}:{}:{}",
                query.to_lowercase(),
                language,
                include_adult,
                page
            ),
            CacheKey::Popular {
                language,
                include_adult,
                page,
            } => write!(f, "tmdb:popular:{}:{}:{}", language, include_adult, page),
            CacheKey::MovieDetails { movie_id, language } => {
                write!(f, "tmdb:movie:{}:{}", movie_id, language)
            }
        }
    }
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Response cache for the metadata client
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn KeyValueStore>,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Signals the writer task and waits until it has flushed pending writes
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Cache writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Creates a cache over `store` and spawns its background writer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(store: Arc<dyn KeyValueStore>) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_store = store.clone();
        let task = tokio::spawn(async move {
            Self::cache_writer_task(writer_store, write_rx, shutdown_rx).await;
        });

        let cache = Self { store, write_tx };
        let handle = CacheWriterHandle { shutdown_tx, task };

        (cache, handle)
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown it drains whatever is already queued, then exits.
    async fn cache_writer_task(
        store: Arc<dyn KeyValueStore>,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!(backend = store.name(), "Cache writer task started");

        loop {
            tokio::select! {
                msg = write_rx.recv() => {
                    match msg {
                        Some(msg) => Self::write(store.as_ref(), msg).await,
                        None => break,
                    }
                }
                // A dropped handle disables this branch; the task then lives until
                // every Cache clone is gone.
                Some(()) = shutdown_rx.recv() => {
                    let mut flushed = 0;
                    while let Ok(msg) = write_rx.try_recv() {
                        Self::write(store.as_ref(), msg).await;
                        flushed += 1;
                    }
                    tracing::info!(flushed = flushed, "Cache writer flushed pending writes");
                    break;
                }
            }
        }

        tracing::info!("Cache writer task stopped");
    }

    async fn write(store: &dyn KeyValueStore, msg: CacheWriteMessage) {
        if let Err(e) = store.set_ex(&msg.key, msg.value, msg.ttl).await {
            tracing::error!(error = %e, key = %msg.key, "Failed to write cache entry");
        }
    }

    /// Retrieves and decodes a cached value
    ///
    /// Entries that no longer decode are treated as misses.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let cached = self.store.get(&key.to_string()).await?;

        match cached {
            Some(json) => match serde_json::from_str(&json) {
                Ok(data) => {
                    tracing::debug!(key = %key, "Cache hit");
                    Ok(Some(data))
                }
                Err(e) => {
                    tracing::warn!(error = %e, key = %key, "Discarding undecodable cache entry");
                    Ok(None)
                }
            },
            None => {
                tracing::debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Queues a value for storage without waiting for the write
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let msg = CacheWriteMessage {
            key: key.to_string(),
            value: json,
            ttl,
        };

        if self.write_tx.send(msg).is_err() {
            tracing::error!(key = %key, "Cache writer is gone; dropping write");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    fn search_key(query: &str) -> CacheKey {
        CacheKey::MovieSearch {
            query: query.to_string(),
            language: "es".to_string(),
            include_adult: false,
            page: 1,
        }
    }

    #[test]
    fn test_cache_key_display_search_lowercases_query() {
        assert_eq!(
            search_key("THE MATRIX").to_string(),
            "tmdb:search:the matrix:es:false:1"
        );
    }

    #[test]
    fn test_cache_key_display_popular() {
        let key = CacheKey::Popular {
            language: "en".to_string(),
            include_adult: true,
            page: 2,
        };
        assert_eq!(key.to_string(), "tmdb:popular:en:true:2");
    }

    #[test]
    fn test_cache_key_display_details() {
        let key = CacheKey::MovieDetails {
            movie_id: 603,
            language: "fr".to_string(),
        };
        assert_eq!(key.to_string(), "tmdb:movie:603:fr");
    }

    #[test]
    fn test_cache_keys_differ_by_language() {
        let es = search_key("matrix");
        let mut en = search_key("matrix");
        if let CacheKey::MovieSearch { language, .. } = &mut en {
            *language = "en".to_string();
        }
        assert_ne!(es.to_string(), en.to_string());
    }

    #[tokio::test]
    async fn test_cache_miss() {
        let (cache, _handle) = Cache::new(Arc::new(InMemoryStore::new()));
        let retrieved: Option<Vec<String>> =
            cache.get_from_cache(&search_key("nothing")).await.unwrap();
        assert_eq!(retrieved, None);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_pending_writes() {
        let store = Arc::new(InMemoryStore::new());
        let (cache, handle) = Cache::new(store.clone());

        let key = search_key("flush me");
        let value = vec!["a".to_string(), "b".to_string()];
        cache.set_in_background(&key, &value, 60);

        handle.shutdown().await;

        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, Some(value));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let store = Arc::new(InMemoryStore::new());
        let key = search_key("broken");
        store
            .set(&key.to_string(), "{oops".to_string())
            .await
            .unwrap();

        let (cache, _handle) = Cache::new(store);
        let retrieved: Option<Vec<String>> = cache.get_from_cache(&key).await.unwrap();
        assert_eq!(retrieved, None);
    }
}
