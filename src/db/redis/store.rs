use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::db::KeyValueStore;
use crate::error::AppResult;

/// Creates a Redis client for persisted state
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Redis-backed store; state survives restarts and is shared between processes
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connects through a connection manager, which reconnects on failure
    pub async fn connect(client: Client) -> AppResult<Self> {
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis get failed");
            e
        })?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(|e| {
            tracing::warn!(error = %e, key = %key, "Redis set failed");
            e
        })?;
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: String, ttl: u64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_rejects_bad_url() {
        assert!(create_redis_client("not a url").is_err());
    }

    // Requires a running Redis; set REDIS_URL to point at it.
    #[tokio::test]
    #[ignore]
    async fn test_roundtrip_against_live_redis() {
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

        let client = create_redis_client(&redis_url).unwrap();
        let store = RedisStore::connect(client).await.unwrap();

        store
            .set("streamrec_test_key", "value".to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get("streamrec_test_key").await.unwrap(),
            Some("value".to_string())
        );

        store.delete("streamrec_test_key").await.unwrap();
        assert_eq!(store.get("streamrec_test_key").await.unwrap(), None);
    }
}
