use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde::{Serialize, de::DeserializeOwned};

use super::JsonCache;

/// JSON-over-Redis cache. Failures are logged and treated as misses so the
/// database stays the source of truth.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl JsonCache for RedisCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        let Some(json) = raw else {
            tracing::debug!(key, "Cache miss");
            return None;
        };

        match serde_json::from_str(&json) {
            Ok(value) => {
                tracing::debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Cached value is not decodable, ignoring");
                None
            }
        }
    }

    async fn set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, error = %e, "Value is not serializable, not caching");
                return;
            }
        };

        let mut conn = self.conn.clone();
        let output: Result<(), _> = conn.set_ex(key, json, ttl_seconds).await;
        if let Err(e) = output {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }
}
