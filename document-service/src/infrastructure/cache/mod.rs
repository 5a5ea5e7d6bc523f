use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

pub mod client;
pub mod department;

/// Key/value store holding JSON-encoded values with a TTL.
///
/// Implementations never fail: errors are logged and read as misses.
#[async_trait]
pub trait JsonCache: Send + Sync {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Option<T>;
    async fn set<T: Serialize + Sync>(&self, key: &str, value: &T, ttl_seconds: u64);
}
