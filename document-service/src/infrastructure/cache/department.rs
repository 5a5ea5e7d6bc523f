use std::sync::Arc;

use async_trait::async_trait;
use shared::types::Department;

use super::{JsonCache, client::RedisCache};
use crate::domain::department::DepartmentRepository;
use crate::error::DocumentServiceError;

/// Cache key for the active department list.
const KEY_ACTIVE: &str = "document-service:departments:active";
/// TTL in seconds for the active department list.
const TTL_ACTIVE: u64 = 300;
/// TTL in seconds for department-by-id entries.
const TTL_BY_ID: u64 = 600;

fn key_by_id(id: i64) -> String {
    format!("document-service:departments:id:{id}")
}

/// Cache-aside decorator around a [`DepartmentRepository`].
///
/// Departments are reference data edited outside this service, so entries
/// simply expire. Misses by id are not cached, so a department activated
/// later is visible on the next lookup.
pub struct CachedDepartmentRepository<C = RedisCache> {
    inner: Arc<dyn DepartmentRepository>,
    cache: C,
}

impl<C: JsonCache> CachedDepartmentRepository<C> {
    pub fn new(inner: Arc<dyn DepartmentRepository>, cache: C) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<C: JsonCache> DepartmentRepository for CachedDepartmentRepository<C> {
    async fn find_all_active(&self) -> Result<Vec<Department>, DocumentServiceError> {
        if let Some(cached) = self.cache.get::<Vec<Department>>(KEY_ACTIVE).await {
            return Ok(cached);
        }
        let output = self.inner.find_all_active().await?;
        self.cache.set(KEY_ACTIVE, &output, TTL_ACTIVE).await;

        Ok(output)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Department>, DocumentServiceError> {
        let key = key_by_id(id);
        if let Some(cached) = self.cache.get::<Department>(&key).await {
            return Ok(Some(cached));
        }
        let output = self.inner.find_by_id(id).await?;
        if let Some(department) = &output {
            self.cache.set(&key, department, TTL_BY_ID).await;
        }

        Ok(output)
    }
}
