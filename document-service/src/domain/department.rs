use async_trait::async_trait;
use shared::types::Department;

use crate::error::DocumentServiceError;

/// Read-only lookup of active departments.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    async fn find_all_active(&self) -> Result<Vec<Department>, DocumentServiceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Department>, DocumentServiceError>;
}
