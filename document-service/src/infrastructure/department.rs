use async_trait::async_trait;
use shared::types::Department;
use sqlx::PgPool;

use crate::{domain::department::DepartmentRepository, error::DocumentServiceError};

pub struct PgDepartmentRepository {
    pool: PgPool,
}

impl PgDepartmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DepartmentRepository for PgDepartmentRepository {
    #[tracing::instrument(skip(self))]
    async fn find_all_active(&self) -> Result<Vec<Department>, DocumentServiceError> {
        let output = sqlx::query_as::<_, Department>(
            r#"
            SELECT id, name_ar, name_en
            FROM departments
            WHERE is_active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Department>, DocumentServiceError> {
        let output = sqlx::query_as::<_, Department>(
            r#"
            SELECT id, name_ar, name_en
            FROM departments
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }
}
