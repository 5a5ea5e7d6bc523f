use async_trait::async_trait;
use shared::types::Attachment;
use sqlx::PgPool;

use super::to_count;
use crate::{
    domain::{
        Window,
        attachment::{AttachmentRepository, NewAttachment, UpdateAttachment},
    },
    error::DocumentServiceError,
};

pub struct PgAttachmentRepository {
    pool: PgPool,
}

impl PgAttachmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A dangling `document` reference is reported on the field, like any other bad input.
fn map_document_fk(e: sqlx::Error, document: Option<i64>) -> DocumentServiceError {
    match (&e, document) {
        (sqlx::Error::Database(db), Some(id)) if db.is_foreign_key_violation() => {
            DocumentServiceError::field(
                "document",
                format!("Invalid pk \"{id}\" - object does not exist."),
            )
        }
        _ => e.into(),
    }
}

#[async_trait]
impl AttachmentRepository for PgAttachmentRepository {
    #[tracing::instrument(skip(self))]
    async fn count(&self, document_id: Option<i64>) -> Result<u64, DocumentServiceError> {
        let output = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM document_attachments
            WHERE ($1::BIGINT IS NULL OR document_id = $1)
            "#,
        )
        .bind(document_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(output))
    }

    #[tracing::instrument(skip(self))]
    async fn list(
        &self,
        document_id: Option<i64>,
        window: Window,
    ) -> Result<Vec<Attachment>, DocumentServiceError> {
        let output = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, document_id AS document, file, original_name, is_signed, created_at
            FROM document_attachments
            WHERE ($1::BIGINT IS NULL OR document_id = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(document_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Attachment>, DocumentServiceError> {
        let output = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, document_id AS document, file, original_name, is_signed, created_at
            FROM document_attachments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn create(&self, attachment: NewAttachment) -> Result<Attachment, DocumentServiceError> {
        let document = attachment.document;
        let output = sqlx::query_as::<_, Attachment>(
            r#"
            INSERT INTO document_attachments (document_id, file, original_name)
            VALUES ($1, $2, $3)
            RETURNING id, document_id AS document, file, original_name, is_signed, created_at
            "#,
        )
        .bind(attachment.document)
        .bind(attachment.file)
        .bind(attachment.original_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_document_fk(e, Some(document)))?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        id: i64,
        attachment: UpdateAttachment,
    ) -> Result<Option<Attachment>, DocumentServiceError> {
        let document = attachment.document;
        let output = sqlx::query_as::<_, Attachment>(
            r#"
            UPDATE document_attachments
            SET document_id = COALESCE($2, document_id),
                file = COALESCE($3, file),
                original_name = COALESCE($4, original_name),
                is_signed = COALESCE($5, is_signed)
            WHERE id = $1
            RETURNING id, document_id AS document, file, original_name, is_signed, created_at
            "#,
        )
        .bind(id)
        .bind(attachment.document)
        .bind(attachment.file)
        .bind(attachment.original_name)
        .bind(attachment.is_signed)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_document_fk(e, document))?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, DocumentServiceError> {
        let output = sqlx::query("DELETE FROM document_attachments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(output.rows_affected() > 0)
    }
}
