use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::{Signature, UserRole, UserSummary};
use sqlx::{FromRow, PgPool};

use super::to_count;
use crate::{
    domain::{
        Window,
        signature::{NewSignature, SignatureRepository, UpdateSignature},
    },
    error::DocumentServiceError,
};

#[derive(FromRow)]
struct SignatureRow {
    id: i64,
    attachment: i64,
    signature_data: String,
    signed_at: DateTime<Utc>,
    signer_id: i64,
    signer_username: String,
    signer_first_name: String,
    signer_last_name: String,
    signer_email: String,
    signer_role: UserRole,
}

impl From<SignatureRow> for Signature {
    fn from(row: SignatureRow) -> Self {
        Self {
            id: row.id,
            attachment: row.attachment,
            signed_by: UserSummary {
                id: row.signer_id,
                username: row.signer_username,
                first_name: row.signer_first_name,
                last_name: row.signer_last_name,
                email: row.signer_email,
                role: row.signer_role,
            },
            signature_data: row.signature_data,
            signed_at: row.signed_at,
        }
    }
}

pub struct PgSignatureRepository {
    pool: PgPool,
}

impl PgSignatureRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SignatureRepository for PgSignatureRepository {
    #[tracing::instrument(skip(self))]
    async fn count(&self, attachment_id: Option<i64>) -> Result<u64, DocumentServiceError> {
        let output = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM signatures
            WHERE ($1::BIGINT IS NULL OR attachment_id = $1)
            "#,
        )
        .bind(attachment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(to_count(output))
    }

    #[tracing::instrument(skip(self))]
    async fn list(
        &self,
        attachment_id: Option<i64>,
        window: Window,
    ) -> Result<Vec<Signature>, DocumentServiceError> {
        let output = sqlx::query_as::<_, SignatureRow>(
            r#"
            SELECT s.id, s.attachment_id AS attachment, s.signature_data, s.signed_at,
                   u.id AS signer_id, u.username AS signer_username,
                   u.first_name AS signer_first_name, u.last_name AS signer_last_name,
                   u.email AS signer_email, u.role AS signer_role
            FROM signatures s
            JOIN users u ON u.id = s.signed_by_id
            WHERE ($1::BIGINT IS NULL OR s.attachment_id = $1)
            ORDER BY s.signed_at DESC, s.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(attachment_id)
        .bind(window.limit)
        .bind(window.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(output.into_iter().map(Signature::from).collect())
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Signature>, DocumentServiceError> {
        let output = sqlx::query_as::<_, SignatureRow>(
            r#"
            SELECT s.id, s.attachment_id AS attachment, s.signature_data, s.signed_at,
                   u.id AS signer_id, u.username AS signer_username,
                   u.first_name AS signer_first_name, u.last_name AS signer_last_name,
                   u.email AS signer_email, u.role AS signer_role
            FROM signatures s
            JOIN users u ON u.id = s.signed_by_id
            WHERE s.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(output.map(Signature::from))
    }

    #[tracing::instrument(skip(self, signature), fields(attachment = signature.attachment))]
    async fn create(
        &self,
        signed_by: i64,
        signature: NewSignature,
    ) -> Result<Signature, DocumentServiceError> {
        let attachment = signature.attachment;
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO signatures (attachment_id, signed_by_id, signature_data)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(attachment)
        .bind(signed_by)
        .bind(signature.signature_data)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                DocumentServiceError::field(
                    "attachment",
                    format!("Invalid pk \"{attachment}\" - object does not exist."),
                )
            }
            _ => e.into(),
        })?;

        sqlx::query("UPDATE document_attachments SET is_signed = TRUE WHERE id = $1")
            .bind(attachment)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            DocumentServiceError::Internal(format!("Signature {id} vanished after insert"))
        })
    }

    #[tracing::instrument(skip(self, signature))]
    async fn update(
        &self,
        id: i64,
        signature: UpdateSignature,
    ) -> Result<Option<Signature>, DocumentServiceError> {
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE signatures
            SET signature_data = COALESCE($2, signature_data)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(signature.signature_data)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(id) => self.find_by_id(id).await,
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, DocumentServiceError> {
        let output = sqlx::query("DELETE FROM signatures WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(output.rows_affected() > 0)
    }
}
