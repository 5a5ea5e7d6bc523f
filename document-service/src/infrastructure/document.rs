use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::types::{
    Attachment, Document, DocumentListItem, DocumentPriority, DocumentStats, DocumentStatus,
    UserRole, UserSummary,
};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{like_pattern, to_count};
use crate::{
    domain::{
        Viewer, Window,
        document::{DocumentFilter, DocumentRepository, NewDocument, UpdateDocument},
    },
    error::DocumentServiceError,
};

const DETAIL_SELECT: &str = r#"
    SELECT d.id, d.title, d.description, d.priority, d.department, d.status,
           d.comments, d.redirect_department, d.created_at, d.updated_at,
           u.id AS uploader_id, u.username AS uploader_username,
           u.first_name AS uploader_first_name, u.last_name AS uploader_last_name,
           u.email AS uploader_email, u.role AS uploader_role,
           r.id AS reviewer_id, r.username AS reviewer_username,
           r.first_name AS reviewer_first_name, r.last_name AS reviewer_last_name,
           r.email AS reviewer_email, r.role AS reviewer_role
    FROM documents d
    JOIN users u ON u.id = d.uploaded_by_id
    LEFT JOIN users r ON r.id = d.reviewed_by_id
    WHERE TRUE"#;

#[derive(FromRow)]
struct DocumentRow {
    id: i64,
    title: String,
    description: Option<String>,
    priority: DocumentPriority,
    department: String,
    status: DocumentStatus,
    comments: Option<String>,
    redirect_department: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    uploader_id: i64,
    uploader_username: String,
    uploader_first_name: String,
    uploader_last_name: String,
    uploader_email: String,
    uploader_role: UserRole,
    reviewer_id: Option<i64>,
    reviewer_username: Option<String>,
    reviewer_first_name: Option<String>,
    reviewer_last_name: Option<String>,
    reviewer_email: Option<String>,
    reviewer_role: Option<UserRole>,
}

impl DocumentRow {
    fn into_document(self, attachments: Vec<Attachment>) -> Document {
        let reviewed_by = match (self.reviewer_id, self.reviewer_username, self.reviewer_role) {
            (Some(id), Some(username), Some(role)) => Some(UserSummary {
                id,
                username,
                first_name: self.reviewer_first_name.unwrap_or_default(),
                last_name: self.reviewer_last_name.unwrap_or_default(),
                email: self.reviewer_email.unwrap_or_default(),
                role,
            }),
            _ => None,
        };

        Document {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            department: self.department,
            status: self.status,
            uploaded_by: UserSummary {
                id: self.uploader_id,
                username: self.uploader_username,
                first_name: self.uploader_first_name,
                last_name: self.uploader_last_name,
                email: self.uploader_email,
                role: self.uploader_role,
            },
            reviewed_by,
            comments: self.comments,
            redirect_department: self.redirect_department,
            attachments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct BucketRow {
    key: String,
    total: i64,
}

/// Restricts `d` to what `viewer` may see. Ceo sees everything.
fn push_visibility(builder: &mut QueryBuilder<'_, Postgres>, viewer: Viewer) {
    if viewer.sees_everything() {
        return;
    }
    builder
        .push(" AND (d.uploaded_by_id = ")
        .push_bind(viewer.user_id)
        .push(" OR d.reviewed_by_id = ")
        .push_bind(viewer.user_id)
        .push(" OR d.status = 'pending')");
}

fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &DocumentFilter) {
    if let Some(status) = filter.status {
        builder.push(" AND d.status = ").push_bind(status);
    }
    if let Some(priority) = filter.priority {
        builder.push(" AND d.priority = ").push_bind(priority);
    }
    if let Some(department) = &filter.department {
        builder.push(" AND d.department = ").push_bind(department.clone());
    }
    if let Some(uploaded_by) = filter.uploaded_by {
        builder.push(" AND d.uploaded_by_id = ").push_bind(uploaded_by);
    }
    if let Some(reviewed_by) = filter.reviewed_by {
        builder.push(" AND d.reviewed_by_id = ").push_bind(reviewed_by);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (d.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR d.comments ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct PgDocumentRepository {
    pool: PgPool,
}

impl PgDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn attachments(&self, document_id: i64) -> Result<Vec<Attachment>, DocumentServiceError> {
        let output = sqlx::query_as::<_, Attachment>(
            r#"
            SELECT id, document_id AS document, file, original_name, is_signed, created_at
            FROM document_attachments
            WHERE document_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(output)
    }

    /// Loads the detail shape; `viewer: None` skips the visibility check.
    async fn fetch_detail(
        &self,
        viewer: Option<Viewer>,
        id: i64,
    ) -> Result<Option<Document>, DocumentServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new(DETAIL_SELECT);
        builder.push(" AND d.id = ").push_bind(id);
        if let Some(viewer) = viewer {
            push_visibility(&mut builder, viewer);
        }

        let row = builder
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let attachments = self.attachments(row.id).await?;
                Ok(Some(row.into_document(attachments)))
            }
            None => Ok(None),
        }
    }

    async fn buckets(
        &self,
        viewer: Viewer,
        column: &'static str,
    ) -> Result<BTreeMap<String, u64>, DocumentServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT ");
        builder
            .push(column)
            .push(" AS key, COUNT(*) AS total FROM documents d WHERE TRUE");
        push_visibility(&mut builder, viewer);
        builder.push(" GROUP BY 1");

        let rows = builder
            .build_query_as::<BucketRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.key, to_count(row.total)))
            .collect())
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    #[tracing::instrument(skip(self))]
    async fn count(
        &self,
        viewer: Viewer,
        filter: DocumentFilter,
    ) -> Result<u64, DocumentServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM documents d WHERE TRUE");
        push_visibility(&mut builder, viewer);
        push_filter(&mut builder, &filter);

        let output = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(to_count(output))
    }

    #[tracing::instrument(skip(self))]
    async fn list(
        &self,
        viewer: Viewer,
        filter: DocumentFilter,
        window: Option<Window>,
    ) -> Result<Vec<DocumentListItem>, DocumentServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new(
            r#"
            SELECT d.id, d.title, d.description, d.priority, d.department, d.status, d.created_at
            FROM documents d
            WHERE TRUE"#,
        );
        push_visibility(&mut builder, viewer);
        push_filter(&mut builder, &filter);

        // Ties on the sort column fall back to id so pages never overlap.
        builder
            .push(" ORDER BY ")
            .push(filter.ordering.column())
            .push(if filter.ordering.descending {
                " DESC"
            } else {
                " ASC"
            })
            .push(", d.id DESC");

        if let Some(window) = window {
            builder
                .push(" LIMIT ")
                .push_bind(window.limit)
                .push(" OFFSET ")
                .push_bind(window.offset);
        }

        let output = builder
            .build_query_as::<DocumentListItem>()
            .fetch_all(&self.pool)
            .await?;

        Ok(output)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(
        &self,
        viewer: Viewer,
        id: i64,
    ) -> Result<Option<Document>, DocumentServiceError> {
        self.fetch_detail(Some(viewer), id).await
    }

    #[tracing::instrument(skip(self, document), fields(title = %document.title))]
    async fn create(
        &self,
        uploaded_by: i64,
        document: NewDocument,
    ) -> Result<Document, DocumentServiceError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO documents (title, description, priority, department, comments, uploaded_by_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(document.title)
        .bind(document.description)
        .bind(document.priority)
        .bind(document.department)
        .bind(document.comments)
        .bind(uploaded_by)
        .fetch_one(&self.pool)
        .await?;

        self.fetch_detail(None, id).await?.ok_or_else(|| {
            DocumentServiceError::Internal(format!("Document {id} vanished after insert"))
        })
    }

    #[tracing::instrument(skip(self))]
    async fn update(
        &self,
        viewer: Viewer,
        id: i64,
        document: UpdateDocument,
    ) -> Result<Option<Document>, DocumentServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE documents AS d SET status = COALESCE(");
        builder
            .push_bind(document.status)
            .push(", d.status), comments = COALESCE(")
            .push_bind(document.comments)
            .push(", d.comments), redirect_department = COALESCE(")
            .push_bind(document.redirect_department)
            .push(", d.redirect_department), updated_at = now() WHERE d.id = ")
            .push_bind(id);
        push_visibility(&mut builder, viewer);
        builder.push(" RETURNING d.id");

        let updated = builder
            .build_query_scalar::<i64>()
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(id) => self.fetch_detail(None, id).await,
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn change_status(
        &self,
        viewer: Viewer,
        id: i64,
        status: DocumentStatus,
    ) -> Result<Option<Document>, DocumentServiceError> {
        let claim_review = status == DocumentStatus::InReview;

        let mut builder = QueryBuilder::<Postgres>::new("UPDATE documents AS d SET status = ");
        builder
            .push_bind(status)
            .push(", reviewed_by_id = CASE WHEN ")
            .push_bind(claim_review)
            .push(" AND d.reviewed_by_id IS NULL THEN ")
            .push_bind(viewer.user_id)
            .push(" ELSE d.reviewed_by_id END, updated_at = now() WHERE d.id = ")
            .push_bind(id);
        push_visibility(&mut builder, viewer);
        builder.push(" RETURNING d.id");

        let updated = builder
            .build_query_scalar::<i64>()
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(id) => self.fetch_detail(None, id).await,
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, viewer: Viewer, id: i64) -> Result<bool, DocumentServiceError> {
        let mut builder = QueryBuilder::<Postgres>::new("DELETE FROM documents AS d WHERE d.id = ");
        builder.push_bind(id);
        push_visibility(&mut builder, viewer);

        let output = builder.build().execute(&self.pool).await?;

        Ok(output.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn stats(&self, viewer: Viewer) -> Result<DocumentStats, DocumentServiceError> {
        let by_status = self.buckets(viewer, "d.status::text").await?;
        let by_priority = self.buckets(viewer, "d.priority::text").await?;
        let by_department = self.buckets(viewer, "d.department").await?;

        Ok(DocumentStats {
            total_documents: by_status.values().sum(),
            by_status,
            by_priority,
            by_department,
        })
    }
}
