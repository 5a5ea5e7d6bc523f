use async_trait::async_trait;
use serde::Deserialize;
use shared::types::{Document, DocumentListItem, DocumentPriority, DocumentStats, DocumentStatus};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{Viewer, Window, parse_flag, parse_id};
use crate::error::DocumentServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDocument {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<DocumentPriority>,
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters.")
    )]
    pub department: Option<String>,
    pub comments: Option<String>,
}

/// Validated document ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDocument {
    pub title: String,
    pub description: Option<String>,
    pub priority: DocumentPriority,
    pub department: String,
    pub comments: Option<String>,
}

impl CreateDocument {
    /// Call after `validate()`; required fields are present by then.
    pub fn into_new(self) -> Result<NewDocument, DocumentServiceError> {
        let (Some(title), Some(department)) = (self.title, self.department) else {
            return Err(DocumentServiceError::BadRequest(
                "Document payload was not validated".to_string(),
            ));
        };

        Ok(NewDocument {
            title,
            description: self.description,
            priority: self.priority.unwrap_or_default(),
            department,
            comments: self.comments,
        })
    }
}

/// Fields writable after creation. Absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct UpdateDocument {
    pub status: Option<DocumentStatus>,
    pub comments: Option<String>,
    #[validate(length(max = 100, message = "Ensure this field has no more than 100 characters."))]
    pub redirect_department: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangeStatus {
    #[validate(required(message = "Status is required"))]
    pub status: Option<DocumentStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderField {
    CreatedAt,
    UpdatedAt,
    Priority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub field: OrderField,
    pub descending: bool,
}

impl Default for Ordering {
    fn default() -> Self {
        Self {
            field: OrderField::CreatedAt,
            descending: true,
        }
    }
}

impl Ordering {
    /// Parses `field` or `-field`; unknown fields yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (descending, name) = match raw.strip_prefix('-') {
            Some(name) => (true, name),
            None => (false, raw),
        };
        let field = match name {
            "created_at" => OrderField::CreatedAt,
            "updated_at" => OrderField::UpdatedAt,
            "priority" => OrderField::Priority,
            _ => return None,
        };

        Some(Self { field, descending })
    }

    pub fn column(&self) -> &'static str {
        match self.field {
            OrderField::CreatedAt => "d.created_at",
            OrderField::UpdatedAt => "d.updated_at",
            OrderField::Priority => "d.priority",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub priority: Option<DocumentPriority>,
    pub department: Option<String>,
    pub uploaded_by: Option<i64>,
    pub reviewed_by: Option<i64>,
    pub search: Option<String>,
    pub ordering: Ordering,
}

/// Raw listing query. Values that do not parse are ignored.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DocumentQuery {
    /// `pending`, `in_review` or `signed`.
    pub status: Option<String>,
    /// `high`, `medium` or `low`.
    pub priority: Option<String>,
    pub department: Option<String>,
    pub uploaded_by: Option<String>,
    pub reviewed_by: Option<String>,
    /// Case-insensitive match on title, description and comments.
    pub search: Option<String>,
    /// `created_at`, `updated_at` or `priority`, prefixed with `-` for descending.
    pub ordering: Option<String>,
    /// `true` returns every match in one response.
    pub no_page: Option<String>,
}

impl DocumentQuery {
    pub fn no_page(&self) -> bool {
        parse_flag(self.no_page.as_deref())
    }

    pub fn to_filter(&self) -> DocumentFilter {
        let text = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };

        DocumentFilter {
            status: self.status.as_deref().and_then(DocumentStatus::from_param),
            priority: self
                .priority
                .as_deref()
                .and_then(DocumentPriority::from_param),
            department: text(&self.department),
            uploaded_by: parse_id(self.uploaded_by.as_deref()),
            reviewed_by: parse_id(self.reviewed_by.as_deref()),
            search: text(&self.search),
            ordering: self
                .ordering
                .as_deref()
                .and_then(Ordering::parse)
                .unwrap_or_default(),
        }
    }
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn count(&self, viewer: Viewer, filter: DocumentFilter)
    -> Result<u64, DocumentServiceError>;
    /// `window: None` returns every match.
    async fn list(
        &self,
        viewer: Viewer,
        filter: DocumentFilter,
        window: Option<Window>,
    ) -> Result<Vec<DocumentListItem>, DocumentServiceError>;
    async fn find_by_id(
        &self,
        viewer: Viewer,
        id: i64,
    ) -> Result<Option<Document>, DocumentServiceError>;
    async fn create(
        &self,
        uploaded_by: i64,
        document: NewDocument,
    ) -> Result<Document, DocumentServiceError>;
    async fn update(
        &self,
        viewer: Viewer,
        id: i64,
        document: UpdateDocument,
    ) -> Result<Option<Document>, DocumentServiceError>;
    /// Moving to `in_review` also claims the review for `viewer` when unassigned.
    async fn change_status(
        &self,
        viewer: Viewer,
        id: i64,
        status: DocumentStatus,
    ) -> Result<Option<Document>, DocumentServiceError>;
    async fn delete(&self, viewer: Viewer, id: i64) -> Result<bool, DocumentServiceError>;
    async fn stats(&self, viewer: Viewer) -> Result<DocumentStats, DocumentServiceError>;
}
