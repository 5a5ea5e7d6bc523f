use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

// region: Users

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Helpdesk,
    Ceo,
}

impl UserRole {
    /// Whether this role sees every document and user.
    pub fn sees_everything(self) -> bool {
        matches!(self, Self::Ceo)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Compact user shape embedded in documents and signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

// endregion: Users

// region: Documents

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "document_priority", rename_all = "snake_case")]
pub enum DocumentPriority {
    High,
    #[default]
    Medium,
    Low,
}

impl DocumentPriority {
    /// Parses a query-string value; unknown values yield `None`.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "document_status", rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    InReview,
    Signed,
}

impl DocumentStatus {
    /// Parses a query-string value; unknown values yield `None`.
    pub fn from_param(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_review" => Some(Self::InReview),
            "signed" => Some(Self::Signed),
            _ => None,
        }
    }
}

/// Row shape used by document listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DocumentListItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: DocumentPriority,
    pub department: String,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

/// Full document with its people and attachments resolved.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: DocumentPriority,
    pub department: String,
    pub status: DocumentStatus,
    pub uploaded_by: UserSummary,
    pub reviewed_by: Option<UserSummary>,
    pub comments: Option<String>,
    pub redirect_department: Option<String>,
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Attachment {
    pub id: i64,
    pub document: i64,
    pub file: String,
    pub original_name: String,
    pub is_signed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Signature {
    pub id: i64,
    pub attachment: i64,
    pub signed_by: UserSummary,
    /// Base64 encoded signature image.
    pub signature_data: String,
    pub signed_at: DateTime<Utc>,
}

/// Document counts over the caller's visible set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DocumentStats {
    pub total_documents: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub by_department: BTreeMap<String, u64>,
}

// endregion: Documents

// region: Lookups

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: i64,
    pub name_ar: String,
    pub name_en: String,
}

// endregion: Lookups
