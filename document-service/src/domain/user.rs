use async_trait::async_trait;
use serde::Deserialize;
use shared::types::{User, UserRole};
use utoipa::ToSchema;
use validator::Validate;

use super::{Viewer, Window};
use crate::error::DocumentServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters.")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters.")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters.")
    )]
    pub last_name: Option<String>,
    pub role: Option<UserRole>,
    #[validate(
        required(message = "This field is required."),
        length(min = 8, message = "This password is too short. It must contain at least 8 characters.")
    )]
    pub password: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub password2: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
}

/// Profile edit payload. `password` is accepted only to be refused.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfile {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,
    #[schema(value_type = Option<String>)]
    pub password: Option<serde_json::Value>,
}

impl UpdateProfile {
    pub fn into_changes(self) -> UpdateUser {
        UpdateUser {
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePassword {
    pub old_password: Option<String>,
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub new_password: Option<String>,
}

/// Validated registration ready to persist.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DocumentServiceError>;
    async fn find_credentials(
        &self,
        username: String,
    ) -> Result<Option<UserCredentials>, DocumentServiceError>;
    async fn password_hash(&self, id: i64) -> Result<Option<String>, DocumentServiceError>;
    async fn count(&self, viewer: Viewer) -> Result<u64, DocumentServiceError>;
    async fn list(&self, viewer: Viewer, window: Window) -> Result<Vec<User>, DocumentServiceError>;
    async fn create(&self, user: NewUser) -> Result<User, DocumentServiceError>;
    async fn update(&self, id: i64, user: UpdateUser) -> Result<Option<User>, DocumentServiceError>;
    async fn set_password(&self, id: i64, password_hash: String) -> Result<(), DocumentServiceError>;
    async fn record_login(&self, id: i64) -> Result<(), DocumentServiceError>;
    async fn delete(&self, id: i64) -> Result<bool, DocumentServiceError>;
}
