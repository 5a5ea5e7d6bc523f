use async_trait::async_trait;
use serde::Deserialize;
use shared::types::Attachment;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{Window, parse_id};
use crate::error::DocumentServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAttachment {
    /// Stored file reference (path or URL).
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub file: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub document: Option<i64>,
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters.")
    )]
    pub original_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    pub document: i64,
    pub file: String,
    pub original_name: String,
}

impl CreateAttachment {
    /// Call after `validate()`; required fields are present by then.
    pub fn into_new(self) -> Result<NewAttachment, DocumentServiceError> {
        let (Some(document), Some(file), Some(original_name)) =
            (self.document, self.file, self.original_name)
        else {
            return Err(DocumentServiceError::BadRequest(
                "Attachment payload was not validated".to_string(),
            ));
        };

        Ok(NewAttachment {
            document,
            file,
            original_name,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct UpdateAttachment {
    pub document: Option<i64>,
    #[validate(length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters."))]
    pub file: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Ensure this field has between 1 and 255 characters."))]
    pub original_name: Option<String>,
    pub is_signed: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttachmentQuery {
    /// Only attachments of this document.
    pub document_id: Option<String>,
}

impl AttachmentQuery {
    pub fn document_id(&self) -> Option<i64> {
        parse_id(self.document_id.as_deref())
    }
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    async fn count(&self, document_id: Option<i64>) -> Result<u64, DocumentServiceError>;
    async fn list(
        &self,
        document_id: Option<i64>,
        window: Window,
    ) -> Result<Vec<Attachment>, DocumentServiceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Attachment>, DocumentServiceError>;
    async fn create(&self, attachment: NewAttachment) -> Result<Attachment, DocumentServiceError>;
    async fn update(
        &self,
        id: i64,
        attachment: UpdateAttachment,
    ) -> Result<Option<Attachment>, DocumentServiceError>;
    async fn delete(&self, id: i64) -> Result<bool, DocumentServiceError>;
}
