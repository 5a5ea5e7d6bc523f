use async_trait::async_trait;
use serde::Deserialize;
use shared::types::Signature;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{Window, parse_id};
use crate::error::DocumentServiceError;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSignature {
    #[validate(required(message = "This field is required."))]
    pub attachment: Option<i64>,
    /// Base64 encoded signature image, optionally as a `data:` URL.
    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "This field may not be blank.")
    )]
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSignature {
    pub attachment: i64,
    pub signature_data: String,
}

impl CreateSignature {
    /// Call after `validate()`; required fields are present by then.
    pub fn into_new(self) -> Result<NewSignature, DocumentServiceError> {
        let (Some(attachment), Some(signature_data)) = (self.attachment, self.signature_data)
        else {
            return Err(DocumentServiceError::BadRequest(
                "Signature payload was not validated".to_string(),
            ));
        };

        Ok(NewSignature {
            attachment,
            signature_data,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate, ToSchema)]
pub struct UpdateSignature {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub signature_data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SignatureQuery {
    /// Only signatures on this attachment.
    pub attachment_id: Option<String>,
}

impl SignatureQuery {
    pub fn attachment_id(&self) -> Option<i64> {
        parse_id(self.attachment_id.as_deref())
    }
}

#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait]
pub trait SignatureRepository: Send + Sync {
    async fn count(&self, attachment_id: Option<i64>) -> Result<u64, DocumentServiceError>;
    async fn list(
        &self,
        attachment_id: Option<i64>,
        window: Window,
    ) -> Result<Vec<Signature>, DocumentServiceError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Signature>, DocumentServiceError>;
    /// Records the signature and marks its attachment as signed.
    async fn create(
        &self,
        signed_by: i64,
        signature: NewSignature,
    ) -> Result<Signature, DocumentServiceError>;
    async fn update(
        &self,
        id: i64,
        signature: UpdateSignature,
    ) -> Result<Option<Signature>, DocumentServiceError>;
    async fn delete(&self, id: i64) -> Result<bool, DocumentServiceError>;
}
