use std::sync::Arc;

use shared::pagination::Paginator;
use url::Url;

use crate::{
    domain::{
        attachment::AttachmentRepository, department::DepartmentRepository,
        document::DocumentRepository, signature::SignatureRepository, user::UserRepository,
    },
    infrastructure::token::TokenService,
};

pub struct DocumentServiceAppState {
    pub paginator: Paginator,
    pub tokens: TokenService,
    /// Overrides the request's scheme and host in pagination links.
    pub public_base_url: Option<Url>,
    pub user_repo: Arc<dyn UserRepository>,
    pub document_repo: Arc<dyn DocumentRepository>,
    pub attachment_repo: Arc<dyn AttachmentRepository>,
    pub signature_repo: Arc<dyn SignatureRepository>,
    pub department_repo: Arc<dyn DepartmentRepository>,
}
