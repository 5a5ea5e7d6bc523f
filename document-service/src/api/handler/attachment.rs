use std::sync::Arc;

use axum::extract::State;
use shared::{
    pagination::PageParams,
    responses::{DeleteConfirmation, Envelope},
    types::Attachment,
};

use crate::{
    api::{
        extract::{AuthUser, PageRequest, QueryParams, ResourceId, ValidJson},
        reply::{ApiResult, Reply},
        state::DocumentServiceAppState,
    },
    domain::{
        Window,
        attachment::{AttachmentQuery, CreateAttachment, UpdateAttachment},
    },
    error::DocumentServiceError,
};

#[utoipa::path(
    get,
    path = "/api/documents/attachments/list",
    tag = "Attachments",
    operation_id = "list_attachments",
    security(("jwt" = [])),
    params(PageParams, AttachmentQuery),
    responses(
        (status = 200, description = "Attachments, paginated", body = Envelope<Attachment>)
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn find_all(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    request: PageRequest,
    QueryParams(query): QueryParams<AttachmentQuery>,
) -> ApiResult<Attachment> {
    let document_id = query.document_id();
    let total = state.attachment_repo.count(document_id).await?;
    let page = state
        .paginator
        .paginate(&request.params, total, &request.url)?;
    let output = state
        .attachment_repo
        .list(document_id, Window::from(&page))
        .await?;

    Ok(Reply::list(page.into_paged(output)))
}

#[utoipa::path(
    post,
    path = "/api/documents/attachments/create",
    tag = "Attachments",
    operation_id = "create_attachment",
    security(("jwt" = [])),
    request_body = CreateAttachment,
    responses(
        (status = 201, description = "Attachment created", body = Envelope<Attachment>),
        (status = 400, description = "Validation failed or unknown document")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn create(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ValidJson(payload): ValidJson<CreateAttachment>,
) -> ApiResult<Attachment> {
    let output = state.attachment_repo.create(payload.into_new()?).await?;

    Ok(Reply::created(output))
}

#[utoipa::path(
    get,
    path = "/api/documents/attachments/{id}",
    tag = "Attachments",
    operation_id = "get_attachment",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment found", body = Envelope<Attachment>),
        (status = 404, description = "Attachment not found")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn find_by_id(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Attachment> {
    let output = state
        .attachment_repo
        .find_by_id(id)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::single(output))
}

#[utoipa::path(
    put,
    path = "/api/documents/attachments/{id}",
    tag = "Attachments",
    operation_id = "update_attachment",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Attachment ID")
    ),
    request_body = UpdateAttachment,
    responses(
        (status = 200, description = "Attachment updated", body = Envelope<Attachment>),
        (status = 404, description = "Attachment not found")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn update(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
    ValidJson(payload): ValidJson<UpdateAttachment>,
) -> ApiResult<Attachment> {
    let output = state
        .attachment_repo
        .update(id, payload)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::updated(output))
}

#[utoipa::path(
    delete,
    path = "/api/documents/attachments/{id}",
    tag = "Attachments",
    operation_id = "delete_attachment",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Attachment ID")
    ),
    responses(
        (status = 200, description = "Attachment deleted", body = Envelope<DeleteConfirmation>),
        (status = 404, description = "Attachment not found")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn delete(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<DeleteConfirmation> {
    if !state.attachment_repo.delete(id).await? {
        return Err(DocumentServiceError::not_found());
    }

    Ok(Reply::deleted(id))
}
