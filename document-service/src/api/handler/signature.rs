use std::sync::Arc;

use axum::extract::State;
use shared::{
    pagination::PageParams,
    responses::{DeleteConfirmation, Envelope},
    types::Signature,
};

use crate::{
    api::{
        extract::{AuthUser, PageRequest, QueryParams, ResourceId, ValidJson},
        reply::{ApiResult, Reply},
        state::DocumentServiceAppState,
    },
    domain::{
        Window,
        signature::{CreateSignature, SignatureQuery, UpdateSignature},
    },
    error::DocumentServiceError,
};

#[utoipa::path(
    get,
    path = "/api/documents/signature/list",
    tag = "Signatures",
    operation_id = "list_signatures",
    security(("jwt" = [])),
    params(PageParams, SignatureQuery),
    responses(
        (status = 200, description = "Signatures, paginated", body = Envelope<Signature>)
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn find_all(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    request: PageRequest,
    QueryParams(query): QueryParams<SignatureQuery>,
) -> ApiResult<Signature> {
    let attachment_id = query.attachment_id();
    let total = state.signature_repo.count(attachment_id).await?;
    let page = state
        .paginator
        .paginate(&request.params, total, &request.url)?;
    let output = state
        .signature_repo
        .list(attachment_id, Window::from(&page))
        .await?;

    Ok(Reply::list(page.into_paged(output)))
}

#[utoipa::path(
    post,
    path = "/api/documents/signature/create",
    tag = "Signatures",
    operation_id = "create_signature",
    security(("jwt" = [])),
    request_body = CreateSignature,
    responses(
        (status = 201, description = "Signature recorded, attachment marked signed", body = Envelope<Signature>),
        (status = 400, description = "Validation failed or unknown attachment")
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn create(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateSignature>,
) -> ApiResult<Signature> {
    let output = state
        .signature_repo
        .create(user.0.id, payload.into_new()?)
        .await?;

    tracing::info!(
        signature_id = output.id,
        attachment_id = output.attachment,
        "Attachment signed"
    );
    Ok(Reply::created(output))
}

#[utoipa::path(
    get,
    path = "/api/documents/signature/{id}",
    tag = "Signatures",
    operation_id = "get_signature",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Signature ID")
    ),
    responses(
        (status = 200, description = "Signature found", body = Envelope<Signature>),
        (status = 404, description = "Signature not found")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn find_by_id(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Signature> {
    let output = state
        .signature_repo
        .find_by_id(id)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::single(output))
}

#[utoipa::path(
    put,
    path = "/api/documents/signature/{id}",
    tag = "Signatures",
    operation_id = "update_signature",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Signature ID")
    ),
    request_body = UpdateSignature,
    responses(
        (status = 200, description = "Signature updated", body = Envelope<Signature>),
        (status = 404, description = "Signature not found")
    )
)]
#[tracing::instrument(skip(state, _user, payload))]
pub async fn update(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
    ValidJson(payload): ValidJson<UpdateSignature>,
) -> ApiResult<Signature> {
    let output = state
        .signature_repo
        .update(id, payload)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::updated(output))
}

#[utoipa::path(
    delete,
    path = "/api/documents/signature/{id}",
    tag = "Signatures",
    operation_id = "delete_signature",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Signature ID")
    ),
    responses(
        (status = 200, description = "Signature deleted", body = Envelope<DeleteConfirmation>),
        (status = 404, description = "Signature not found")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn delete(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<DeleteConfirmation> {
    if !state.signature_repo.delete(id).await? {
        return Err(DocumentServiceError::not_found());
    }

    Ok(Reply::deleted(id))
}
