use std::sync::Arc;

use axum::extract::State;
use shared::{
    pagination::{PageParams, Paged},
    responses::{DeleteConfirmation, Envelope},
    types::{Document, DocumentListItem},
};

use crate::{
    api::{
        extract::{AuthUser, PageRequest, QueryParams, ResourceId, ValidJson},
        reply::{ApiResult, Reply},
        state::DocumentServiceAppState,
    },
    domain::{
        Window,
        document::{ChangeStatus, CreateDocument, DocumentQuery, UpdateDocument},
    },
    error::DocumentServiceError,
};

#[utoipa::path(
    get,
    path = "/api/documents/list",
    tag = "Documents",
    operation_id = "list_documents",
    security(("jwt" = [])),
    params(PageParams, DocumentQuery),
    responses(
        (status = 200, description = "Visible documents, filtered and paginated", body = Envelope<DocumentListItem>),
        (status = 400, description = "Invalid page or page_size"),
        (status = 404, description = "Page out of range")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn find_all(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    request: PageRequest,
    QueryParams(query): QueryParams<DocumentQuery>,
) -> ApiResult<DocumentListItem> {
    let viewer = user.viewer();
    let filter = query.to_filter();

    if query.no_page() {
        let output = state.document_repo.list(viewer, filter, None).await?;
        return Ok(Reply::list(Paged::unpaginated(output)));
    }

    let total = state.document_repo.count(viewer, filter.clone()).await?;
    let page = state
        .paginator
        .paginate(&request.params, total, &request.url)?;
    let output = state
        .document_repo
        .list(viewer, filter, Some(Window::from(&page)))
        .await?;

    Ok(Reply::list(page.into_paged(output)))
}

#[utoipa::path(
    post,
    path = "/api/documents/create",
    tag = "Documents",
    operation_id = "create_document",
    security(("jwt" = [])),
    request_body = CreateDocument,
    responses(
        (status = 201, description = "Document created", body = Envelope<Document>),
        (status = 400, description = "Validation failed")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn create(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ValidJson(payload): ValidJson<CreateDocument>,
) -> ApiResult<Document> {
    let output = state
        .document_repo
        .create(user.0.id, payload.into_new()?)
        .await?;

    tracing::info!(document_id = output.id, "Document created");
    Ok(Reply::created(output))
}

#[utoipa::path(
    get,
    path = "/api/documents/{id}",
    tag = "Documents",
    operation_id = "get_document",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document with people and attachments", body = Envelope<Document>),
        (status = 404, description = "Document not found or not visible")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn find_by_id(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Document> {
    let output = state
        .document_repo
        .find_by_id(user.viewer(), id)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::single(output))
}

#[utoipa::path(
    put,
    path = "/api/documents/{id}",
    tag = "Documents",
    operation_id = "update_document",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    request_body = UpdateDocument,
    responses(
        (status = 200, description = "Document updated", body = Envelope<Document>),
        (status = 404, description = "Document not found or not visible")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn update(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
    ValidJson(payload): ValidJson<UpdateDocument>,
) -> ApiResult<Document> {
    let output = state
        .document_repo
        .update(user.viewer(), id, payload)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::updated(output))
}

#[utoipa::path(
    delete,
    path = "/api/documents/{id}",
    tag = "Documents",
    operation_id = "delete_document",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    responses(
        (status = 200, description = "Document deleted", body = Envelope<DeleteConfirmation>),
        (status = 404, description = "Document not found or not visible")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn delete(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<DeleteConfirmation> {
    if !state.document_repo.delete(user.viewer(), id).await? {
        return Err(DocumentServiceError::not_found());
    }

    tracing::info!(document_id = id, "Document deleted");
    Ok(Reply::deleted(id))
}

#[utoipa::path(
    post,
    path = "/api/documents/{id}/change-status",
    tag = "Documents",
    operation_id = "change_document_status",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Document ID")
    ),
    request_body = ChangeStatus,
    responses(
        (status = 200, description = "Status changed", body = Envelope<Document>),
        (status = 400, description = "Status missing"),
        (status = 404, description = "Document not found or not visible")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn change_status(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
    ValidJson(payload): ValidJson<ChangeStatus>,
) -> ApiResult<Document> {
    let status = payload
        .status
        .ok_or_else(|| DocumentServiceError::field("status", "Status is required"))?;

    let output = state
        .document_repo
        .change_status(user.viewer(), id, status)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::updated(output))
}
