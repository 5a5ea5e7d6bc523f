use std::sync::Arc;

use axum::extract::State;
use shared::{pagination::PageParams, responses::Envelope, types::Department};

use crate::{
    api::{
        extract::{AuthUser, PageRequest, ResourceId},
        reply::{ApiResult, Reply},
        state::DocumentServiceAppState,
    },
    error::DocumentServiceError,
};

#[utoipa::path(
    get,
    path = "/api/lookups/departments",
    tag = "Lookups",
    operation_id = "list_departments",
    security(("jwt" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Active departments, paginated", body = Envelope<Department>)
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn find_all(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    request: PageRequest,
) -> ApiResult<Department> {
    // The cached list is small and complete, so the page is cut in memory.
    let output = state.department_repo.find_all_active().await?;
    let page = state
        .paginator
        .paginate(&request.params, output.len() as u64, &request.url)?;

    Ok(Reply::list(page.slice(output)))
}

#[utoipa::path(
    get,
    path = "/api/lookups/departments/{id}",
    tag = "Lookups",
    operation_id = "get_department",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "Department ID")
    ),
    responses(
        (status = 200, description = "Department found", body = Envelope<Department>),
        (status = 404, description = "Department not found or inactive")
    )
)]
#[tracing::instrument(skip(state, _user))]
pub async fn find_by_id(
    State(state): State<Arc<DocumentServiceAppState>>,
    _user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<Department> {
    let output = state
        .department_repo
        .find_by_id(id)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::single(output))
}
