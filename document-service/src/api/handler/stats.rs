use std::sync::Arc;

use axum::extract::State;
use shared::{responses::Envelope, types::DocumentStats};

use crate::api::{
    extract::AuthUser,
    reply::{ApiResult, Reply},
    state::DocumentServiceAppState,
};

#[utoipa::path(
    get,
    path = "/api/home/stats",
    tag = "Home",
    operation_id = "document_stats",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Counts over the caller's visible documents", body = Envelope<DocumentStats>)
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn document_stats(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
) -> ApiResult<DocumentStats> {
    let output = state.document_repo.stats(user.viewer()).await?;

    Ok(Reply::single(output))
}
