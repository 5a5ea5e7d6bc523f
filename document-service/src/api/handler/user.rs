use std::sync::Arc;

use axum::extract::State;
use shared::{
    pagination::PageParams,
    responses::{DeleteConfirmation, Envelope},
    types::User,
};

use crate::{
    api::{
        extract::{AuthUser, PageRequest, ResourceId, ValidJson},
        reply::{ApiResult, Reply},
        state::DocumentServiceAppState,
    },
    domain::{
        Window,
        user::{NewUser, RegisterUser, UpdateUser},
    },
    error::DocumentServiceError,
    infrastructure::password::hash_password,
};

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "Users",
    operation_id = "list_users",
    security(("jwt" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Visible users, paginated", body = Envelope<User>),
        (status = 404, description = "Page out of range")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn find_all(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    request: PageRequest,
) -> ApiResult<User> {
    let viewer = user.viewer();
    let total = state.user_repo.count(viewer).await?;
    let page = state
        .paginator
        .paginate(&request.params, total, &request.url)?;
    let output = state.user_repo.list(viewer, Window::from(&page)).await?;

    Ok(Reply::list(page.into_paged(output)))
}

#[utoipa::path(
    post,
    path = "/api/user",
    tag = "Users",
    operation_id = "register_user",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = Envelope<User>),
        (status = 400, description = "Validation failed")
    )
)]
#[tracing::instrument(skip(state, payload))]
pub async fn register(
    State(state): State<Arc<DocumentServiceAppState>>,
    ValidJson(payload): ValidJson<RegisterUser>,
) -> ApiResult<User> {
    let RegisterUser {
        username: Some(username),
        email: Some(email),
        first_name: Some(first_name),
        last_name: Some(last_name),
        role,
        password: Some(password),
        password2: Some(password2),
    } = payload
    else {
        return Err(DocumentServiceError::BadRequest(
            "Registration payload was not validated".to_string(),
        ));
    };

    if password != password2 {
        return Err(DocumentServiceError::field(
            "password",
            "Password fields didn't match.",
        ));
    }

    let output = state
        .user_repo
        .create(NewUser {
            username,
            email,
            first_name,
            last_name,
            role: role.unwrap_or_default(),
            password_hash: hash_password(&password)?,
        })
        .await?;

    tracing::info!(user_id = output.id, "User registered");
    Ok(Reply::created(output))
}

#[utoipa::path(
    get,
    path = "/api/user/{id}",
    tag = "Users",
    operation_id = "get_user",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = Envelope<User>),
        (status = 404, description = "User not found or not visible")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn find_by_id(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<User> {
    if !user.viewer().can_see_user(id) {
        return Err(DocumentServiceError::not_found());
    }

    let output = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::single(output))
}

#[utoipa::path(
    put,
    path = "/api/user/{id}",
    tag = "Users",
    operation_id = "update_user",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = Envelope<User>),
        (status = 404, description = "User not found or not visible")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn update(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
    ValidJson(payload): ValidJson<UpdateUser>,
) -> ApiResult<User> {
    if !user.viewer().can_see_user(id) {
        return Err(DocumentServiceError::not_found());
    }

    let output = state
        .user_repo
        .update(id, payload)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::updated(output))
}

#[utoipa::path(
    delete,
    path = "/api/user/{id}",
    tag = "Users",
    operation_id = "delete_user",
    security(("jwt" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User deleted", body = Envelope<DeleteConfirmation>),
        (status = 404, description = "User not found or not visible"),
        (status = 409, description = "User still referenced by documents")
    )
)]
#[tracing::instrument(skip(state, user), fields(user_id = user.0.id))]
pub async fn delete(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ResourceId(id): ResourceId,
) -> ApiResult<DeleteConfirmation> {
    if !user.viewer().can_see_user(id) || !state.user_repo.delete(id).await? {
        return Err(DocumentServiceError::not_found());
    }

    Ok(Reply::deleted(id))
}
