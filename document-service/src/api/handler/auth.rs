use std::sync::Arc;

use axum::extract::State;
use serde::Deserialize;
use shared::{
    responses::{Envelope, ErrorMap, MessageResponse},
    types::User,
};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    api::{
        extract::{AuthUser, ValidJson},
        reply::{ApiResult, Reply},
        state::DocumentServiceAppState,
    },
    domain::user::{ChangePassword, UpdateProfile},
    error::DocumentServiceError,
    infrastructure::{
        password::{hash_password, verify_password},
        token::{AccessToken, TokenError, TokenPair, TokenType},
    },
};

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

#[derive(Deserialize, Validate, ToSchema)]
pub struct ObtainToken {
    #[validate(required(message = "This field is required."))]
    pub username: Option<String>,
    #[validate(required(message = "This field is required."))]
    pub password: Option<String>,
}

#[derive(Deserialize, Validate, ToSchema)]
pub struct RefreshToken {
    #[validate(required(message = "This field is required."))]
    pub refresh: Option<String>,
}

fn invalid_credentials() -> DocumentServiceError {
    DocumentServiceError::Unauthorized(INVALID_CREDENTIALS.to_string())
}

fn token_failure(e: TokenError) -> DocumentServiceError {
    DocumentServiceError::Internal(format!("Could not sign token: {e}"))
}

#[utoipa::path(
    post,
    path = "/api/token",
    tag = "Auth",
    operation_id = "obtain_token",
    request_body = ObtainToken,
    responses(
        (status = 200, description = "Access and refresh tokens", body = Envelope<TokenPair>),
        (status = 401, description = "Unknown user, inactive account or wrong password")
    )
)]
#[tracing::instrument(skip(state, payload))]
pub async fn obtain_token(
    State(state): State<Arc<DocumentServiceAppState>>,
    ValidJson(payload): ValidJson<ObtainToken>,
) -> ApiResult<TokenPair> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(invalid_credentials());
    };

    let credentials = state
        .user_repo
        .find_credentials(username)
        .await?
        .filter(|c| c.user.is_active)
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&password, &credentials.password_hash)? {
        return Err(invalid_credentials());
    }

    let user = credentials.user;
    state.user_repo.record_login(user.id).await?;
    let output = state
        .tokens
        .issue_pair(user.id, user.role)
        .map_err(token_failure)?;

    tracing::info!(user_id = user.id, "Issued token pair");
    Ok(Reply::single(output))
}

#[utoipa::path(
    post,
    path = "/api/token/refresh",
    tag = "Auth",
    operation_id = "refresh_token",
    request_body = RefreshToken,
    responses(
        (status = 200, description = "New access token", body = Envelope<AccessToken>),
        (status = 401, description = "Refresh token invalid or expired")
    )
)]
#[tracing::instrument(skip(state, payload))]
pub async fn refresh_token(
    State(state): State<Arc<DocumentServiceAppState>>,
    ValidJson(payload): ValidJson<RefreshToken>,
) -> ApiResult<AccessToken> {
    let invalid = || DocumentServiceError::Unauthorized("Token is invalid or expired".to_string());
    let refresh = payload.refresh.ok_or_else(invalid)?;

    let claims = state
        .tokens
        .verify(&refresh, TokenType::Refresh)
        .map_err(|_| invalid())?;

    // Role may have changed since the refresh token was issued.
    let user = state
        .user_repo
        .find_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    let access = state
        .tokens
        .issue_access(user.id, user.role)
        .map_err(token_failure)?;

    Ok(Reply::single(AccessToken { access }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    operation_id = "logout",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Logged out", body = Envelope<MessageResponse>)
    )
)]
#[tracing::instrument(skip(user), fields(user_id = user.0.id))]
pub async fn logout(user: AuthUser) -> ApiResult<MessageResponse> {
    // Tokens are stateless; the client discards them.
    Ok(Reply::single(MessageResponse::new("Successfully logged out.")))
}

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "Auth",
    operation_id = "get_profile",
    security(("jwt" = [])),
    responses(
        (status = 200, description = "Current user", body = Envelope<User>)
    )
)]
#[tracing::instrument(skip(user), fields(user_id = user.0.id))]
pub async fn profile(user: AuthUser) -> ApiResult<User> {
    Ok(Reply::single(user.0))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile/update",
    tag = "Auth",
    operation_id = "update_profile",
    security(("jwt" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = Envelope<User>),
        (status = 400, description = "Validation failed")
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn update_profile(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ValidJson(payload): ValidJson<UpdateProfile>,
) -> ApiResult<User> {
    if payload.password.is_some() {
        return Err(DocumentServiceError::field(
            "password",
            "Use the change password endpoint to update password",
        ));
    }

    let output = state
        .user_repo
        .update(user.0.id, payload.into_changes())
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    Ok(Reply::updated(output))
}

#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "Auth",
    operation_id = "change_password",
    security(("jwt" = [])),
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password changed", body = Envelope<MessageResponse>),
        (status = 400, description = "Missing or incorrect password")
    )
)]
#[tracing::instrument(skip(state, user, payload), fields(user_id = user.0.id))]
pub async fn change_password(
    State(state): State<Arc<DocumentServiceAppState>>,
    user: AuthUser,
    ValidJson(payload): ValidJson<ChangePassword>,
) -> ApiResult<MessageResponse> {
    let (Some(old_password), Some(new_password)) = (
        payload.old_password.filter(|p| !p.is_empty()),
        payload.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(DocumentServiceError::Validation(ErrorMap::non_field(
            "Both old and new password are required",
        )));
    };

    let current_hash = state
        .user_repo
        .password_hash(user.0.id)
        .await?
        .ok_or_else(DocumentServiceError::not_found)?;

    if !verify_password(&old_password, &current_hash)? {
        return Err(DocumentServiceError::Validation(ErrorMap::non_field(
            "Incorrect old password",
        )));
    }

    let new_hash = hash_password(&new_password)?;
    state.user_repo.set_password(user.0.id, new_hash).await?;

    tracing::info!(user_id = user.0.id, "Password changed");
    Ok(Reply::updated(MessageResponse::new(
        "Password updated successfully",
    )))
}
