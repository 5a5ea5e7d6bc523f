//! Request extractors whose rejections render as error envelopes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, OriginalUri, Path, Query, Request, rejection::JsonRejection,
    },
    http::{
        HeaderMap, StatusCode, Uri,
        header::{AUTHORIZATION, HOST},
        request::Parts,
    },
};
use serde::de::DeserializeOwned;
use shared::{pagination::PageParams, types::User};
use url::Url;
use validator::Validate;

use crate::{
    api::state::DocumentServiceAppState,
    domain::Viewer,
    error::DocumentServiceError,
    infrastructure::token::TokenType,
};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Active user behind the request's `Authorization: Bearer` access token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn viewer(&self) -> Viewer {
        Viewer {
            user_id: self.0.id,
            role: self.0.role,
        }
    }
}

impl FromRequestParts<Arc<DocumentServiceAppState>> for AuthUser {
    type Rejection = DocumentServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<DocumentServiceAppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                DocumentServiceError::Unauthorized(
                    "Authentication credentials were not provided.".to_string(),
                )
            })?;

        let claims = state
            .tokens
            .verify(token, TokenType::Access)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                DocumentServiceError::Unauthorized(
                    "Given token not valid for any token type".to_string(),
                )
            })?;

        let user = state
            .user_repo
            .find_by_id(claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| DocumentServiceError::Unauthorized("User not found".to_string()))?;

        Ok(Self(user))
    }
}

/// `page` / `page_size` plus the absolute URL pagination links are built from.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub params: PageParams,
    pub url: Url,
}

impl FromRequestParts<Arc<DocumentServiceAppState>> for PageRequest {
    type Rejection = DocumentServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<DocumentServiceAppState>,
    ) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        let url = absolute_url(&uri, &parts.headers, state.public_base_url.as_ref())?;

        Ok(Self {
            params: PageParams::from_url(&url),
            url,
        })
    }
}

/// Rebuilds the URL the client called. `base` wins over `Host` / `X-Forwarded-Proto`.
fn absolute_url(
    uri: &Uri,
    headers: &HeaderMap,
    base: Option<&Url>,
) -> Result<Url, DocumentServiceError> {
    let header = |name| headers.get(name).and_then(|v| v.to_str().ok());
    let invalid_host = || DocumentServiceError::BadRequest("Invalid HTTP_HOST header.".to_string());

    let base = match base {
        Some(base) => base.clone(),
        None => {
            let host = header(HOST.as_str()).or_else(|| uri.host()).unwrap_or("localhost");
            let scheme = header(FORWARDED_PROTO).unwrap_or("http");
            Url::parse(&format!("{scheme}://{host}")).map_err(|_| invalid_host())?
        }
    };

    let path_and_query = uri.path_and_query().map_or("/", |pq| pq.as_str());
    base.join(path_and_query).map_err(|_| invalid_host())
}

/// Query string deserialization with an envelope rejection.
#[derive(Debug, Clone, Default)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = DocumentServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| DocumentServiceError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: rejection.body_text(),
            })?;

        Ok(Self(value))
    }
}

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = DocumentServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        value.validate()?;

        Ok(Self(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> DocumentServiceError {
    let status = match rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };

    DocumentServiceError::Rejected {
        status,
        message: rejection.body_text(),
    }
}

/// Integer `{id}` path segment. Anything else is a plain 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceId(pub i64);

impl<S> FromRequestParts<S> for ResourceId
where
    S: Send + Sync,
{
    type Rejection = DocumentServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| DocumentServiceError::not_found())?;

        Ok(Self(id))
    }
}
