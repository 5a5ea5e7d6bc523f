//! Route table shared by the binary and the HTTP tests.

use std::{any::Any, sync::Arc};

use axum::{
    Router,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use tower_governor::GovernorError;
use tower_http::catch_panic::CatchPanicLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::{
    handler::{attachment, auth, department, document, health, signature, stats, user},
    openapi::ApiDoc,
    state::DocumentServiceAppState,
};
use crate::error::DocumentServiceError;

/// Every route plus the envelope-shaped fallbacks. Transport layers
/// (tracing, rate limiting) are added by the caller.
pub fn build_router(state: Arc<DocumentServiceAppState>) -> Router {
    Router::new()
        .route("/headpat", get(health::headpat))
        // Auth
        .route("/api/token", post(auth::obtain_token))
        .route("/api/token/refresh", post(auth::refresh_token))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/profile", get(auth::profile))
        .route("/api/auth/profile/update", put(auth::update_profile))
        .route("/api/auth/change-password", post(auth::change_password))
        // Users
        .route("/api/user", get(user::find_all).post(user::register))
        .route(
            "/api/user/{id}",
            get(user::find_by_id)
                .put(user::update)
                .patch(user::update)
                .delete(user::delete),
        )
        // Home
        .route("/api/home/stats", get(stats::document_stats))
        // Documents
        .route("/api/documents/list", get(document::find_all))
        .route("/api/documents/create", post(document::create))
        .route(
            "/api/documents/{id}",
            get(document::find_by_id)
                .put(document::update)
                .patch(document::update)
                .delete(document::delete),
        )
        .route(
            "/api/documents/{id}/change-status",
            post(document::change_status),
        )
        // Attachments
        .route("/api/documents/attachments/list", get(attachment::find_all))
        .route("/api/documents/attachments/create", post(attachment::create))
        .route(
            "/api/documents/attachments/{id}",
            get(attachment::find_by_id)
                .put(attachment::update)
                .patch(attachment::update)
                .delete(attachment::delete),
        )
        // Signatures
        .route("/api/documents/signature/list", get(signature::find_all))
        .route("/api/documents/signature/create", post(signature::create))
        .route(
            "/api/documents/signature/{id}",
            get(signature::find_by_id)
                .put(signature::update)
                .patch(signature::update)
                .delete(signature::delete),
        )
        // Lookups
        .route("/api/lookups/departments", get(department::find_all))
        .route("/api/lookups/departments/{id}", get(department::find_by_id))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

async fn not_found() -> DocumentServiceError {
    DocumentServiceError::not_found()
}

async fn method_not_allowed(method: Method) -> DocumentServiceError {
    DocumentServiceError::Rejected {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: format!("Method \"{method}\" not allowed."),
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");

    DocumentServiceError::Internal(format!("Handler panicked: {detail}")).into_response()
}

/// Error handler for the rate limiter layered around [`build_router`].
/// Keeps the limiter's `retry-after` and `x-ratelimit-*` headers.
pub fn rate_limit_response(error: GovernorError) -> Response {
    let (status, message, headers) = match error {
        GovernorError::TooManyRequests { wait_time, headers } => (
            StatusCode::TOO_MANY_REQUESTS,
            format!("Request was throttled. Expected available in {wait_time} seconds."),
            headers,
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unable to identify the client.".to_string(),
            None,
        ),
        GovernorError::Other { code, msg, headers } => (
            code,
            msg.unwrap_or_else(|| "Request rejected.".to_string()),
            headers,
        ),
    };

    let mut response = DocumentServiceError::Rejected { status, message }.into_response();
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
}
