use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use shared::pagination::PaginationError;
use shared::responses::{Envelope, ErrorMap, NON_FIELD_ERRORS};
use thiserror::Error;
use validator::ValidationErrors;

/// Key validator uses for struct-level failures.
const VALIDATOR_STRUCT_KEY: &str = "__all__";

// Document Service Error
#[derive(Debug, Error)]
pub enum DocumentServiceError {
    #[error("Not Found: {0}")]
    NotFound(String),

    /// Field-level input failures, already keyed the way clients see them.
    #[error("Validation Error: {0:?}")]
    Validation(ErrorMap),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// Request could not be extracted (bad JSON, wrong content type).
    #[error("Rejected ({status}): {message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Pagination Error: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),
}

impl DocumentServiceError {
    /// Single-field validation failure.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ErrorMap::field(field, message))
    }

    pub fn not_found() -> Self {
        Self::NotFound("Not found.".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Pagination(PaginationError::InvalidPage) => StatusCode::NOT_FOUND,
            Self::Pagination(PaginationError::InvalidParameter(_)) => StatusCode::BAD_REQUEST,
            Self::Internal(_) | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Errors as they appear in the envelope.
    pub fn error_map(&self) -> ErrorMap {
        match self {
            Self::Validation(errors) => errors.clone(),
            Self::Pagination(e) => ErrorMap::field(e.field(), e.to_string()),
            Self::NotFound(message)
            | Self::BadRequest(message)
            | Self::Rejected { message, .. }
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::Conflict(message) => ErrorMap::non_field(message.clone()),
            Self::Internal(_) => ErrorMap::non_field("A server error occurred."),
            Self::Database(_) => {
                ErrorMap::non_field("Oof, Something went wrong while accessing the database.")
            }
        }
    }
}

impl From<ValidationErrors> for DocumentServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut map = ErrorMap::new();
        for (field, field_errors) in errors.field_errors() {
            let key = if field == VALIDATOR_STRUCT_KEY {
                NON_FIELD_ERRORS.to_string()
            } else {
                field.to_string()
            };
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                map.push(key.clone(), message);
            }
        }

        Self::Validation(map)
    }
}

impl IntoResponse for DocumentServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Server error");
        } else {
            tracing::warn!(error = %self, %status, "Client error");
        }

        let body = Envelope::<()>::failed(self.error_map());
        (status, axum::Json(body)).into_response()
    }
}
