use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shared::{
    pagination::Paged,
    responses::{DeleteConfirmation, Envelope, Outcome},
};
use std::fmt::Display;

use crate::error::DocumentServiceError;

/// Successful handler output, rendered as an [`Envelope`].
///
/// Only success categories can be built here. Failures travel as
/// [`DocumentServiceError`], which picks its own status.
#[derive(Debug)]
pub struct Reply<T>(Outcome<T>);

pub type ApiResult<T> = Result<Reply<T>, DocumentServiceError>;

impl<T> Reply<T> {
    pub fn list(paged: Paged<T>) -> Self {
        Self(Outcome::List(paged))
    }

    pub fn single(item: T) -> Self {
        Self(Outcome::Single(item))
    }

    pub fn created(item: T) -> Self {
        Self(Outcome::Created(item))
    }

    pub fn updated(item: T) -> Self {
        Self(Outcome::Updated(item))
    }
}

impl Reply<DeleteConfirmation> {
    pub fn deleted(id: impl Display) -> Self {
        Self(Outcome::Deleted(DeleteConfirmation::for_id(id)))
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Outcome::Created(_) => StatusCode::CREATED,
            Outcome::List(_) | Outcome::Single(_) | Outcome::Updated(_) | Outcome::Deleted(_) => {
                StatusCode::OK
            }
            Outcome::Failed(errors) => {
                return DocumentServiceError::Validation(errors).into_response();
            }
        };

        (status, Json(Envelope::from(self.0))).into_response()
    }
}
