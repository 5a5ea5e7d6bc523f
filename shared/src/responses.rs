use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::pagination::Paged;

/// Key used for failures that cannot be pinned to a single input field.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name to ordered list of human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ErrorMap(BTreeMap<String, Vec<String>>);

impl ErrorMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map holding a single message for `field`.
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    /// Map holding a single message under [`NON_FIELD_ERRORS`].
    pub fn non_field(message: impl Into<String>) -> Self {
        Self::field(NON_FIELD_ERRORS, message)
    }

    /// Appends `message` to the list kept for `field`, preserving insertion order.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Standard JSON response envelope returned by every endpoint.
///
/// `results` is always an array. `errors` is only serialized for failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
pub struct Envelope<T: Serialize> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<ErrorMap>,
}

impl<T: Serialize> Envelope<T> {
    fn one(item: T) -> Self {
        Self {
            count: 1,
            next: None,
            previous: None,
            results: vec![item],
            errors: None,
        }
    }

    /// Error envelope. An empty map still yields a non-empty `errors` entry.
    pub fn failed(mut errors: ErrorMap) -> Self {
        if errors.is_empty() {
            errors.push(NON_FIELD_ERRORS, "An unexpected error occurred.");
        }

        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
            errors: Some(errors),
        }
    }
}

/// Handler output tagged by response category.
#[derive(Debug)]
pub enum Outcome<T> {
    List(Paged<T>),
    Single(T),
    Created(T),
    Updated(T),
    Deleted(T),
    Failed(ErrorMap),
}

impl<T: Serialize> From<Outcome<T>> for Envelope<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::List(paged) => Self {
                count: paged.count,
                next: paged.next,
                previous: paged.previous,
                results: paged.items,
                errors: None,
            },
            Outcome::Single(item)
            | Outcome::Created(item)
            | Outcome::Updated(item)
            | Outcome::Deleted(item) => Self::one(item),
            Outcome::Failed(errors) => Self::failed(errors),
        }
    }
}

/// Confirmation item placed in `results` after a successful delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteConfirmation {
    pub message: String,
}

impl DeleteConfirmation {
    pub fn for_id(id: impl Display) -> Self {
        Self {
            message: format!("Resource with ID {id} deleted successfully"),
        }
    }
}

/// Plain message item for endpoints that have no resource to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for the `/headpat` health check endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct HeadpatResponse {
    pub message: &'static str,
}
