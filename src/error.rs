use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// FieldErrors
///
/// Field-level validation messages keyed by form field name, serialized in field-name
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for an error set holding one message on one field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }
}

/// AppError
///
/// The request-boundary error taxonomy. Every handler returns `Result<_, AppError>`
/// and the `IntoResponse` impl below is the single place where failures become HTTP.
///
/// Access-control denials are not part of this enum: they are redirects, not error
/// pages, and live in `auth::AccessDenied`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown employee/department id, or a page outside the listing.
    #[error("{0}")]
    NotFound(String),

    /// Submitted data failed field-level validation. Nothing was persisted.
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Any other store failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }
}

/// ErrorBody
///
/// JSON body returned for `NotFound` and internal failures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorBody { error: message })).into_response()
            }
            AppError::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
            }
            AppError::Database(e) => {
                // The underlying cause stays in the logs; clients get a generic message.
                tracing::error!("database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
