//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type of the HTTP layer. Each variant
//! maps to one status code and to the shared JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::{BlobError, StoreError};
use crate::validation::FieldError;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": "validation_error",
///   "message": "Nieprawidłowe dane wejściowe",
///   "details": [{ "field": "reason", "message": "Powód jest wymagany" }]
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// User-facing (Polish) message.
    pub message: String,
    /// Field-level validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorDetail>>,
}

/// One entry of [`ErrorResponse::details`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Offending field.
    pub field: String,
    /// User-facing message.
    pub message: String,
}

impl From<FieldError> for ErrorDetail {
    fn from(err: FieldError) -> Self {
        Self {
            field: err.field,
            message: err.message,
        }
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// | Variant        | Code               | HTTP |
/// |----------------|--------------------|------|
/// | `Validation`   | `validation_error` | 400  |
/// | `Unauthorized` | `unauthorized`     | 401  |
/// | `Forbidden`    | `forbidden`        | 403  |
/// | `NotFound`     | `not_found`        | 404  |
/// | `Internal`     | `internal_error`   | 500  |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or invalid input, with one entry per failing field.
    #[error("validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// No authenticated identity on the request.
    #[error("missing or invalid credentials")]
    Unauthorized,

    /// Authenticated but not permitted. Carries the user-facing message.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Resource or sub-resource absent. Carries the user-facing message.
    #[error("not found: {0}")]
    NotFound(&'static str),

    /// Unexpected failure. The detail is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Messages shared by several handlers.
pub mod messages {
    /// Generic 403 message.
    pub const FORBIDDEN: &str = "Brak uprawnień do wykonania tej operacji";
    /// Investment absent or soft-deleted.
    pub const INVESTMENT_NOT_FOUND: &str = "Nie znaleziono inwestycji";
    /// File metadata or blob absent.
    pub const FILE_NOT_FOUND: &str = "Nie znaleziono pliku";
    /// Files are hidden for the current status.
    pub const FILES_UNAVAILABLE: &str = "Pliki nie są dostępne dla inwestycji w tym statusie";
    /// Upload/delete attempted outside `accepted`.
    pub const FILES_READ_ONLY: &str =
        "Pliki można dodawać i usuwać tylko dla zaakceptowanych inwestycji";
}

impl ApiError {
    /// Shorthand for a single-field validation error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message. Never contains internal detail.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Nieprawidłowe dane wejściowe",
            Self::Unauthorized => "Brak autoryzacji",
            Self::Forbidden(msg) | Self::NotFound(msg) => *msg,
            Self::Internal(_) => "Wystąpił nieoczekiwany błąd serwera",
        }
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        Self::Validation(vec![err])
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::NotFound(_) => Self::NotFound(messages::FILE_NOT_FOUND),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let Self::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }
        let message = self.user_message().to_string();
        let error = self.error_code().to_string();
        let details = match self {
            Self::Validation(fields) => Some(fields.into_iter().map(ErrorDetail::from).collect()),
            _ => None,
        };
        let body = ErrorResponse {
            error,
            message,
            details,
        };
        (status, axum::Json(body)).into_response()
    }
}
