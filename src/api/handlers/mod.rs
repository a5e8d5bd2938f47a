//! REST endpoint handlers organized by resource.

pub mod files;
pub mod investments;
pub mod system;

use axum::{Json, Router};
use axum::extract::rejection::JsonRejection;

use crate::app_state::AppState;
use crate::domain::{Caller, Role};
use crate::error::{ApiError, messages};
use crate::validation::FieldError;

/// Composes all investment routes under `/api/investments`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(investments::routes())
        .merge(files::routes())
}

/// Route-level role gate, evaluated before any input validation.
fn require_role(caller: &Caller, role: Role) -> Result<(), ApiError> {
    if caller.role == role {
        Ok(())
    } else {
        tracing::debug!(user_id = %caller.user_id, required = %role, "route role mismatch");
        Err(ApiError::Forbidden(messages::FORBIDDEN))
    }
}

/// Unwraps a JSON body, recording a `body` error when it was rejected so
/// it is reported together with path errors.
fn json_body<T>(body: Result<Json<T>, JsonRejection>, errors: &mut Vec<FieldError>) -> Option<T> {
    match body {
        Ok(Json(value)) => Some(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected request body");
            errors.push(FieldError::new("body", "Nieprawidłowe dane żądania"));
            None
        }
    }
}
