//! Field-level input validation shared by the API handlers and the client
//! panels.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use utoipa::ToSchema;

/// Minimum number of non-whitespace characters in a cancellation or
/// rejection reason.
pub const REASON_MIN_LEN: usize = 10;

/// Maximum length of a cancellation or rejection reason, after trimming.
pub const REASON_MAX_LEN: usize = 1000;

/// A single validation failure attached to a named input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    /// Name of the offending field (`"status"`, `"reason"`, `"id"`, ...).
    pub field: String,
    /// User-facing message.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for FieldError {}

/// Validates a justification and returns the trimmed text.
///
/// # Errors
///
/// Returns a [`FieldError`] on the `reason` field when the text is missing,
/// has fewer than [`REASON_MIN_LEN`] non-whitespace characters, or is longer
/// than [`REASON_MAX_LEN`] characters after trimming.
pub fn validate_reason(reason: Option<&str>) -> Result<String, FieldError> {
    let trimmed = reason.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(FieldError::new("reason", "Powód jest wymagany"));
    }
    if trimmed.chars().filter(|c| !c.is_whitespace()).count() < REASON_MIN_LEN {
        return Err(FieldError::new(
            "reason",
            format!("Powód musi mieć co najmniej {REASON_MIN_LEN} znaków"),
        ));
    }
    if trimmed.chars().count() > REASON_MAX_LEN {
        return Err(FieldError::new(
            "reason",
            format!("Powód może mieć maksymalnie {REASON_MAX_LEN} znaków"),
        ));
    }
    Ok(trimmed.to_string())
}

/// Parses a path identifier, reporting failures against `field`.
///
/// # Errors
///
/// Returns a [`FieldError`] when `raw` is not a valid UUID.
pub fn parse_id<T: FromStr>(field: &str, raw: &str) -> Result<T, FieldError> {
    raw.parse()
        .map_err(|_| FieldError::new(field, "Nieprawidłowy identyfikator"))
}
