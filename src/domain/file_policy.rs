//! Attachment gating and upload validation.
//!
//! Files become visible once an investment is `accepted` and stay visible
//! after it is `completed`. Only administrators upload or delete, and only
//! while the investment is `accepted`; completed investments are read-only.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Caller, InvestmentStatus, Role, UserId};
use crate::validation::FieldError;

/// Default maximum upload size: 10 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted for attachments.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/plain",
    "image/jpeg",
    "image/png",
    "image/webp",
];

/// Maximum length of a stored file name.
pub const FILE_NAME_MAX_LEN: usize = 255;

/// Returns `true` if files of an investment in `status` may be listed or
/// downloaded at all.
///
/// `rejected` and `cancelled` investments never expose files, even if the
/// backend holds some.
#[must_use]
pub const fn files_visible(status: InvestmentStatus) -> bool {
    matches!(
        status,
        InvestmentStatus::Accepted | InvestmentStatus::Completed
    )
}

/// Returns `true` if `role` may upload to an investment in `status`.
#[must_use]
pub const fn can_upload(role: Role, status: InvestmentStatus) -> bool {
    role.is_admin() && matches!(status, InvestmentStatus::Accepted)
}

/// Returns `true` if `role` may delete attachments of an investment in
/// `status`.
#[must_use]
pub const fn can_delete(role: Role, status: InvestmentStatus) -> bool {
    can_upload(role, status)
}

/// Returns `true` if `caller` may list and download files of an investment
/// owned by `owner` in `status`.
#[must_use]
pub fn can_view(caller: &Caller, owner: UserId, status: InvestmentStatus) -> bool {
    caller.may_access(owner) && files_visible(status)
}

/// File capabilities of a viewer, as rendered next to an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileCapabilities {
    /// Listing and download are available.
    pub can_view: bool,
    /// The upload control is rendered.
    pub can_upload: bool,
    /// Delete buttons are rendered.
    pub can_delete: bool,
}

impl FileCapabilities {
    /// Computes the capabilities of `caller` for an investment owned by
    /// `owner` in `status`.
    #[must_use]
    pub fn for_viewer(caller: &Caller, owner: UserId, status: InvestmentStatus) -> Self {
        Self {
            can_view: can_view(caller, owner, status),
            can_upload: can_upload(caller.role, status),
            can_delete: can_delete(caller.role, status),
        }
    }
}

/// Size and type limits for attachments.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Size limit in bytes; accepted files are strictly smaller.
    pub max_bytes: u64,
    /// Accepted MIME types.
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::with_max_bytes(DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl UploadPolicy {
    /// Default allow-list with a custom size limit.
    #[must_use]
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    /// Returns `true` if `mime` (parameters ignored) is allowed.
    #[must_use]
    pub fn allows_mime(&self, mime: &str) -> bool {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
    }

    /// Validates upload metadata before anything is transmitted or stored.
    ///
    /// # Errors
    ///
    /// Returns every failing field: empty or overlong name, empty or
    /// oversized content, disallowed MIME type.
    pub fn validate(&self, file_name: &str, size: u64, mime: &str) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let name_len = file_name.trim().chars().count();
        if name_len == 0 {
            errors.push(FieldError::new("file", "Nazwa pliku jest wymagana"));
        } else if name_len > FILE_NAME_MAX_LEN {
            errors.push(FieldError::new(
                "file",
                format!("Nazwa pliku może mieć maksymalnie {FILE_NAME_MAX_LEN} znaków"),
            ));
        }
        if size == 0 {
            errors.push(FieldError::new("file", "Plik jest pusty"));
        } else if size >= self.max_bytes {
            errors.push(FieldError::new(
                "file",
                format!(
                    "Plik jest za duży (maksymalnie {} MB)",
                    self.max_bytes / (1024 * 1024)
                ),
            ));
        }
        if !self.allows_mime(mime) {
            errors.push(FieldError::new("file", "Niedozwolony typ pliku"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Replaces characters unsafe in object-storage keys with `_`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
