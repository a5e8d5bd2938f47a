//! Client-side action surface.
//!
//! [`ActionPanel`] and [`FilePanel`] hold the per-view state of an
//! investment page: which controls render, the open confirmation dialog,
//! the in-flight flag and the last notice. They talk to the server through
//! the [`InvestmentApi`] trait, implemented over HTTP by
//! [`InvestmentClient`].

pub mod action_panel;
pub mod api;
pub mod file_panel;

#[cfg(test)]
pub(crate) mod fake;

pub use action_panel::{ActionDialog, ActionPanel, Submission};
pub use api::{ClientError, InvestmentApi, InvestmentClient};
pub use file_panel::FilePanel;

use crate::domain::InvestmentAction;
use crate::validation::FieldError;

/// Kind of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The operation succeeded.
    Success,
    /// The operation failed; entered form state is kept.
    Error,
}

/// Dismissible message shown after an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Success or error.
    pub kind: NoticeKind,
    /// User-facing (Polish) text.
    pub message: String,
}

impl Notice {
    /// A success notice.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    /// An error notice.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Why a panel refused or failed an operation.
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// A request from this panel is still in flight.
    #[error("a request is already in progress")]
    Busy,

    /// No confirmation dialog is open.
    #[error("no confirmation is pending")]
    NothingToConfirm,

    /// The action is not offered for the current status and role.
    #[error("action {0:?} is not available")]
    ActionUnavailable(InvestmentAction),

    /// The file operation is not offered for the current status and role.
    #[error("file operation is not available")]
    FilesUnavailable,

    /// Client-side validation failed; no request was sent.
    #[error("invalid input")]
    Invalid(Vec<FieldError>),

    /// The request was sent and failed.
    #[error(transparent)]
    Request(#[from] ClientError),
}
