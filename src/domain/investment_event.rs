//! Domain events emitted after every investment mutation.
//!
//! Events are queued on the service's event sink and appended to the
//! `investment_events` log when the event log is enabled.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{FileId, InvestmentAction, InvestmentId, InvestmentStatus, UserId};

/// Event describing a completed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum InvestmentEvent {
    /// Status moved through one of the workflow actions.
    StatusChanged {
        /// Affected investment.
        investment_id: InvestmentId,
        /// Action that caused the change.
        action: InvestmentAction,
        /// Status before the change.
        from: InvestmentStatus,
        /// Status after the change.
        to: InvestmentStatus,
        /// Justification, for reject and cancel.
        reason: Option<String>,
        /// User who triggered the change.
        actor: UserId,
        /// Time of the change.
        timestamp: DateTime<Utc>,
    },

    /// An attachment was uploaded.
    FileUploaded {
        /// Owning investment.
        investment_id: InvestmentId,
        /// New file.
        file_id: FileId,
        /// Uploaded file name.
        file_name: String,
        /// Size in bytes.
        file_size: i64,
        /// Uploading administrator.
        actor: UserId,
        /// Upload time.
        timestamp: DateTime<Utc>,
    },

    /// An attachment was deleted.
    FileDeleted {
        /// Owning investment.
        investment_id: InvestmentId,
        /// Removed file.
        file_id: FileId,
        /// Deleting administrator.
        actor: UserId,
        /// Deletion time.
        timestamp: DateTime<Utc>,
    },
}

impl InvestmentEvent {
    /// Investment the event belongs to.
    #[must_use]
    pub const fn investment_id(&self) -> InvestmentId {
        match self {
            Self::StatusChanged { investment_id, .. }
            | Self::FileUploaded { investment_id, .. }
            | Self::FileDeleted { investment_id, .. } => *investment_id,
        }
    }

    /// Snake-case discriminator, as stored in the event log.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::StatusChanged { .. } => "status_changed",
            Self::FileUploaded { .. } => "file_uploaded",
            Self::FileDeleted { .. } => "file_deleted",
        }
    }

    /// User who caused the event.
    #[must_use]
    pub const fn actor(&self) -> UserId {
        match self {
            Self::StatusChanged { actor, .. }
            | Self::FileUploaded { actor, .. }
            | Self::FileDeleted { actor, .. } => *actor,
        }
    }
}
