//! Investment status values, the transition table and display metadata.
//!
//! ```text
//!            ┌──────────► accepted ──────► completed
//!  pending ──┼──────────► rejected
//!            └──────────► cancelled
//! ```
//!
//! `pending` is the only initial state. `rejected`, `cancelled` and
//! `completed` are terminal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    /// Submitted by the investor, awaiting a decision.
    Pending,
    /// Approved by an administrator.
    Accepted,
    /// Rejected by an administrator.
    Rejected,
    /// Withdrawn by the owning investor.
    Cancelled,
    /// Settled by an administrator.
    Completed,
}

impl InvestmentStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Accepted,
        Self::Rejected,
        Self::Cancelled,
        Self::Completed,
    ];

    /// Returns the wire/database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Statuses reachable from `self` in one step.
    #[must_use]
    pub const fn allowed_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Rejected, Self::Cancelled],
            Self::Accepted => &[Self::Completed],
            Self::Rejected | Self::Cancelled | Self::Completed => &[],
        }
    }

    /// Returns `true` if `next` is reachable from `self` in one step.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Returns `true` for statuses without outgoing transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Display badge for this status.
    #[must_use]
    pub const fn badge(self) -> StatusBadge {
        let (label, variant) = match self {
            Self::Pending => ("Oczekująca", BadgeVariant::Warning),
            Self::Accepted => ("Zaakceptowana", BadgeVariant::Info),
            Self::Rejected => ("Odrzucona", BadgeVariant::Destructive),
            Self::Cancelled => ("Anulowana", BadgeVariant::Muted),
            Self::Completed => ("Zakończona", BadgeVariant::Success),
        };
        StatusBadge {
            label: std::borrow::Cow::Borrowed(label),
            variant,
        }
    }
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the five known values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown investment status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for InvestmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// Visual variant of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    /// Awaiting action.
    Warning,
    /// In progress.
    Info,
    /// Finished successfully.
    Success,
    /// Refused.
    Destructive,
    /// Withdrawn.
    Muted,
    /// Unrecognised status.
    Neutral,
}

/// Label and variant used to render a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusBadge {
    /// Human-readable (Polish) label.
    #[schema(value_type = String)]
    pub label: std::borrow::Cow<'static, str>,
    /// Visual variant.
    pub variant: BadgeVariant,
}

/// Maps a raw status string to its badge.
///
/// Unknown values never fail: the label echoes the raw string and the
/// variant is [`BadgeVariant::Neutral`].
#[must_use]
pub fn status_badge(raw: &str) -> StatusBadge {
    match raw.parse::<InvestmentStatus>() {
        Ok(status) => status.badge(),
        Err(_) => StatusBadge {
            label: std::borrow::Cow::Owned(raw.to_string()),
            variant: BadgeVariant::Neutral,
        },
    }
}
