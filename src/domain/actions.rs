//! Role-gated investment actions.
//!
//! Every status transition is performed through exactly one
//! [`InvestmentAction`]. The action determines who may trigger it, which
//! status it starts from, which status it produces and whether a written
//! justification is required. [`visible_actions`] is the pure
//! `(status, role) → actions` lookup used both by the detail endpoint and by
//! the client-side action panel.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Caller, InvestmentStatus, Role, UserId};

/// A user-triggerable status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentAction {
    /// Administrator approves a pending investment.
    Accept,
    /// Administrator refuses a pending investment (reason required).
    Reject,
    /// Administrator settles an accepted investment.
    Complete,
    /// Owner withdraws a pending investment (reason required).
    Cancel,
}

impl InvestmentAction {
    /// Status the action moves the investment into.
    #[must_use]
    pub const fn target_status(self) -> InvestmentStatus {
        match self {
            Self::Accept => InvestmentStatus::Accepted,
            Self::Reject => InvestmentStatus::Rejected,
            Self::Complete => InvestmentStatus::Completed,
            Self::Cancel => InvestmentStatus::Cancelled,
        }
    }

    /// Status the investment must be in for the action to apply.
    #[must_use]
    pub const fn source_status(self) -> InvestmentStatus {
        match self {
            Self::Accept | Self::Reject | Self::Cancel => InvestmentStatus::Pending,
            Self::Complete => InvestmentStatus::Accepted,
        }
    }

    /// Role allowed to trigger the action.
    #[must_use]
    pub const fn required_role(self) -> Role {
        match self {
            Self::Accept | Self::Reject | Self::Complete => Role::Admin,
            Self::Cancel => Role::Signer,
        }
    }

    /// Whether a justification of at least ten characters is required.
    #[must_use]
    pub const fn requires_reason(self) -> bool {
        matches!(self, Self::Reject | Self::Cancel)
    }

    /// Maps the target of an administrator status change to its action.
    ///
    /// Returns `None` for `pending` (not a target) and `cancelled` (owner
    /// only, through the cancel endpoint).
    #[must_use]
    pub const fn for_admin_target(target: InvestmentStatus) -> Option<Self> {
        match target {
            InvestmentStatus::Accepted => Some(Self::Accept),
            InvestmentStatus::Rejected => Some(Self::Reject),
            InvestmentStatus::Completed => Some(Self::Complete),
            InvestmentStatus::Pending | InvestmentStatus::Cancelled => None,
        }
    }

    /// Button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Accept => "Zaakceptuj",
            Self::Reject => "Odrzuć",
            Self::Complete => "Zakończ",
            Self::Cancel => "Anuluj inwestycję",
        }
    }

    /// Question shown in the confirmation dialog.
    #[must_use]
    pub const fn confirmation_prompt(self) -> &'static str {
        match self {
            Self::Accept => "Czy na pewno chcesz zaakceptować tę inwestycję?",
            Self::Reject => "Czy na pewno chcesz odrzucić tę inwestycję? Podaj powód odrzucenia.",
            Self::Complete => "Czy na pewno chcesz oznaczyć tę inwestycję jako zakończoną?",
            Self::Cancel => "Czy na pewno chcesz anulować tę inwestycję? Podaj powód anulowania.",
        }
    }

    /// Notice shown after the request succeeded.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::Accept => "Inwestycja została zaakceptowana",
            Self::Reject => "Inwestycja została odrzucona",
            Self::Complete => "Inwestycja została zakończona",
            Self::Cancel => "Inwestycja została anulowana",
        }
    }

    /// Checks whether `caller` may apply this action to an investment owned
    /// by `owner` that is currently in `current`.
    ///
    /// Role and ownership are checked before the transition table.
    ///
    /// # Errors
    ///
    /// Returns [`ActionDenied::NotPermitted`] on role or ownership mismatch
    /// and [`ActionDenied::IllegalTransition`] when the investment is not in
    /// [`Self::source_status`].
    pub fn authorize(
        self,
        caller: &Caller,
        owner: UserId,
        current: InvestmentStatus,
    ) -> Result<(), ActionDenied> {
        if caller.role != self.required_role() {
            return Err(ActionDenied::NotPermitted);
        }
        if self.required_role() == Role::Signer && !caller.owns(owner) {
            return Err(ActionDenied::NotPermitted);
        }
        if current != self.source_status() || !current.can_transition_to(self.target_status()) {
            return Err(ActionDenied::IllegalTransition {
                from: current,
                to: self.target_status(),
            });
        }
        Ok(())
    }
}

/// Reason an action may not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionDenied {
    /// Caller lacks the role or does not own the investment.
    #[error("caller is not permitted to perform this action")]
    NotPermitted,
    /// The transition table does not allow the move.
    #[error("transition from {from} to {to} is not allowed")]
    IllegalTransition {
        /// Current status.
        from: InvestmentStatus,
        /// Requested status.
        to: InvestmentStatus,
    },
}

/// Actions rendered for a viewer with `role` looking at an investment in
/// `status`.
///
/// Signers can only see their own investments, so the signer branch is the
/// owner branch.
#[must_use]
pub const fn visible_actions(status: InvestmentStatus, role: Role) -> &'static [InvestmentAction] {
    match (role, status) {
        (Role::Signer, InvestmentStatus::Pending) => &[InvestmentAction::Cancel],
        (Role::Admin, InvestmentStatus::Pending) => {
            &[InvestmentAction::Accept, InvestmentAction::Reject]
        }
        (Role::Admin, InvestmentStatus::Accepted) => &[InvestmentAction::Complete],
        _ => &[],
    }
}
