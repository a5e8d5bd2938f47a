//! Status action controls of an investment view.

use super::{ClientError, InvestmentApi, Notice, PanelError};
use crate::api::dto::InvestmentDetailDto;
use crate::domain::{
    Caller, InvestmentAction, InvestmentId, InvestmentStatus, UserId, visible_actions,
};
use crate::validation::validate_reason;

/// Open confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDialog {
    /// Action awaiting confirmation.
    pub action: InvestmentAction,
    /// Justification typed so far.
    pub reason: String,
    /// Validation message shown under the reason field.
    pub reason_error: Option<String>,
}

impl ActionDialog {
    /// Prompt shown in the dialog.
    #[must_use]
    pub const fn prompt(&self) -> &'static str {
        self.action.confirmation_prompt()
    }

    /// Whether the dialog renders a reason field.
    #[must_use]
    pub const fn needs_reason(&self) -> bool {
        self.action.requires_reason()
    }
}

/// The single request a confirmed dialog issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Target investment.
    pub investment_id: InvestmentId,
    /// Confirmed action.
    pub action: InvestmentAction,
    /// Validated, trimmed justification for `cancel` and `reject`.
    pub reason: Option<String>,
}

impl Submission {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] of the failed call.
    pub async fn send(&self, api: &dyn InvestmentApi) -> Result<(), ClientError> {
        match self.action {
            InvestmentAction::Cancel => {
                api.cancel(self.investment_id, self.reason.as_deref().unwrap_or_default())
                    .await?;
            }
            action => {
                api.update_status(
                    self.investment_id,
                    action.target_status(),
                    self.reason.as_deref(),
                )
                .await?;
            }
        }
        Ok(())
    }
}

/// Per-view state of the status action controls.
///
/// Controls render from [`visible_actions`]; the status only advances when
/// the investment is refetched after a successful request.
#[derive(Debug, Clone)]
pub struct ActionPanel {
    caller: Caller,
    investment_id: InvestmentId,
    owner: UserId,
    status: InvestmentStatus,
    dialog: Option<ActionDialog>,
    in_flight: bool,
    notice: Option<Notice>,
}

impl ActionPanel {
    /// Creates the panel for `caller` viewing `view`.
    #[must_use]
    pub fn new(caller: Caller, view: &InvestmentDetailDto) -> Self {
        Self {
            caller,
            investment_id: view.investment.id,
            owner: view.investment.user_id,
            status: view.investment.status,
            dialog: None,
            in_flight: false,
            notice: None,
        }
    }

    /// Status as of the last fetch.
    #[must_use]
    pub const fn status(&self) -> InvestmentStatus {
        self.status
    }

    /// Actions to render. Empty for signers viewing someone else's
    /// investment.
    #[must_use]
    pub fn actions(&self) -> &'static [InvestmentAction] {
        if self.caller.may_access(self.owner) {
            visible_actions(self.status, self.caller.role)
        } else {
            &[]
        }
    }

    /// Whether the action buttons are disabled.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Open dialog, if any.
    #[must_use]
    pub const fn dialog(&self) -> Option<&ActionDialog> {
        self.dialog.as_ref()
    }

    /// Last notice, if not dismissed.
    #[must_use]
    pub const fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Hides the current notice.
    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Opens the confirmation dialog for `action`.
    ///
    /// # Errors
    ///
    /// [`PanelError::Busy`] while a request is in flight,
    /// [`PanelError::ActionUnavailable`] if the action is not rendered.
    pub fn open(&mut self, action: InvestmentAction) -> Result<(), PanelError> {
        if self.in_flight {
            return Err(PanelError::Busy);
        }
        if !self.actions().contains(&action) {
            return Err(PanelError::ActionUnavailable(action));
        }
        self.dialog = Some(ActionDialog {
            action,
            reason: String::new(),
            reason_error: None,
        });
        Ok(())
    }

    /// Updates the justification typed into the open dialog.
    pub fn set_reason(&mut self, reason: impl Into<String>) {
        if let Some(dialog) = self.dialog.as_mut() {
            dialog.reason = reason.into();
            dialog.reason_error = None;
        }
    }

    /// Closes the dialog without sending anything.
    pub fn close(&mut self) {
        if !self.in_flight {
            self.dialog = None;
        }
    }

    /// Validates the open dialog and marks the panel busy.
    ///
    /// # Errors
    ///
    /// [`PanelError::Busy`] if a request is already in flight,
    /// [`PanelError::NothingToConfirm`] without an open dialog,
    /// [`PanelError::Invalid`] when the justification fails validation. No
    /// request may be sent in any of these cases.
    pub fn begin_submit(&mut self) -> Result<Submission, PanelError> {
        if self.in_flight {
            return Err(PanelError::Busy);
        }
        let Some(dialog) = self.dialog.as_mut() else {
            return Err(PanelError::NothingToConfirm);
        };
        let reason = if dialog.action.requires_reason() {
            match validate_reason(Some(&dialog.reason)) {
                Ok(reason) => Some(reason),
                Err(e) => {
                    dialog.reason_error = Some(e.message.clone());
                    return Err(PanelError::Invalid(vec![e]));
                }
            }
        } else {
            None
        };
        self.in_flight = true;
        Ok(Submission {
            investment_id: self.investment_id,
            action: dialog.action,
            reason,
        })
    }

    /// Records the outcome of a submission.
    ///
    /// On success the dialog closes and `refreshed`, when present, replaces
    /// the displayed status. On failure the dialog stays open with its
    /// reason intact and the status is unchanged.
    pub fn finish(
        &mut self,
        submission: &Submission,
        result: &Result<(), ClientError>,
        refreshed: Option<&InvestmentDetailDto>,
    ) {
        self.in_flight = false;
        match result {
            Ok(()) => {
                self.dialog = None;
                if let Some(view) = refreshed {
                    self.status = view.investment.status;
                    self.owner = view.investment.user_id;
                }
                self.notice = Some(Notice::success(submission.action.success_message()));
            }
            Err(e) => {
                self.notice = Some(Notice::error(e.user_message()));
            }
        }
    }

    /// Confirms the open dialog: validates, sends exactly one request and
    /// refetches the investment on success.
    ///
    /// # Errors
    ///
    /// As for [`Self::begin_submit`], plus [`PanelError::Request`] when the
    /// request fails.
    pub async fn confirm(
        &mut self,
        api: &dyn InvestmentApi,
    ) -> Result<Option<InvestmentDetailDto>, PanelError> {
        let submission = self.begin_submit()?;
        let result = submission.send(api).await;
        let refreshed = match &result {
            Ok(()) => match api.get_investment(submission.investment_id).await {
                Ok(view) => Some(view),
                Err(e) => {
                    tracing::warn!(investment_id = %submission.investment_id, error = %e, "refetch after action failed");
                    None
                }
            },
            Err(_) => None,
        };
        self.finish(&submission, &result, refreshed.as_ref());
        result?;
        Ok(refreshed)
    }
}
