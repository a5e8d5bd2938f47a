//! Investment request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{PaginationMeta, PaginationParams};
use crate::domain::{
    Caller, FileCapabilities, Investment, InvestmentAction, InvestmentStatus, Offer, StatusBadge,
    UserProfile, visible_actions,
};
use crate::service::InvestmentDetail;

/// Body of `PUT /api/investments/{id}`.
///
/// Both fields are optional at the wire level so that a missing `status`
/// or `reason` is reported as a field error rather than a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status: `accepted`, `rejected` or `completed`.
    #[serde(default)]
    pub status: Option<String>,
    /// Justification; required when `status` is `rejected`.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Body of `PUT /api/investments/{id}/cancel`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CancelRequest {
    /// Justification of at least 10 non-whitespace characters.
    #[serde(default)]
    pub reason: Option<String>,
}

/// Query of `GET /api/investments`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListInvestmentsQuery {
    /// Only return investments in this status.
    pub status: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page (max 100).
    pub per_page: Option<u32>,
}

impl ListInvestmentsQuery {
    /// Requested page with defaults applied and bounds clamped.
    #[must_use]
    pub fn pagination(&self) -> PaginationParams {
        let defaults = PaginationParams::default();
        PaginationParams {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
        .clamped()
    }
}

/// Investment as rendered in lists and after a status change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvestmentDto {
    /// Stored record.
    #[serde(flatten)]
    pub investment: Investment,
    /// Badge for the current status.
    pub status_badge: StatusBadge,
}

impl From<Investment> for InvestmentDto {
    fn from(investment: Investment) -> Self {
        let status_badge = investment.status.badge();
        Self {
            investment,
            status_badge,
        }
    }
}

/// Full investment view returned by `GET /api/investments/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvestmentDetailDto {
    /// Stored record.
    #[serde(flatten)]
    pub investment: Investment,
    /// Badge for the current status.
    pub status_badge: StatusBadge,
    /// Offer the investment was placed against.
    pub offer: Option<Offer>,
    /// Owner profile; administrators only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserProfile>,
    /// Actions the caller may trigger in the current status.
    pub available_actions: Vec<InvestmentAction>,
    /// What the caller may do with attachments.
    pub files: FileCapabilities,
}

impl InvestmentDetailDto {
    /// Builds the view of `detail` for `caller`.
    #[must_use]
    pub fn for_caller(detail: InvestmentDetail, caller: &Caller) -> Self {
        let InvestmentDetail {
            investment,
            offer,
            owner,
        } = detail;
        let status = investment.status;
        let available_actions = if caller.may_access(investment.user_id) {
            visible_actions(status, caller.role).to_vec()
        } else {
            Vec::new()
        };
        let files = FileCapabilities::for_viewer(caller, investment.user_id, status);
        Self {
            status_badge: status.badge(),
            investment,
            offer,
            owner,
            available_actions,
            files,
        }
    }
}

/// Paginated investment list.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvestmentListResponse {
    /// Current page.
    pub data: Vec<InvestmentDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// One row of the status catalog served by `GET /config/statuses`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusInfoDto {
    /// Wire value.
    pub status: InvestmentStatus,
    /// Badge shown for the status.
    pub badge: StatusBadge,
    /// Statuses reachable in one step.
    pub transitions: Vec<InvestmentStatus>,
    /// `true` when no further transition exists.
    pub terminal: bool,
}

impl From<InvestmentStatus> for StatusInfoDto {
    fn from(status: InvestmentStatus) -> Self {
        Self {
            status,
            badge: status.badge(),
            transitions: status.allowed_transitions().to_vec(),
            terminal: status.is_terminal(),
        }
    }
}
