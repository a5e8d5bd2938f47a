//! Investment handlers: list, detail, status change, cancellation.
//!
//! Every handler takes [`AuthUser`] before any other input, then checks the
//! route role, then validates path and body. Ownership and workflow checks
//! happen in the service.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::Router;

use super::{json_body, require_role};
use crate::api::dto::{
    CancelRequest, DataResponse, InvestmentDetailDto, InvestmentDto, InvestmentListResponse,
    ListInvestmentsQuery, UpdateStatusRequest,
};
use crate::app_state::AppState;
use crate::auth::AuthUser;
use crate::domain::{InvestmentAction, InvestmentId, InvestmentStatus, Role};
use crate::error::{ApiError, ErrorResponse};
use crate::validation::{FieldError, parse_id, validate_reason};

/// `GET /api/investments` — List investments visible to the caller.
///
/// # Errors
///
/// 401 without identity, 400 on an unknown `status` filter.
#[utoipa::path(
    get,
    path = "/api/investments",
    tag = "Investments",
    summary = "List investments",
    description = "Administrators see every investment, signers only their own. Newest first.",
    params(ListInvestmentsQuery),
    responses(
        (status = 200, description = "Paginated investment list", body = InvestmentListResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_investments(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    query: Result<Query<ListInvestmentsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query.map_err(|e| {
        tracing::debug!(error = %e, "rejected list query");
        ApiError::invalid("query", "Nieprawidłowe parametry zapytania")
    })?;
    let status = query
        .status
        .as_deref()
        .map(str::parse::<InvestmentStatus>)
        .transpose()
        .map_err(|_| ApiError::invalid("status", "Nieznany status inwestycji"))?;
    let page = query.pagination();

    let (investments, total) = state
        .investment_service
        .list_investments(&caller, status, page.offset(), u64::from(page.per_page))
        .await?;

    Ok(Json(InvestmentListResponse {
        data: investments.into_iter().map(InvestmentDto::from).collect(),
        pagination: page.meta(total),
    }))
}

/// `GET /api/investments/{id}` — Investment detail.
///
/// # Errors
///
/// 401, 400 on a malformed id, 403 for a foreign investment, 404 if absent.
#[utoipa::path(
    get,
    path = "/api/investments/{id}",
    tag = "Investments",
    summary = "Get investment details",
    description = "Returns the investment with its offer, status badge, available actions and \
                   attachment capabilities. Administrators also receive the owner profile.",
    params(("id" = uuid::Uuid, Path, description = "Investment UUID")),
    responses(
        (status = 200, description = "Investment details", body = DataResponse<InvestmentDetailDto>),
        (status = 400, description = "Malformed identifier", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Investment not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn get_investment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id: InvestmentId = parse_id("id", &raw_id)?;
    let detail = state.investment_service.get_detail(&caller, id).await?;
    Ok(Json(DataResponse::new(InvestmentDetailDto::for_caller(
        detail, &caller,
    ))))
}

/// `PUT /api/investments/{id}` — Administrator status change.
///
/// # Errors
///
/// 401, 403 for non-administrators, 400 on invalid body or illegal
/// transition, 404 if absent.
#[utoipa::path(
    put,
    path = "/api/investments/{id}",
    tag = "Investments",
    summary = "Change investment status",
    description = "Accepts, rejects or completes an investment. A reason of at least 10 \
                   non-whitespace characters is required when rejecting.",
    params(("id" = uuid::Uuid, Path, description = "Investment UUID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = DataResponse<InvestmentDto>),
        (status = 400, description = "Invalid input or transition", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Administrators only", body = ErrorResponse),
        (status = 404, description = "Investment not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
    body: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&caller, Role::Admin)?;

    let mut errors = Vec::new();
    let id = parse_id::<InvestmentId>("id", &raw_id)
        .map_err(|e| errors.push(e))
        .ok();
    let req = json_body(body, &mut errors);

    let action = match req.as_ref().map(|r| r.status.as_deref().map(str::trim)) {
        None => None,
        Some(None | Some("")) => {
            errors.push(FieldError::new("status", "Status jest wymagany"));
            None
        }
        Some(Some(raw)) => match raw.parse::<InvestmentStatus>() {
            Err(_) => {
                errors.push(FieldError::new("status", "Nieznany status inwestycji"));
                None
            }
            Ok(target) => {
                let action = InvestmentAction::for_admin_target(target);
                if action.is_none() {
                    errors.push(FieldError::new(
                        "status",
                        format!("Administrator nie może ustawić statusu „{target}”"),
                    ));
                }
                action
            }
        },
    };

    let reason = match action {
        Some(action) if action.requires_reason() => {
            validate_reason(req.as_ref().and_then(|r| r.reason.as_deref()))
                .map_err(|e| errors.push(e))
                .ok()
        }
        _ => None,
    };

    let (Some(id), Some(action), true) = (id, action, errors.is_empty()) else {
        return Err(ApiError::Validation(errors));
    };

    let investment = state
        .investment_service
        .apply_action(&caller, id, action, reason)
        .await?;
    Ok(Json(DataResponse::with_message(
        InvestmentDto::from(investment),
        action.success_message(),
    )))
}

/// `PUT /api/investments/{id}/cancel` — Owner cancellation.
///
/// # Errors
///
/// 401, 403 for administrators or non-owners, 400 on a missing or short
/// reason or a non-pending investment, 404 if absent.
#[utoipa::path(
    put,
    path = "/api/investments/{id}/cancel",
    tag = "Investments",
    summary = "Cancel an investment",
    description = "Lets the owning signer withdraw a pending investment. A reason of at least \
                   10 non-whitespace characters is required.",
    params(("id" = uuid::Uuid, Path, description = "Investment UUID")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Investment cancelled", body = DataResponse<InvestmentDto>),
        (status = 400, description = "Invalid input or transition", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Owner only", body = ErrorResponse),
        (status = 404, description = "Investment not found", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn cancel_investment(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(raw_id): Path<String>,
    body: Result<Json<CancelRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    require_role(&caller, Role::Signer)?;

    let mut errors = Vec::new();
    let id = parse_id::<InvestmentId>("id", &raw_id)
        .map_err(|e| errors.push(e))
        .ok();
    let reason = json_body(body, &mut errors).and_then(|req| {
        validate_reason(req.reason.as_deref())
            .map_err(|e| errors.push(e))
            .ok()
    });

    let (Some(id), Some(reason)) = (id, reason) else {
        return Err(ApiError::Validation(errors));
    };

    let action = InvestmentAction::Cancel;
    let investment = state
        .investment_service
        .apply_action(&caller, id, action, Some(reason))
        .await?;
    Ok(Json(DataResponse::with_message(
        InvestmentDto::from(investment),
        action.success_message(),
    )))
}

/// Investment routes, nested under `/api/investments`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_investments))
        .route("/{id}", get(get_investment).put(update_status))
        .route("/{id}/cancel", put(cancel_investment))
}
