//! System endpoints: health check and status catalog.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::StatusInfoDto;
use crate::app_state::AppState;
use crate::domain::InvestmentStatus;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    pending_events: usize,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pending_events: state.investment_service.events().backlog(),
        }),
    )
}

/// `GET /config/statuses` — Investment status catalog.
#[utoipa::path(
    get,
    path = "/config/statuses",
    tag = "System",
    summary = "List investment statuses",
    description = "Returns every status with its badge and the statuses reachable from it.",
    responses(
        (status = 200, description = "Status catalog", body = Vec<StatusInfoDto>),
    )
)]
pub async fn statuses_handler() -> impl IntoResponse {
    let catalog: Vec<StatusInfoDto> = InvestmentStatus::ALL
        .into_iter()
        .map(StatusInfoDto::from)
        .collect();
    (StatusCode::OK, Json(catalog))
}

/// System routes mounted at the root level (not under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/statuses", get(statuses_handler))
}
