//! # investment-portal
//!
//! REST API and client action surface for the investment approval
//! workflow.
//!
//! Signers submit investments against offers; administrators accept, reject
//! and complete them, and attach documents once an investment is accepted.
//! Signers may cancel their own pending investments. All workflow rules are
//! pure lookups in [`domain`] shared by the server and the [`client`].
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, client::InvestmentClient)
//!     │
//!     ├── REST Handlers (api/) ── AuthUser (auth)
//!     │
//!     ├── InvestmentService (service/)
//!     ├── EventSink (service/) ──► event log task (service/)
//!     │
//!     ├── InvestmentRepository (store/): PostgreSQL | memory
//!     └── BlobStore (store/): filesystem | memory
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
pub mod validation;

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::AppConfig;

/// Room left in the request body limit for multipart framing.
const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Builds the HTTP application: routes plus the request body limit,
/// timeout, tracing and CORS layers.
pub fn build_app(state: AppState, config: &AppConfig) -> Router {
    let body_limit = usize::try_from(
        config
            .max_upload_bytes
            .saturating_add(MULTIPART_OVERHEAD_BYTES),
    )
    .unwrap_or(usize::MAX);

    Router::new()
        .merge(api::build_router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
