//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::auth::JwtKeys;
use crate::service::InvestmentService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Investment service for all business logic.
    pub investment_service: Arc<InvestmentService>,
    /// Keys used to verify bearer tokens.
    pub auth: Arc<JwtKeys>,
}
