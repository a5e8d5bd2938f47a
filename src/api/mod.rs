//! REST API layer: route handlers, DTOs, OpenAPI document and router
//! composition.
//!
//! Investment endpoints are mounted under `/api/investments`; system
//! endpoints live at the root.

pub mod dto;
pub mod handlers;

#[cfg(test)]
mod router_tests;

use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::app_state::AppState;

/// Path of the generated OpenAPI document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// OpenAPI document for every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "investment-portal",
        description = "Investment approval workflow: status changes and attachments."
    ),
    paths(
        handlers::investments::list_investments,
        handlers::investments::get_investment,
        handlers::investments::update_status,
        handlers::investments::cancel_investment,
        handlers::files::list_files,
        handlers::files::upload_file,
        handlers::files::download_file,
        handlers::files::delete_file,
        handlers::system::health_handler,
        handlers::system::statuses_handler,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Investments", description = "Investment workflow"),
        (name = "Files", description = "Investment attachments"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer` JWT security scheme.
#[derive(Debug)]
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Builds the complete API router with all REST endpoints and the OpenAPI
/// document.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/investments", handlers::routes())
        .merge(handlers::system::routes())
        .merge(docs_router())
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    Router::new()
        .merge(utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
