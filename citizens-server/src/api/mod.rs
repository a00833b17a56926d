//! API implementation for the citizens HTTP server

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request, State},
    http::Method,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use utoipa::OpenApi;

use crate::{
    error::{ErrorResponse, ServerError, not_found},
    state::AppState,
};

pub mod citizens;
pub mod dto;
#[cfg(test)]
mod dto_tests;
pub mod extract;
pub mod imports;
pub mod reports;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        imports::create_import,
        citizens::list_citizens,
        citizens::update_citizen,
        reports::birthdays,
        reports::age_percentiles,
        health_check,
    ),
    components(
        schemas(
            dto::ImportRequest,
            dto::CitizenInput,
            dto::PatchCitizenRequest,
            dto::CitizenDto,
            dto::ImportCreated,
            dto::PresentsDto,
            dto::TownAgeStatsDto,
            dto::ImportCreatedResponse,
            dto::CitizenResponse,
            dto::CitizenListResponse,
            dto::BirthdaysResponse,
            dto::PercentileResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "imports", description = "Upload batches of citizens"),
        (name = "citizens", description = "Read and patch citizens of an import"),
        (name = "reports", description = "Birthday and age statistics of an import"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "Citizens Registry API",
        version = "1.0.0",
        description = "Imports of citizens whose relatives form a symmetric graph, with per-import birthday and age reports.",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;

/// Create the main router with all API endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_request_size = state.config.max_request_size;

    Router::new()
        .route(
            "/imports",
            post(imports::create_import).fallback(method_not_allowed),
        )
        .route(
            "/imports/{import_id}/citizens",
            get(citizens::list_citizens).fallback(method_not_allowed),
        )
        .route(
            "/imports/{import_id}/citizens/birthdays",
            get(reports::birthdays).fallback(method_not_allowed),
        )
        .route(
            "/imports/{import_id}/citizens/{citizen_id}",
            patch(citizens::update_citizen).fallback(method_not_allowed),
        )
        .route(
            "/imports/{import_id}/towns/stat/percentile/age",
            get(reports::age_percentiles).fallback(method_not_allowed),
        )
        .route(
            "/health",
            get(health_check).fallback(method_not_allowed),
        )
        .route(
            "/api-docs/openapi.json",
            get(openapi_json).fallback(method_not_allowed),
        )
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(max_request_size))
        .layer(middleware::from_fn(reject_trailing_slash))
        .with_state(state)
}

/// Paths ending in `/` never match a resource, except the root itself.
async fn reject_trailing_slash(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if path.len() > 1 && path.ends_with('/') {
        return not_found(path).into_response();
    }
    next.run(request).await
}

async fn route_not_found(request: Request) -> ServerError {
    not_found(request.uri().path())
}

async fn method_not_allowed(method: Method) -> ServerError {
    ServerError::MethodNotAllowed(method.to_string())
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health and storage details", body = serde_json::Value)
    )
)]
async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let healthy = state.registry.health_check().await.unwrap_or(false);
    let storage = state
        .registry
        .store()
        .get_metadata()
        .await
        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }));

    Json(serde_json::json!({
        "status": if healthy { "OK" } else { "DEGRADED" },
        "version": ::citizens::VERSION,
        "storage": storage,
    }))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
