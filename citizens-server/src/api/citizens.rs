//! Citizen listing and partial update endpoints

use std::sync::Arc;

use axum::{extract::State, response::Json};
use chrono::Utc;
use tracing::debug;

use citizens::models::{CitizenId, ImportId};

use crate::{
    api::{
        dto::{CitizenDto, CitizenListResponse, CitizenResponse, PatchCitizenRequest},
        extract::{IdPath, JsonBody},
    },
    error::{ErrorResponse, ServerResult},
    state::AppState,
};

/// List all citizens of an import ordered by id
#[utoipa::path(
    get,
    path = "/imports/{import_id}/citizens",
    tag = "citizens",
    params(("import_id" = u64, Path, description = "Import id")),
    responses(
        (status = 200, description = "Citizens of the import", body = CitizenListResponse),
        (status = 404, description = "Import not found", body = ErrorResponse)
    )
)]
pub async fn list_citizens(
    State(state): State<Arc<AppState>>,
    IdPath(import_id): IdPath<ImportId>,
) -> ServerResult<Json<CitizenListResponse>> {
    let citizens = state.registry.list_citizens(import_id).await?;

    Ok(Json(CitizenListResponse {
        data: citizens.into_iter().map(CitizenDto::from).collect(),
    }))
}

/// Change some fields of one citizen
///
/// A `relatives` list replaces the current one; the reverse side of every
/// added or removed relation changes with it.
#[utoipa::path(
    patch,
    path = "/imports/{import_id}/citizens/{citizen_id}",
    tag = "citizens",
    params(
        ("import_id" = u64, Path, description = "Import id"),
        ("citizen_id" = u64, Path, description = "Citizen id within the import")
    ),
    request_body = PatchCitizenRequest,
    responses(
        (status = 200, description = "Updated citizen", body = CitizenResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Import, citizen or relative not found", body = ErrorResponse)
    )
)]
pub async fn update_citizen(
    State(state): State<Arc<AppState>>,
    IdPath((import_id, citizen_id)): IdPath<(ImportId, CitizenId)>,
    JsonBody(body): JsonBody<serde_json::Value>,
) -> ServerResult<Json<CitizenResponse>> {
    let request = PatchCitizenRequest::from_value(body)?;
    let (update, relatives) = request.into_update(Utc::now().date_naive())?;
    debug!(import_id, citizen_id, "Updating citizen");

    let citizen = state
        .registry
        .update_citizen(import_id, citizen_id, update, relatives)
        .await?;

    Ok(Json(CitizenResponse {
        data: CitizenDto::from(citizen),
    }))
}
