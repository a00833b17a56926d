//! Import creation endpoint

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;

use crate::{
    api::{
        dto::{ImportCreated, ImportCreatedResponse, ImportRequest},
        extract::JsonBody,
    },
    error::ServerResult,
    state::AppState,
};

/// Store a batch of citizens as a new import
///
/// The batch is rejected as a whole when any citizen fails field validation or
/// the relatives do not form a symmetric graph over the batch.
#[utoipa::path(
    post,
    path = "/imports",
    tag = "imports",
    request_body = ImportRequest,
    responses(
        (status = 201, description = "Import created", body = ImportCreatedResponse),
        (status = 400, description = "Invalid citizens or relatives", body = crate::error::ErrorResponse),
        (status = 413, description = "Request body too large", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_import(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<ImportRequest>,
) -> ServerResult<(StatusCode, Json<ImportCreatedResponse>)> {
    let records = request.into_records(Utc::now().date_naive())?;
    let import_id = state.registry.add_import(records).await?;

    Ok((
        StatusCode::CREATED,
        Json(ImportCreatedResponse {
            data: ImportCreated { import_id },
        }),
    ))
}
