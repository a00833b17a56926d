//! Report endpoints

use std::sync::Arc;

use axum::{extract::State, response::Json};

use citizens::models::ImportId;

use crate::{
    api::{
        dto::{BirthdaysResponse, PercentileResponse, TownAgeStatsDto},
        extract::IdPath,
    },
    error::{ErrorResponse, ServerResult},
    state::AppState,
};

/// Presents per citizen for every month, counted from relatives' birthdays
#[utoipa::path(
    get,
    path = "/imports/{import_id}/citizens/birthdays",
    tag = "reports",
    params(("import_id" = u64, Path, description = "Import id")),
    responses(
        (status = 200, description = "Keys \"1\" to \"12\", one per month", body = BirthdaysResponse),
        (status = 404, description = "Import not found", body = ErrorResponse)
    )
)]
pub async fn birthdays(
    State(state): State<Arc<AppState>>,
    IdPath(import_id): IdPath<ImportId>,
) -> ServerResult<Json<BirthdaysResponse>> {
    let report = state.registry.birthdays(import_id).await?;
    Ok(Json(BirthdaysResponse::from(report)))
}

/// 50th, 75th and 99th age percentiles per town
#[utoipa::path(
    get,
    path = "/imports/{import_id}/towns/stat/percentile/age",
    tag = "reports",
    params(("import_id" = u64, Path, description = "Import id")),
    responses(
        (status = 200, description = "Towns in name order", body = PercentileResponse),
        (status = 404, description = "Import not found", body = ErrorResponse)
    )
)]
pub async fn age_percentiles(
    State(state): State<Arc<AppState>>,
    IdPath(import_id): IdPath<ImportId>,
) -> ServerResult<Json<PercentileResponse>> {
    let stats = state.registry.age_percentiles(import_id).await?;
    Ok(Json(PercentileResponse {
        data: stats.into_iter().map(TownAgeStatsDto::from).collect(),
    }))
}
