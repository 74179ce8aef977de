use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::source::{NewSourceDescriptor, SourceDescriptor};
use crate::routes::UserIdQuery;
use crate::sources::registry::SourceHealth;
use crate::state::AppState;
use crate::store::SourceRepository;

#[derive(Serialize)]
pub struct SourceListResponse {
    pub builtin: Vec<String>,
    pub custom: Vec<SourceDescriptor>,
}

/// GET /api/v1/sources
pub async fn handle_list_sources(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<SourceListResponse>, AppError> {
    let custom = state.store.list_sources(params.user_id).await?;
    Ok(Json(SourceListResponse {
        builtin: state.sources.builtin_names(),
        custom,
    }))
}

/// POST /api/v1/sources
pub async fn handle_create_source(
    State(state): State<AppState>,
    Json(req): Json<NewSourceDescriptor>,
) -> Result<(StatusCode, Json<SourceDescriptor>), AppError> {
    req.validate().map_err(AppError::Validation)?;
    let created = state.store.create_source(&req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Deserialize)]
pub struct SourceToggle {
    pub user_id: Uuid,
    pub enabled: bool,
}

/// PATCH /api/v1/sources/:id
pub async fn handle_toggle_source(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SourceToggle>,
) -> Result<Json<SourceDescriptor>, AppError> {
    let updated = state
        .store
        .set_source_enabled(req.user_id, id, req.enabled)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Source {id} not found")))?;
    Ok(Json(updated))
}

/// GET /api/v1/sources/health
pub async fn handle_source_health(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<SourceHealth>>, AppError> {
    let report = state
        .sources
        .health_report(state.store.as_ref(), params.user_id)
        .await?;
    Ok(Json(report))
}
