use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::opportunity::Opportunity;
use crate::opportunities::{reject_opportunity, RejectOutcome};
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::store::OpportunityRepository;

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub forever: bool,
}

/// GET /api/v1/opportunities?user_id=
pub async fn handle_list_opportunities(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Opportunity>>, AppError> {
    Ok(Json(state.store.list_active(params.user_id).await?))
}

/// POST /api/v1/opportunities/:id/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<RejectOutcome>, AppError> {
    let outcome = reject_opportunity(state.store.as_ref(), req.user_id, id, req.forever)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Opportunity {id} not found")))?;
    Ok(Json(outcome))
}

/// DELETE /api/v1/opportunities/:id?user_id=
pub async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete(params.user_id, id).await? {
        return Err(AppError::NotFound(format!("Opportunity {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
