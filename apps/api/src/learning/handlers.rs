use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::models::pattern::RejectionPattern;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::store::PatternRepository;

/// GET /api/v1/patterns?user_id=
/// Every learned pattern, including single sightings that carry no penalty yet.
pub async fn handle_list_patterns(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<RejectionPattern>>, AppError> {
    Ok(Json(state.store.list(params.user_id, 1).await?))
}
