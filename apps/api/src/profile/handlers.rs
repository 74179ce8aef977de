use axum::{
    extract::{Query, State},
    Json,
};

use crate::errors::AppError;
use crate::models::profile::UserProfile;
use crate::profile::ProfileInput;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::store::ProfileRepository;

/// GET /api/v1/profile?user_id=
/// Users without a stored profile get the empty default.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = state
        .store
        .get_profile(params.user_id)
        .await?
        .unwrap_or_else(|| UserProfile::empty(params.user_id));
    Ok(Json(profile))
}

/// PUT /api/v1/profile?user_id=
pub async fn handle_put_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = input
        .into_profile(params.user_id)
        .map_err(AppError::Validation)?;
    Ok(Json(state.store.upsert_profile(&profile).await?))
}
