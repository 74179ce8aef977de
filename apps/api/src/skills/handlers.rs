use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::skill::Skill;
use crate::skills::taxonomy::{
    match_user_skills, search_skills, skill_stats, update_trends, SaveSummary, SkillMatch,
    SkillStats,
};
use crate::skills::{extract_and_save_skills, PostingText};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub text: String,
    pub title: String,
    pub company: Option<String>,
    pub requirements: Option<String>,
    pub source_url: Option<String>,
}

/// POST /api/v1/skills/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<SaveSummary>, AppError> {
    if req.title.trim().is_empty() || req.text.trim().is_empty() {
        return Err(AppError::Validation("title and text are required".into()));
    }
    let summary = extract_and_save_skills(
        &state.skill_extractor,
        state.store.as_ref(),
        PostingText {
            text: &req.text,
            title: &req.title,
            company: req.company.as_deref(),
            requirements: req.requirements.as_deref(),
            source_url: req.source_url.as_deref(),
        },
    )
    .await?;
    Ok(Json(summary))
}

/// GET /api/v1/skills/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<SkillStats>, AppError> {
    Ok(Json(skill_stats(state.store.as_ref()).await?))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub category: Option<String>,
}

/// GET /api/v1/skills/search
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let skills =
        search_skills(state.store.as_ref(), &params.query, params.category.as_deref()).await?;
    Ok(Json(skills))
}

#[derive(Deserialize)]
pub struct MatchRequest {
    pub skills: Vec<String>,
}

/// POST /api/v1/skills/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<SkillMatch>, AppError> {
    Ok(Json(match_user_skills(state.store.as_ref(), &req.skills).await?))
}

#[derive(Serialize)]
pub struct TrendRefreshResponse {
    pub changed_count: usize,
}

/// POST /api/v1/skills/trends/refresh
pub async fn handle_refresh_trends(
    State(state): State<AppState>,
) -> Result<Json<TrendRefreshResponse>, AppError> {
    let changed_count = update_trends(state.store.as_ref(), Utc::now()).await?;
    Ok(Json(TrendRefreshResponse { changed_count }))
}
