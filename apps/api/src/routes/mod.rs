pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::learning::handlers as learning;
use crate::opportunities::handlers as opportunities;
use crate::profile::handlers as profile;
use crate::scan::handlers as scan;
use crate::skills::handlers as skills;
use crate::sources::handlers as sources;
use crate::state::AppState;

/// `?user_id=` on every per-user read.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Pipeline
        .route("/api/v1/scan", post(scan::handle_scan))
        .route(
            "/api/v1/opportunities",
            get(opportunities::handle_list_opportunities),
        )
        .route(
            "/api/v1/opportunities/:id/reject",
            post(opportunities::handle_reject),
        )
        .route(
            "/api/v1/opportunities/:id",
            delete(opportunities::handle_delete),
        )
        .route("/api/v1/patterns", get(learning::handle_list_patterns))
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile).put(profile::handle_put_profile),
        )
        // Sources
        .route(
            "/api/v1/sources",
            get(sources::handle_list_sources).post(sources::handle_create_source),
        )
        .route("/api/v1/sources/health", get(sources::handle_source_health))
        .route("/api/v1/sources/:id", patch(sources::handle_toggle_source))
        // Skill taxonomy
        .route("/api/v1/skills/extract", post(skills::handle_extract))
        .route("/api/v1/skills/stats", get(skills::handle_stats))
        .route("/api/v1/skills/search", get(skills::handle_search))
        .route("/api/v1/skills/match", post(skills::handle_match))
        .route(
            "/api/v1/skills/trends/refresh",
            post(skills::handle_refresh_trends),
        )
        .with_state(state)
}
