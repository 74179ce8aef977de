use axum::{extract::State, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::scan::{ScanOutcome, ScanPipeline};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ScanRequest {
    pub user_id: Uuid,
}

/// POST /api/v1/scan
pub async fn handle_scan(
    State(state): State<AppState>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ScanOutcome>, AppError> {
    let pipeline = ScanPipeline {
        store: state.store.as_ref(),
        registry: state.sources.as_ref(),
        scorer: state.fit_scorer.as_ref(),
        extractor: &state.skill_extractor,
        settings: state.config.scan_settings(),
    };
    let outcome = pipeline.run_scan(req.user_id, &state.shutdown).await?;
    Ok(Json(outcome))
}
