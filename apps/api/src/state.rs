use std::sync::Arc;

use tokio::sync::watch;

use crate::config::Config;
use crate::scoring::FitScorer;
use crate::skills::extraction::SkillExtractor;
use crate::sources::registry::SourceRegistry;
use crate::store::PgStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<PgStore>,
    pub config: Config,
    /// Reasoning scorer when a credential is configured, heuristic otherwise.
    pub fit_scorer: Arc<dyn FitScorer>,
    pub skill_extractor: SkillExtractor,
    pub sources: Arc<SourceRegistry>,
    /// Flips to `true` on shutdown; running scans stop before their next posting.
    pub shutdown: watch::Receiver<bool>,
}
