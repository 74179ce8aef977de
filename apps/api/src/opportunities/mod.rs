//! User actions on persisted opportunities. Rejecting one is what feeds the
//! learning engine.

pub mod handlers;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::learning::learn_from_rejection;
use crate::models::pattern::PatternType;
use crate::store::{OpportunityRepository, PatternRepository, StoreResult};

#[derive(Debug, Clone, Serialize)]
pub struct LearnedPattern {
    pub pattern_type: PatternType,
    pub pattern_value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectOutcome {
    pub archived: bool,
    pub blocked: bool,
    pub learned: Vec<LearnedPattern>,
}

/// Archives the opportunity, blocks its URL when `forever`, and learns from it.
/// `None` when the user has no such opportunity.
pub async fn reject_opportunity<S>(
    store: &S,
    user_id: Uuid,
    id: Uuid,
    forever: bool,
) -> StoreResult<Option<RejectOutcome>>
where
    S: OpportunityRepository + PatternRepository,
{
    let Some(opportunity) = store.get(user_id, id).await? else {
        return Ok(None);
    };

    let archived = store.archive(user_id, id).await?;
    if forever {
        store.block(user_id, &opportunity.source_url).await?;
    }
    let learned = learn_from_rejection(store, user_id, &opportunity).await?;

    info!(
        "User {user_id} rejected '{}' at {} (forever={forever}, {} patterns)",
        opportunity.title,
        opportunity.company,
        learned.len()
    );

    Ok(Some(RejectOutcome {
        archived,
        blocked: forever,
        learned: learned
            .into_iter()
            .map(|(pattern_type, pattern_value)| LearnedPattern {
                pattern_type,
                pattern_value,
            })
            .collect(),
    }))
}
