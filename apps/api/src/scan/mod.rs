//! Scan pipeline. Aggregates postings for a user, penalizes and scores each
//! one, and persists those at or above the user's threshold.
//!
//! Postings are scored with bounded concurrency. Every opportunity insert is
//! a single uniqueness-guarded write, so a scan stopped part-way (cancelled,
//! or failed on the store) leaves a consistent subset behind.

pub mod handlers;

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::learning::calculate_rejection_penalty;
use crate::models::opportunity::NewOpportunity;
use crate::models::posting::NormalizedPosting;
use crate::models::profile::UserProfile;
use crate::scoring::FitScorer;
use crate::skills::extraction::SkillExtractor;
use crate::skills::taxonomy::{demand_context, SkillDemand, DEMAND_CONTEXT_LIMIT};
use crate::skills::{extract_and_save_skills, PostingText};
use crate::sources::registry::SourceRegistry;
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    /// Postings scored at once.
    pub concurrency: usize,
    /// `limit` handed to every source.
    pub fetch_limit: usize,
    pub extract_skills: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanOutcome {
    pub added_count: usize,
    pub fetched_count: usize,
    pub scored_count: usize,
    pub skipped_count: usize,
    pub cancelled: bool,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("No profile for user {0}")]
    ProfileMissing(Uuid),

    #[error("Store failure after {added} opportunities were added: {source}")]
    Store {
        added: usize,
        #[source]
        source: sqlx::Error,
    },
}

impl ScanError {
    fn store(added: usize) -> impl FnOnce(sqlx::Error) -> ScanError {
        move |source| ScanError::Store { added, source }
    }
}

/// What happened to one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PostingOutcome {
    Added,
    BelowThreshold,
    Blocked,
    Duplicate,
    Cancelled,
    /// Not attempted because another posting already hit a store failure.
    Halted,
}

/// A store failure while handling one posting. `inserted` is set when the
/// opportunity row was already written before the failure.
#[derive(Debug)]
struct PostingFailure {
    inserted: bool,
    source: sqlx::Error,
}

impl PostingFailure {
    fn after_insert(source: sqlx::Error) -> Self {
        Self {
            inserted: true,
            source,
        }
    }
}

impl From<sqlx::Error> for PostingFailure {
    fn from(source: sqlx::Error) -> Self {
        Self {
            inserted: false,
            source,
        }
    }
}

pub struct ScanPipeline<'a, S: Store> {
    pub store: &'a S,
    pub registry: &'a SourceRegistry,
    pub scorer: &'a dyn FitScorer,
    pub extractor: &'a SkillExtractor,
    pub settings: ScanSettings,
}

impl<'a, S: Store> ScanPipeline<'a, S> {
    /// Runs one scan for `user_id`. Stops between postings once `cancel`
    /// reads `true`.
    pub async fn run_scan(
        &self,
        user_id: Uuid,
        cancel: &watch::Receiver<bool>,
    ) -> Result<ScanOutcome, ScanError> {
        let profile = self
            .store
            .get_profile(user_id)
            .await
            .map_err(ScanError::store(0))?
            .ok_or(ScanError::ProfileMissing(user_id))?;

        let terms = profile.search_terms();
        if terms.is_empty() {
            info!("Scan for {user_id}: profile has no skills or titles, nothing to search");
            return Ok(ScanOutcome::default());
        }

        info!("Scan started for {user_id} with {} search terms", terms.len());

        let postings = self
            .registry
            .fetch_from_all_sources(self.store, user_id, &terms, self.settings.fetch_limit)
            .await
            .map_err(ScanError::store(0))?;

        let mut outcome = ScanOutcome {
            fetched_count: postings.len(),
            ..Default::default()
        };

        let fresh = drop_stale(postings, profile.max_posting_age_days);
        outcome.skipped_count += outcome.fetched_count - fresh.len();

        let demand = demand_context(self.store, DEMAND_CONTEXT_LIMIT)
            .await
            .map_err(ScanError::store(0))?;

        // After a store failure, in-flight postings finish and new ones halt.
        let halted = AtomicBool::new(false);
        let mut failure = None;
        let mut results = stream::iter(fresh)
            .map(|posting| self.process_posting(&profile, &demand, posting, cancel, &halted))
            .buffer_unordered(self.settings.concurrency.max(1));

        while let Some(result) = results.next().await {
            match result {
                Ok(PostingOutcome::Added) => {
                    outcome.scored_count += 1;
                    outcome.added_count += 1;
                }
                Ok(PostingOutcome::BelowThreshold) => outcome.scored_count += 1,
                Ok(PostingOutcome::Blocked | PostingOutcome::Duplicate) => {
                    outcome.skipped_count += 1
                }
                Ok(PostingOutcome::Cancelled) => outcome.cancelled = true,
                Ok(PostingOutcome::Halted) => {}
                Err(PostingFailure { inserted, source }) => {
                    if inserted {
                        outcome.scored_count += 1;
                        outcome.added_count += 1;
                    }
                    halted.store(true, Ordering::SeqCst);
                    if failure.is_none() {
                        failure = Some(source);
                    } else {
                        warn!("Scan for {user_id}: further store failure: {source}");
                    }
                }
            }
        }

        if let Some(source) = failure {
            warn!(
                "Scan for {user_id} failed on the store after adding {}: {source}",
                outcome.added_count
            );
            return Err(ScanError::Store {
                added: outcome.added_count,
                source,
            });
        }

        info!(
            "Scan finished for {user_id}: added={} fetched={} scored={} skipped={} cancelled={}",
            outcome.added_count,
            outcome.fetched_count,
            outcome.scored_count,
            outcome.skipped_count,
            outcome.cancelled
        );
        Ok(outcome)
    }

    async fn process_posting(
        &self,
        profile: &UserProfile,
        demand: &[SkillDemand],
        posting: NormalizedPosting,
        cancel: &watch::Receiver<bool>,
        halted: &AtomicBool,
    ) -> Result<PostingOutcome, PostingFailure> {
        let cancelled = *cancel.borrow();
        if cancelled {
            return Ok(PostingOutcome::Cancelled);
        }
        if halted.load(Ordering::SeqCst) {
            return Ok(PostingOutcome::Halted);
        }
        let user_id = profile.user_id;

        if self.store.is_blocked(user_id, &posting.source_url).await? {
            debug!("Skipping blocked posting {}", posting.source_url);
            return Ok(PostingOutcome::Blocked);
        }
        if self
            .store
            .exists_active(user_id, &posting.source_url, &posting.title, &posting.company)
            .await?
        {
            debug!("Skipping known posting '{}' at {}", posting.title, posting.company);
            return Ok(PostingOutcome::Duplicate);
        }

        let penalty = calculate_rejection_penalty(self.store, user_id, &posting).await?;
        let score = self.scorer.score(profile, &posting, demand).await;
        let adjusted = adjusted_score(score.overall, penalty.rounded());

        if adjusted < profile.min_fit_score {
            debug!(
                "'{}' scored {adjusted} (raw {}, penalty {:.1}), below {}",
                posting.title, score.overall, penalty.total, profile.min_fit_score
            );
            return Ok(PostingOutcome::BelowThreshold);
        }

        let Some(opportunity) = self
            .store
            .insert(&NewOpportunity::from_posting(user_id, &posting, adjusted))
            .await?
        else {
            debug!("Posting {} was inserted concurrently", posting.source_url);
            return Ok(PostingOutcome::Duplicate);
        };

        let message = format!(
            "New match: {} at {} ({}%)",
            opportunity.title, opportunity.company, opportunity.fit_score
        );
        self.store
            .notify(user_id, &message, opportunity.id)
            .await
            .map_err(PostingFailure::after_insert)?;

        if self.settings.extract_skills {
            let saved = extract_and_save_skills(
                self.extractor,
                self.store,
                PostingText {
                    text: &posting.description,
                    title: &posting.title,
                    company: Some(&posting.company),
                    requirements: posting.requirements.as_deref(),
                    source_url: Some(&posting.source_url),
                },
            )
            .await
            .map_err(PostingFailure::after_insert)?;
            debug!(
                "Skills from '{}': {} new, {} updated",
                posting.title, saved.saved_count, saved.updated_count
            );
        }

        Ok(PostingOutcome::Added)
    }
}

/// Raw score minus the rounded penalty, clamped to `[0, 100]`.
pub fn adjusted_score(overall: u32, penalty: i32) -> i32 {
    (overall as i32 - penalty).clamp(0, 100)
}

/// Drops postings older than `max_age_days`. Undated postings are kept.
fn drop_stale(postings: Vec<NormalizedPosting>, max_age_days: i32) -> Vec<NormalizedPosting> {
    if max_age_days <= 0 {
        return postings;
    }
    let cutoff = Utc::now() - Duration::days(max_age_days as i64);
    postings
        .into_iter()
        .filter(|p| match p.posted_at {
            Some(at) if at < cutoff => {
                debug!("Skipping stale posting '{}' from {at}", p.title);
                false
            }
            _ => true,
        })
        .collect()
}
