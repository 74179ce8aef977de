//! Rejection pattern learning. An online, frequency-weighted rule that turns
//! rejected opportunities into a bounded penalty on future postings.
//!
//! Every point of penalty is traceable to a specific `rejection_patterns` row
//! via `PenaltyBreakdown::contributions`. Patterns never decay or expire.

pub mod handlers;

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::models::opportunity::Opportunity;
use crate::models::pattern::{PatternType, RejectionPattern};
use crate::models::posting::NormalizedPosting;
use crate::store::{PatternRepository, StoreResult};

/// Patterns seen fewer times than this are treated as noise.
pub const MIN_PATTERN_FREQUENCY: i32 = 2;
pub const MAX_PENALTY: f64 = 50.0;
/// Fit scores below this record a `LOW_SCORE_BAND` pattern.
pub const LOW_SCORE_THRESHOLD: i32 = 50;

const TITLE_KEYWORD_POINTS: f64 = 15.0;
const COMPANY_POINTS: f64 = 20.0;
const SOURCE_POINTS: f64 = 10.0;
const LOCATION_POINTS: f64 = 12.0;

/// Role words too common to say anything about why a posting was rejected.
const GENERIC_TITLE_WORDS: &[&str] = &[
    "senior", "junior", "lead", "principal", "staff", "engineer", "engineering", "developer",
    "manager", "specialist", "associate", "intern", "remote", "hybrid", "onsite", "full",
    "time", "part", "contract", "with", "team", "role", "position", "level", "based",
];

/// Non-generic keywords of a title: lowercased, punctuation stripped, split on
/// whitespace, words of three characters or fewer dropped, deduplicated in order.
pub fn title_keywords(title: &str) -> Vec<String> {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let mut seen = HashSet::new();
    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 3 && !GENERIC_TITLE_WORDS.contains(w))
        .filter(|w| seen.insert(w.to_string()))
        .map(str::to_string)
        .collect()
}

/// Decile label for a low fit score, e.g. 37 → "30".
pub fn score_band(fit_score: i32) -> String {
    ((fit_score.clamp(0, 100) / 10) * 10).to_string()
}

/// The fixed set of pattern candidates derived from one rejected opportunity.
pub fn derive_patterns(opportunity: &Opportunity) -> Vec<(PatternType, String)> {
    let mut candidates: Vec<(PatternType, String)> = title_keywords(&opportunity.title)
        .into_iter()
        .map(|kw| (PatternType::TitleKeyword, kw))
        .collect();

    if !opportunity.company.trim().is_empty() {
        candidates.push((PatternType::Company, opportunity.company.clone()));
    }
    if !opportunity.source_name.trim().is_empty() {
        candidates.push((PatternType::Source, opportunity.source_name.clone()));
    }
    if let Some(location) = opportunity.location.as_ref().filter(|l| !l.trim().is_empty()) {
        candidates.push((PatternType::Location, location.clone()));
    }
    if opportunity.fit_score < LOW_SCORE_THRESHOLD {
        candidates.push((PatternType::LowScoreBand, score_band(opportunity.fit_score)));
    }

    candidates
}

/// Records one rejection: each derived pattern's frequency grows by exactly one.
pub async fn learn_from_rejection(
    patterns: &dyn PatternRepository,
    user_id: Uuid,
    opportunity: &Opportunity,
) -> StoreResult<Vec<(PatternType, String)>> {
    let candidates = derive_patterns(opportunity);
    for (kind, value) in &candidates {
        let frequency = patterns.increment(user_id, *kind, value).await?;
        debug!("Rejection pattern {kind}={value} now at frequency {frequency}");
    }
    Ok(candidates)
}

/// One pattern's share of a penalty.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PenaltyContribution {
    pub pattern_type: PatternType,
    pub pattern_value: String,
    pub frequency: i32,
    pub points: f64,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PenaltyBreakdown {
    /// Sum of contributions, capped at `MAX_PENALTY`.
    pub total: f64,
    pub contributions: Vec<PenaltyContribution>,
}

impl PenaltyBreakdown {
    /// Whole points subtracted from a fit score.
    pub fn rounded(&self) -> i32 {
        self.total.round() as i32
    }
}

fn pattern_weight(frequency: i32) -> f64 {
    (frequency as f64 / 10.0).min(1.0)
}

/// Pure penalty computation over an already-loaded pattern set.
pub fn penalty_from_patterns(
    patterns: &[RejectionPattern],
    posting: &NormalizedPosting,
) -> PenaltyBreakdown {
    let keywords: HashSet<String> = title_keywords(&posting.title).into_iter().collect();
    let company = posting.company.trim();
    let source = posting.source_name.trim();
    let location = posting.location.as_deref().unwrap_or("").to_lowercase();

    let mut contributions = Vec::new();
    for pattern in patterns.iter().filter(|p| p.frequency >= MIN_PATTERN_FREQUENCY) {
        let value = pattern.pattern_value.trim();
        let base = match pattern.pattern_type {
            PatternType::TitleKeyword if keywords.contains(value) => TITLE_KEYWORD_POINTS,
            PatternType::Company if !value.is_empty() && value == company => COMPANY_POINTS,
            PatternType::Source if !value.is_empty() && value == source => SOURCE_POINTS,
            PatternType::Location
                if !value.is_empty() && location.contains(&value.to_lowercase()) =>
            {
                LOCATION_POINTS
            }
            _ => continue,
        };
        contributions.push(PenaltyContribution {
            pattern_type: pattern.pattern_type,
            pattern_value: pattern.pattern_value.clone(),
            frequency: pattern.frequency,
            points: base * pattern_weight(pattern.frequency),
        });
    }

    let total = contributions
        .iter()
        .map(|c| c.points)
        .sum::<f64>()
        .min(MAX_PENALTY);

    PenaltyBreakdown {
        total,
        contributions,
    }
}

/// Loads the user's non-noise patterns and computes the penalty for `posting`.
pub async fn calculate_rejection_penalty(
    patterns: &dyn PatternRepository,
    user_id: Uuid,
    posting: &NormalizedPosting,
) -> StoreResult<PenaltyBreakdown> {
    let rows = patterns.list(user_id, MIN_PATTERN_FREQUENCY).await?;
    Ok(penalty_from_patterns(&rows, posting))
}
