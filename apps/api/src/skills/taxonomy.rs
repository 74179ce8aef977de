//! Skill catalog maintenance: saving extractions, demand trends, stats,
//! search, and matching a user's skills against the catalog.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::skill::{normalize_skill_name, DemandTrend, NewSighting, Skill, SkillUpsert};
use crate::skills::extraction::ExtractedSkill;
use crate::store::{SkillRepository, StoreResult};

/// Trailing window length for trend comparison.
pub const TREND_WINDOW_DAYS: i64 = 30;
const RISING_RATIO: f64 = 1.2;
const DECLINING_RATIO: f64 = 0.8;
/// Recent sightings needed to call a skill rising when the prior window is empty.
const NEW_SKILL_RISING_COUNT: i64 = 5;

/// Minimum frequency for a skill to be recommended.
pub const RECOMMEND_MIN_FREQUENCY: i32 = 5;
const RECOMMEND_LIMIT: usize = 10;
const TOP_SKILLS_LIMIT: usize = 20;
const SEARCH_LIMIT: usize = 50;
pub const DEMAND_CONTEXT_LIMIT: usize = 15;

/// Skills extracted from one posting, with the posting they came from.
#[derive(Debug, Clone)]
pub struct SkillExtractionResult {
    pub job_title: String,
    pub company: Option<String>,
    pub source_url: Option<String>,
    pub skills: Vec<ExtractedSkill>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SaveSummary {
    pub saved_count: usize,
    pub updated_count: usize,
}

/// Demand hint fed into the fit-scoring prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDemand {
    pub name: String,
    pub category: String,
    pub frequency: i32,
    pub trend: DemandTrend,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillMatch {
    pub matched: Vec<Skill>,
    pub recommended: Vec<Skill>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkillStats {
    pub total_skills: usize,
    pub total_sightings: i64,
    pub by_category: BTreeMap<String, usize>,
    pub top_skills: Vec<Skill>,
    pub rising_skills: Vec<Skill>,
}

/// Upserts every extracted skill and appends one sighting per skill.
///
/// Skills repeated within one extraction count once.
pub async fn save_skills(
    repo: &dyn SkillRepository,
    result: &SkillExtractionResult,
    now: DateTime<Utc>,
) -> StoreResult<SaveSummary> {
    let mut summary = SaveSummary::default();
    let mut seen = HashSet::new();

    for extracted in &result.skills {
        let normalized_name = normalize_skill_name(&extracted.name);
        if normalized_name.is_empty() || !seen.insert(normalized_name.clone()) {
            continue;
        }

        let upserted = repo
            .upsert(&SkillUpsert {
                name: extracted.name.trim().to_string(),
                normalized_name,
                category: extracted.category.clone(),
                subcategory: extracted.subcategory.clone(),
                aliases: extracted.aliases.clone(),
                seen_at: now,
            })
            .await?;

        repo.append_sighting(&NewSighting {
            skill_id: upserted.skill.id,
            job_title: result.job_title.clone(),
            company: result.company.clone(),
            source_url: result.source_url.clone(),
            is_required: extracted.is_required,
            proficiency_level: extracted.proficiency_level.clone(),
            years_required: extracted.years_required,
            extracted_at: now,
        })
        .await?;

        if upserted.created {
            summary.saved_count += 1;
        } else {
            summary.updated_count += 1;
        }
    }

    Ok(summary)
}

/// Trend from sighting counts in the recent and the preceding window.
pub fn classify_trend(recent: i64, previous: i64, current: DemandTrend) -> DemandTrend {
    if previous >= 1 {
        let ratio = recent as f64 / previous as f64;
        if ratio > RISING_RATIO {
            DemandTrend::Rising
        } else if ratio < DECLINING_RATIO {
            DemandTrend::Declining
        } else {
            DemandTrend::Stable
        }
    } else if recent > NEW_SKILL_RISING_COUNT {
        DemandTrend::Rising
    } else {
        current
    }
}

/// Recomputes every skill's trend. Returns how many trends changed.
pub async fn update_trends(repo: &dyn SkillRepository, now: DateTime<Utc>) -> StoreResult<usize> {
    let recent_from = now - Duration::days(TREND_WINDOW_DAYS);
    let previous_from = now - Duration::days(TREND_WINDOW_DAYS * 2);

    let windows = repo.sighting_windows(previous_from, recent_from).await?;
    let mut changed = 0;
    for window in &windows {
        let trend = classify_trend(window.recent, window.previous, window.current_trend);
        if trend != window.current_trend {
            repo.set_trend(window.skill_id, trend).await?;
            changed += 1;
        }
    }

    info!(
        "Skill trends updated: {changed} of {} skills changed",
        windows.len()
    );
    Ok(changed)
}

/// Splits the catalog into skills the user has and in-demand skills they lack.
pub async fn match_user_skills(
    repo: &dyn SkillRepository,
    user_skills: &[String],
) -> StoreResult<SkillMatch> {
    let wanted: HashSet<String> = user_skills
        .iter()
        .map(|s| normalize_skill_name(s))
        .filter(|s| !s.is_empty())
        .collect();

    let (matched, others): (Vec<Skill>, Vec<Skill>) = repo
        .list_all()
        .await?
        .into_iter()
        .partition(|skill| wanted.iter().any(|term| skill.answers_to(term)));

    let recommended = others
        .into_iter()
        .filter(|s| s.frequency >= RECOMMEND_MIN_FREQUENCY)
        .take(RECOMMEND_LIMIT)
        .collect();

    Ok(SkillMatch {
        matched,
        recommended,
    })
}

pub async fn skill_stats(repo: &dyn SkillRepository) -> StoreResult<SkillStats> {
    let skills = repo.list_all().await?;
    let total_sightings = repo.total_sightings().await?;

    let mut by_category = BTreeMap::new();
    for skill in &skills {
        *by_category.entry(skill.category.clone()).or_insert(0) += 1;
    }

    let rising_skills = skills
        .iter()
        .filter(|s| s.demand_trend == DemandTrend::Rising)
        .cloned()
        .collect();

    Ok(SkillStats {
        total_skills: skills.len(),
        total_sightings,
        by_category,
        top_skills: skills.iter().take(TOP_SKILLS_LIMIT).cloned().collect(),
        rising_skills,
    })
}

/// Case-insensitive substring search over name, normalized name and aliases.
pub async fn search_skills(
    repo: &dyn SkillRepository,
    query: &str,
    category: Option<&str>,
) -> StoreResult<Vec<Skill>> {
    let needle = query.trim().to_lowercase();
    let category = category.map(str::trim).filter(|c| !c.is_empty());

    Ok(repo
        .list_all()
        .await?
        .into_iter()
        .filter(|s| category.map_or(true, |c| s.category == c))
        .filter(|s| {
            s.name.to_lowercase().contains(&needle)
                || s.normalized_name.contains(&needle)
                || s.aliases.iter().any(|a| a.to_lowercase().contains(&needle))
        })
        .take(SEARCH_LIMIT)
        .collect())
}

/// The most frequent skills, for the scoring prompt.
pub async fn demand_context(
    repo: &dyn SkillRepository,
    limit: usize,
) -> StoreResult<Vec<SkillDemand>> {
    Ok(repo
        .list_all()
        .await?
        .into_iter()
        .take(limit)
        .map(|s| SkillDemand {
            name: s.name,
            category: s.category,
            frequency: s.frequency,
            trend: s.demand_trend,
        })
        .collect())
}
