//! Fit scoring: how well a user profile matches one posting.
//!
//! `ReasoningFitScorer` asks the reasoning service and falls back to the
//! deterministic `heuristic` scorer on any failure. `HeuristicFitScorer` skips
//! the service entirely and is what runs when no API key is configured.
//!
//! `AppState` holds an `Arc<dyn FitScorer>`, chosen at startup from config.

pub mod heuristic;
pub mod prompts;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::prompts::{truncate_chars, MAX_POSTING_CHARS, UNTRUSTED_TEXT_INSTRUCTION};
use crate::llm_client::{complete_json, LlmError, Reasoner};
use crate::models::posting::NormalizedPosting;
use crate::models::profile::UserProfile;
use crate::scoring::prompts::{FIT_SCORE_PROMPT_TEMPLATE, FIT_SCORE_SYSTEM};
use crate::skills::taxonomy::SkillDemand;

pub const BACKEND_REASONING: &str = "reasoning";
pub const BACKEND_HEURISTIC: &str = "heuristic";

/// Multi-dimensional match score. Every numeric field is in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitScore {
    pub overall: u32,
    pub skill_match: u32,
    pub experience_match: u32,
    pub seniority_match: u32,
    pub title_match: u32,
    pub industry_match: u32,
    pub location_match: u32,
    pub reasoning: String,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub recommendations: Vec<String>,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    /// "reasoning" or "heuristic"
    pub scorer_backend: String,
}

/// The six weighted dimensions behind `overall`.
#[derive(Debug, Clone, Copy)]
pub struct FitDimensions {
    pub skill_match: u32,
    pub experience_match: u32,
    pub seniority_match: u32,
    pub title_match: u32,
    pub industry_match: u32,
    pub location_match: u32,
}

impl FitDimensions {
    /// skill 0.30 + experience 0.20 + seniority 0.10 + title 0.30 + industry 0.05 + location 0.05
    pub fn weighted_overall(&self) -> u32 {
        let total = 0.30 * self.skill_match as f64
            + 0.20 * self.experience_match as f64
            + 0.10 * self.seniority_match as f64
            + 0.30 * self.title_match as f64
            + 0.05 * self.industry_match as f64
            + 0.05 * self.location_match as f64;
        (total.round() as u32).min(100)
    }
}

/// The fit scorer trait. Implementations never fail: a scorer that cannot
/// reach its backend degrades to the heuristic.
#[async_trait]
pub trait FitScorer: Send + Sync {
    async fn score(
        &self,
        profile: &UserProfile,
        posting: &NormalizedPosting,
        demand: &[SkillDemand],
    ) -> FitScore;
}

/// Pure-Rust heuristic scorer. Fast, deterministic, no network call.
pub struct HeuristicFitScorer;

#[async_trait]
impl FitScorer for HeuristicFitScorer {
    async fn score(
        &self,
        profile: &UserProfile,
        posting: &NormalizedPosting,
        _demand: &[SkillDemand],
    ) -> FitScore {
        heuristic::score(profile, posting)
    }
}

/// Reasoning-service scorer with heuristic fallback.
pub struct ReasoningFitScorer {
    reasoner: Arc<dyn Reasoner>,
}

impl ReasoningFitScorer {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl FitScorer for ReasoningFitScorer {
    async fn score(
        &self,
        profile: &UserProfile,
        posting: &NormalizedPosting,
        demand: &[SkillDemand],
    ) -> FitScore {
        let prompt = build_fit_prompt(profile, posting, demand);
        let result = complete_json::<RawFitScore>(self.reasoner.as_ref(), &prompt, FIT_SCORE_SYSTEM)
            .await
            .and_then(RawFitScore::validate);

        match result {
            Ok(score) => score,
            Err(e) => {
                warn!(
                    "Reasoning fit score failed for '{}' ({}), using heuristic: {e}",
                    posting.title, posting.source_url
                );
                heuristic::score(profile, posting)
            }
        }
    }
}

/// Loose shape of the service reply. `validate` turns it into a `FitScore`.
#[derive(Debug, Deserialize)]
struct RawFitScore {
    overall: Option<f64>,
    #[serde(alias = "skillMatch")]
    skill_match: Option<f64>,
    #[serde(alias = "experienceMatch")]
    experience_match: Option<f64>,
    #[serde(alias = "seniorityMatch")]
    seniority_match: Option<f64>,
    #[serde(alias = "titleMatch")]
    title_match: Option<f64>,
    #[serde(alias = "industryMatch")]
    industry_match: Option<f64>,
    #[serde(alias = "locationMatch")]
    location_match: Option<f64>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default, alias = "matchedSkills")]
    matched_skills: Option<Vec<String>>,
    #[serde(default, alias = "missingSkills")]
    missing_skills: Option<Vec<String>>,
    #[serde(default)]
    recommendations: Option<Vec<String>>,
    #[serde(default)]
    strengths: Option<Vec<String>>,
    #[serde(default)]
    concerns: Option<Vec<String>>,
}

fn clamp_score(field: &str, value: Option<f64>) -> Result<u32, LlmError> {
    match value {
        Some(v) if v.is_finite() => Ok(v.round().clamp(0.0, 100.0) as u32),
        Some(_) => Err(LlmError::Schema(format!("{field} is not a finite number"))),
        None => Err(LlmError::Schema(format!("{field} is missing"))),
    }
}

impl RawFitScore {
    /// Every numeric field is required and clamped to `[0, 100]`; missing
    /// arrays become empty.
    fn validate(self) -> Result<FitScore, LlmError> {
        Ok(FitScore {
            overall: clamp_score("overall", self.overall)?,
            skill_match: clamp_score("skill_match", self.skill_match)?,
            experience_match: clamp_score("experience_match", self.experience_match)?,
            seniority_match: clamp_score("seniority_match", self.seniority_match)?,
            title_match: clamp_score("title_match", self.title_match)?,
            industry_match: clamp_score("industry_match", self.industry_match)?,
            location_match: clamp_score("location_match", self.location_match)?,
            reasoning: self.reasoning.unwrap_or_default(),
            matched_skills: self.matched_skills.unwrap_or_default(),
            missing_skills: self.missing_skills.unwrap_or_default(),
            recommendations: self.recommendations.unwrap_or_default(),
            strengths: self.strengths.unwrap_or_default(),
            concerns: self.concerns.unwrap_or_default(),
            scorer_backend: BACKEND_REASONING.to_string(),
        })
    }
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".to_string()
    } else {
        items.join(", ")
    }
}

fn render_profile(profile: &UserProfile) -> String {
    let mut out = String::new();
    out.push_str(&format!("Primary skills: {}\n", list_or_none(&profile.primary_skills)));
    out.push_str(&format!("Secondary skills: {}\n", list_or_none(&profile.secondary_skills)));
    out.push_str(&format!("Currently learning: {}\n", list_or_none(&profile.learning_skills)));
    out.push_str(&format!(
        "Years of experience: {}\n",
        profile
            .years_of_experience
            .map(|y| y.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    ));
    out.push_str(&format!(
        "Seniority: {}\n",
        profile.seniority_level.as_deref().unwrap_or("unknown")
    ));
    out.push_str(&format!("Preferred titles: {}\n", list_or_none(&profile.preferred_titles)));
    out.push_str(&format!("Industries: {}\n", list_or_none(&profile.industries)));
    out.push_str(&format!(
        "Work location preference: {}\n",
        profile.work_location_preference.as_deref().unwrap_or("any")
    ));
    if !profile.work_history.is_empty() {
        out.push_str("Work history:\n");
        for entry in &profile.work_history {
            out.push_str(&format!(
                "- {}{}{}\n",
                entry.title,
                entry
                    .company
                    .as_deref()
                    .map(|c| format!(" at {c}"))
                    .unwrap_or_default(),
                entry.years.map(|y| format!(" ({y} yrs)")).unwrap_or_default()
            ));
        }
    }
    out
}

fn render_posting(posting: &NormalizedPosting) -> String {
    let mut out = format!("Title: {}\nCompany: {}\n", posting.title, posting.company);
    if let Some(location) = &posting.location {
        out.push_str(&format!("Location: {location}\n"));
    }
    if let Some(salary) = &posting.salary {
        out.push_str(&format!("Salary: {salary}\n"));
    }
    out.push_str(&format!(
        "Description:\n{}\n",
        truncate_chars(&posting.description, MAX_POSTING_CHARS)
    ));
    if let Some(req) = &posting.requirements {
        out.push_str(&format!(
            "Requirements:\n{}\n",
            truncate_chars(req, MAX_POSTING_CHARS / 2)
        ));
    }
    out
}

fn render_demand(demand: &[SkillDemand]) -> String {
    if demand.is_empty() {
        return "(no skill demand data yet)".to_string();
    }
    demand
        .iter()
        .map(|d| format!("- {} ({} postings, {})", d.name, d.frequency, d.trend))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_fit_prompt(
    profile: &UserProfile,
    posting: &NormalizedPosting,
    demand: &[SkillDemand],
) -> String {
    FIT_SCORE_PROMPT_TEMPLATE
        .replace("{profile}", &render_profile(profile))
        .replace("{demand}", &render_demand(demand))
        .replace("{untrusted}", UNTRUSTED_TEXT_INSTRUCTION)
        .replace("{posting}", &render_posting(posting))
}
