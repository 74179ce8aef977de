//! Profile edits. The pipeline only ever reads the result.

pub mod handlers;

use serde::Deserialize;
use uuid::Uuid;

use crate::models::profile::{
    UserProfile, WorkHistoryEntry, DEFAULT_MAX_POSTING_AGE_DAYS, DEFAULT_MIN_FIT_SCORE,
};

const SENIORITY_LEVELS: &[&str] = &["junior", "mid", "senior", "lead", "principal", "staff"];
const LOCATION_PREFERENCES: &[&str] = &["remote", "hybrid", "onsite"];
const MAX_YEARS_OF_EXPERIENCE: i32 = 80;

/// Body of `PUT /api/v1/profile`. Omitted fields take their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProfileInput {
    pub primary_skills: Vec<String>,
    pub secondary_skills: Vec<String>,
    pub learning_skills: Vec<String>,
    pub years_of_experience: Option<i32>,
    pub seniority_level: Option<String>,
    pub work_history: Vec<WorkHistoryEntry>,
    pub preferred_titles: Vec<String>,
    pub industries: Vec<String>,
    pub work_location_preference: Option<String>,
    pub min_fit_score: Option<i32>,
    pub max_posting_age_days: Option<i32>,
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn clean_choice(
    field: &str,
    value: Option<String>,
    allowed: &[&str],
) -> Result<Option<String>, String> {
    let Some(value) = value.map(|v| v.trim().to_lowercase()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if allowed.contains(&value.as_str()) {
        Ok(Some(value))
    } else {
        Err(format!("{field} must be one of: {}", allowed.join(", ")))
    }
}

impl ProfileInput {
    /// Validates the input and builds the full profile for `user_id`.
    pub fn into_profile(self, user_id: Uuid) -> Result<UserProfile, String> {
        let min_fit_score = self.min_fit_score.unwrap_or(DEFAULT_MIN_FIT_SCORE);
        if !(0..=100).contains(&min_fit_score) {
            return Err("min_fit_score must be between 0 and 100".into());
        }
        let max_posting_age_days = self
            .max_posting_age_days
            .unwrap_or(DEFAULT_MAX_POSTING_AGE_DAYS);
        if max_posting_age_days < 1 {
            return Err("max_posting_age_days must be at least 1".into());
        }
        if self
            .years_of_experience
            .is_some_and(|y| !(0..=MAX_YEARS_OF_EXPERIENCE).contains(&y))
        {
            return Err(format!(
                "years_of_experience must be between 0 and {MAX_YEARS_OF_EXPERIENCE}"
            ));
        }

        Ok(UserProfile {
            user_id,
            primary_skills: clean_list(self.primary_skills),
            secondary_skills: clean_list(self.secondary_skills),
            learning_skills: clean_list(self.learning_skills),
            years_of_experience: self.years_of_experience,
            seniority_level: clean_choice("seniority_level", self.seniority_level, SENIORITY_LEVELS)?,
            work_history: self
                .work_history
                .into_iter()
                .filter(|w| !w.title.trim().is_empty())
                .collect(),
            preferred_titles: clean_list(self.preferred_titles),
            industries: clean_list(self.industries),
            work_location_preference: clean_choice(
                "work_location_preference",
                self.work_location_preference,
                LOCATION_PREFERENCES,
            )?,
            min_fit_score,
            max_posting_age_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_omitted_thresholds() {
        let input: ProfileInput = serde_json::from_str(r#"{"primary_skills":[" Rust ",""]}"#).unwrap();
        let profile = input.into_profile(Uuid::nil()).unwrap();
        assert_eq!(profile.primary_skills, vec!["Rust"]);
        assert_eq!(profile.min_fit_score, DEFAULT_MIN_FIT_SCORE);
        assert_eq!(profile.max_posting_age_days, DEFAULT_MAX_POSTING_AGE_DAYS);
    }

    #[test]
    fn test_threshold_bounds_are_enforced() {
        let too_high = ProfileInput {
            min_fit_score: Some(101),
            ..Default::default()
        };
        assert!(too_high.into_profile(Uuid::nil()).is_err());

        let zero_age = ProfileInput {
            max_posting_age_days: Some(0),
            ..Default::default()
        };
        assert!(zero_age.into_profile(Uuid::nil()).is_err());

        let edge = ProfileInput {
            min_fit_score: Some(100),
            max_posting_age_days: Some(1),
            ..Default::default()
        };
        assert!(edge.into_profile(Uuid::nil()).is_ok());
    }

    #[test]
    fn test_years_of_experience_is_bounded() {
        let huge = ProfileInput {
            years_of_experience: Some(500_000_000),
            ..Default::default()
        };
        assert!(huge.into_profile(Uuid::nil()).is_err());

        let most = ProfileInput {
            years_of_experience: Some(MAX_YEARS_OF_EXPERIENCE),
            ..Default::default()
        };
        assert!(most.into_profile(Uuid::nil()).is_ok());
    }

    #[test]
    fn test_choices_are_normalized_or_rejected() {
        let input = ProfileInput {
            seniority_level: Some(" Senior ".into()),
            work_location_preference: Some("REMOTE".into()),
            ..Default::default()
        };
        let profile = input.into_profile(Uuid::nil()).unwrap();
        assert_eq!(profile.seniority_level.as_deref(), Some("senior"));
        assert_eq!(profile.work_location_preference.as_deref(), Some("remote"));

        let bad = ProfileInput {
            seniority_level: Some("wizard".into()),
            ..Default::default()
        };
        assert!(bad.into_profile(Uuid::nil()).unwrap_err().contains("seniority_level"));
    }
}
