use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkHistoryEntry {
    pub title: String,
    pub company: Option<String>,
    pub years: Option<f32>,
}

/// The user's matching profile. Read-only input to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub primary_skills: Vec<String>,
    pub secondary_skills: Vec<String>,
    pub learning_skills: Vec<String>,
    pub years_of_experience: Option<i32>,
    /// junior | mid | senior | lead | principal | staff
    pub seniority_level: Option<String>,
    #[sqlx(json)]
    pub work_history: Vec<WorkHistoryEntry>,
    pub preferred_titles: Vec<String>,
    pub industries: Vec<String>,
    /// remote | hybrid | onsite
    pub work_location_preference: Option<String>,
    pub min_fit_score: i32,
    pub max_posting_age_days: i32,
}

pub const DEFAULT_MIN_FIT_SCORE: i32 = 60;
pub const DEFAULT_MAX_POSTING_AGE_DAYS: i32 = 30;

impl UserProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            primary_skills: vec![],
            secondary_skills: vec![],
            learning_skills: vec![],
            years_of_experience: None,
            seniority_level: None,
            work_history: vec![],
            preferred_titles: vec![],
            industries: vec![],
            work_location_preference: None,
            min_fit_score: DEFAULT_MIN_FIT_SCORE,
            max_posting_age_days: DEFAULT_MAX_POSTING_AGE_DAYS,
        }
    }

    /// Primary then secondary skills, case-insensitively deduplicated.
    /// Learning skills are excluded: they are not claimed competencies.
    pub fn combined_skills(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.primary_skills
            .iter()
            .chain(self.secondary_skills.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    /// Search terms handed to the sources: the combined skills, or the
    /// preferred titles when no skills are declared.
    pub fn search_terms(&self) -> Vec<String> {
        let skills = self.combined_skills();
        if !skills.is_empty() {
            return skills;
        }
        self.preferred_titles
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_skills_dedupes_case_insensitively() {
        let mut profile = UserProfile::empty(Uuid::new_v4());
        profile.primary_skills = vec!["Python".into(), "AWS".into()];
        profile.secondary_skills = vec!["python".into(), " Docker ".into(), "".into()];
        profile.learning_skills = vec!["Rust".into()];
        assert_eq!(profile.combined_skills(), vec!["Python", "AWS", "Docker"]);
    }

    #[test]
    fn test_search_terms_fall_back_to_titles() {
        let mut profile = UserProfile::empty(Uuid::new_v4());
        profile.preferred_titles = vec!["Platform Engineer".into()];
        assert_eq!(profile.search_terms(), vec!["Platform Engineer"]);
    }
}
