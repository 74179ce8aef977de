use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job listing as returned by a source, normalized to a common shape.
/// Produced fresh on every aggregation run; never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosting {
    pub title: String,
    pub company: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub posted_at: Option<DateTime<Utc>>,
}

impl NormalizedPosting {
    /// Lowercased title, description and requirements, used by every substring heuristic.
    pub fn searchable_text(&self) -> String {
        let mut text = format!("{} {}", self.title, self.description);
        if let Some(req) = &self.requirements {
            text.push(' ');
            text.push_str(req);
        }
        text.to_lowercase()
    }

    /// True when the lowercased `title + description` contains any of `skills`.
    pub fn mentions_any(&self, skills: &[String]) -> bool {
        let haystack = format!("{} {}", self.title, self.description).to_lowercase();
        skills
            .iter()
            .map(|s| s.trim().to_lowercase())
            .any(|s| !s.is_empty() && haystack.contains(&s))
    }

    /// A posting without a title or link cannot be deduplicated or shown.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty() && !self.source_url.trim().is_empty()
    }
}

#[cfg(test)]
pub fn sample_posting(title: &str, company: &str, description: &str) -> NormalizedPosting {
    NormalizedPosting {
        title: title.to_string(),
        company: company.to_string(),
        description: description.to_string(),
        requirements: None,
        location: None,
        salary: None,
        source_url: format!(
            "https://jobs.example.com/{}",
            title.to_lowercase().replace(' ', "-")
        ),
        source_name: "Example".to_string(),
        posted_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_any_is_case_insensitive() {
        let posting = sample_posting("Backend Engineer", "Acme", "We use PostgreSQL and Rust");
        assert!(posting.mentions_any(&["rust".to_string()]));
        assert!(posting.mentions_any(&["POSTGRESQL".to_string()]));
        assert!(!posting.mentions_any(&["kotlin".to_string()]));
    }

    #[test]
    fn test_mentions_any_ignores_blank_skills() {
        let posting = sample_posting("Backend Engineer", "Acme", "anything");
        assert!(!posting.mentions_any(&["  ".to_string()]));
        assert!(!posting.mentions_any(&[]));
    }

    #[test]
    fn test_well_formed_requires_title_and_url() {
        let mut posting = sample_posting("Engineer", "Acme", "");
        assert!(posting.is_well_formed());
        posting.source_url = String::new();
        assert!(!posting.is_well_formed());
    }
}
