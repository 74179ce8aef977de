use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandTrend {
    Rising,
    #[default]
    Stable,
    Declining,
}

impl DemandTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandTrend::Rising => "rising",
            DemandTrend::Stable => "stable",
            DemandTrend::Declining => "declining",
        }
    }
}

impl fmt::Display for DemandTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DemandTrend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rising" => Ok(DemandTrend::Rising),
            "stable" => Ok(DemandTrend::Stable),
            "declining" => Ok(DemandTrend::Declining),
            other => Err(format!("unknown demand trend '{other}'")),
        }
    }
}

/// An entry in the skill catalog, keyed by `normalized_name`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub normalized_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub aliases: Vec<String>,
    pub frequency: i32,
    pub demand_trend: DemandTrend,
    pub last_seen_at: DateTime<Utc>,
}

impl Skill {
    /// True when `term` (already normalized) equals the name or any alias.
    pub fn answers_to(&self, term: &str) -> bool {
        self.normalized_name == term || self.aliases.iter().any(|a| normalize_skill_name(a) == term)
    }
}

/// One observed mention of a skill in one posting. Append-only.
#[derive(Debug, Clone)]
pub struct NewSighting {
    pub skill_id: Uuid,
    pub job_title: String,
    pub company: Option<String>,
    pub source_url: Option<String>,
    pub is_required: bool,
    pub proficiency_level: Option<String>,
    pub years_required: Option<i32>,
    pub extracted_at: DateTime<Utc>,
}

/// Insert-or-bump payload for a catalog entry.
#[derive(Debug, Clone)]
pub struct SkillUpsert {
    pub name: String,
    pub normalized_name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub aliases: Vec<String>,
    pub seen_at: DateTime<Utc>,
}

/// Dedup key for the catalog: lowercase, trimmed.
pub fn normalize_skill_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skill_name() {
        assert_eq!(normalize_skill_name("  PostgreSQL "), "postgresql");
    }

    #[test]
    fn test_demand_trend_default_is_stable() {
        assert_eq!(DemandTrend::default(), DemandTrend::Stable);
        assert_eq!("rising".parse::<DemandTrend>().unwrap(), DemandTrend::Rising);
    }

    #[test]
    fn test_answers_to_checks_aliases() {
        let skill = Skill {
            id: Uuid::new_v4(),
            name: "Kubernetes".into(),
            normalized_name: "kubernetes".into(),
            category: "DevOps".into(),
            subcategory: None,
            aliases: vec!["K8s".into()],
            frequency: 3,
            demand_trend: DemandTrend::Stable,
            last_seen_at: Utc::now(),
        };
        assert!(skill.answers_to("kubernetes"));
        assert!(skill.answers_to("k8s"));
        assert!(!skill.answers_to("docker"));
    }
}
