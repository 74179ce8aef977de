//! Skill extraction from posting text: reasoning service first, dictionary
//! scan as the fallback.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::{truncate_chars, MAX_POSTING_CHARS, UNTRUSTED_TEXT_INSTRUCTION};
use crate::llm_client::{complete_json, LlmError, Reasoner};
use crate::models::skill::normalize_skill_name;
use crate::skills::dictionary::{self, canonical_category, SKILL_CATEGORIES};
use crate::skills::prompts::{SKILL_EXTRACTION_PROMPT_TEMPLATE, SKILL_EXTRACTION_SYSTEM};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSkill {
    pub name: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub is_required: bool,
    pub proficiency_level: Option<String>,
    pub years_required: Option<i32>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawExtraction {
    skills: Vec<RawSkill>,
}

#[derive(Debug, Deserialize)]
struct RawSkill {
    name: Option<String>,
    category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default, alias = "isRequired")]
    is_required: Option<bool>,
    #[serde(default, alias = "proficiencyLevel")]
    proficiency_level: Option<String>,
    #[serde(default, alias = "yearsRequired")]
    years_required: Option<f64>,
    #[serde(default)]
    aliases: Option<Vec<String>>,
}

/// Extracts skills with the reasoning service when one is configured.
#[derive(Clone)]
pub struct SkillExtractor {
    reasoner: Option<Arc<dyn Reasoner>>,
}

impl SkillExtractor {
    pub fn new(reasoner: Option<Arc<dyn Reasoner>>) -> Self {
        Self { reasoner }
    }

    /// Dictionary-only extractor.
    pub fn offline() -> Self {
        Self { reasoner: None }
    }

    pub async fn extract_skills(
        &self,
        description: &str,
        title: &str,
        company: Option<&str>,
        requirements: Option<&str>,
    ) -> Vec<ExtractedSkill> {
        if let Some(reasoner) = &self.reasoner {
            let prompt = build_extraction_prompt(description, title, company, requirements);
            match extract_with_reasoner(reasoner.as_ref(), &prompt).await {
                Ok(skills) => {
                    debug!("Extracted {} skills from '{title}'", skills.len());
                    return skills;
                }
                Err(e) => warn!("Skill extraction for '{title}' fell back to dictionary: {e}"),
            }
        }
        extract_from_dictionary(description, title, requirements)
    }
}

async fn extract_with_reasoner(
    reasoner: &dyn Reasoner,
    prompt: &str,
) -> Result<Vec<ExtractedSkill>, LlmError> {
    let raw: RawExtraction = complete_json(reasoner, prompt, SKILL_EXTRACTION_SYSTEM).await?;

    let mut seen = HashSet::new();
    let mut skills = Vec::with_capacity(raw.skills.len());
    for item in raw.skills {
        let Some(name) = item.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) else {
            continue;
        };
        if !seen.insert(normalize_skill_name(&name)) {
            continue;
        }
        let category = canonical_category(item.category.as_deref().unwrap_or_default());
        skills.push(ExtractedSkill {
            category: category.to_string(),
            subcategory: item.subcategory.filter(|s| !s.trim().is_empty()),
            is_required: item.is_required.unwrap_or(true),
            proficiency_level: item.proficiency_level.filter(|s| !s.trim().is_empty()),
            years_required: item
                .years_required
                .filter(|y| y.is_finite() && *y >= 0.0)
                .map(|y| y.round() as i32),
            aliases: item
                .aliases
                .unwrap_or_default()
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty() && !a.eq_ignore_ascii_case(&name))
                .collect(),
            name,
        });
    }
    Ok(skills)
}

/// Every dictionary hit in title, description and requirements, marked required.
pub fn extract_from_dictionary(
    description: &str,
    title: &str,
    requirements: Option<&str>,
) -> Vec<ExtractedSkill> {
    let text = format!("{title}\n{description}\n{}", requirements.unwrap_or_default());
    dictionary::scan(&text)
        .into_iter()
        .map(|(name, category)| ExtractedSkill {
            name: name.to_string(),
            category: category.to_string(),
            subcategory: None,
            is_required: true,
            proficiency_level: None,
            years_required: None,
            aliases: Vec::new(),
        })
        .collect()
}

fn build_extraction_prompt(
    description: &str,
    title: &str,
    company: Option<&str>,
    requirements: Option<&str>,
) -> String {
    let mut posting = format!("Title: {title}\n");
    if let Some(company) = company {
        posting.push_str(&format!("Company: {company}\n"));
    }
    posting.push_str(&format!(
        "Description:\n{}\n",
        truncate_chars(description, MAX_POSTING_CHARS)
    ));
    if let Some(req) = requirements {
        posting.push_str(&format!(
            "Requirements:\n{}\n",
            truncate_chars(req, MAX_POSTING_CHARS / 2)
        ));
    }

    let categories = SKILL_CATEGORIES
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    SKILL_EXTRACTION_PROMPT_TEMPLATE
        .replace("{categories}", &categories)
        .replace("{untrusted}", UNTRUSTED_TEXT_INSTRUCTION)
        .replace("{posting}", &posting)
}
