//! Deterministic fallback scorer. Used whenever the reasoning service is
//! unavailable or returns something unusable. No I/O, no randomness.

use std::collections::HashSet;

use crate::models::posting::NormalizedPosting;
use crate::models::profile::UserProfile;
use crate::scoring::{FitDimensions, FitScore, BACKEND_HEURISTIC};

/// Neutral score for dimensions the heuristic cannot judge.
pub const NEUTRAL_SCORE: u32 = 70;

const SENIOR_MARKERS: &[&str] = &["senior", "lead", "principal"];
const SENIOR_TIERS: &[&str] = &["senior", "lead", "principal", "staff"];

/// Words stripped from titles before measuring overlap.
const GENERIC_ROLE_WORDS: &[&str] = &[
    "senior", "sr", "junior", "jr", "lead", "principal", "staff", "mid", "level", "engineer",
    "developer", "programmer", "manager", "specialist", "consultant", "architect", "i", "ii",
    "iii", "iv", "the", "and", "of", "for", "a", "an", "remote", "hybrid", "contract",
];

/// Posting-title phrases that signal a different line of work altogether.
const DISTINCT_ROLE_KEYWORDS: &[&str] = &[
    "data engineer",
    "data scientist",
    "data analyst",
    "legal",
    "lawyer",
    "attorney",
    "paralegal",
    "sales",
    "account executive",
    "marketing",
    "recruiter",
    "recruiting",
    "accountant",
    "nurse",
    "customer support",
    "customer success",
];

const DISTINCT_ROLE_CAP: u32 = 15;
const NO_PREFERRED_TITLES_SCORE: u32 = 10;
const UNMATCHED_TITLE_SCORE: u32 = 50;

pub fn score(profile: &UserProfile, posting: &NormalizedPosting) -> FitScore {
    let text = posting.searchable_text();

    let skills = profile.combined_skills();
    let (matched_skills, missing_skills): (Vec<String>, Vec<String>) = skills
        .iter()
        .cloned()
        .partition(|s| text.contains(&s.to_lowercase()));

    let dimensions = FitDimensions {
        skill_match: skill_match(matched_skills.len(), skills.len()),
        experience_match: experience_match(profile.years_of_experience),
        seniority_match: seniority_match(profile.seniority_level.as_deref(), &posting.title),
        title_match: title_match(profile, &posting.title),
        industry_match: NEUTRAL_SCORE,
        location_match: NEUTRAL_SCORE,
    };
    let overall = dimensions.weighted_overall();

    let mut recommendations = Vec::new();
    if !missing_skills.is_empty() {
        recommendations.push(format!(
            "Highlight any exposure to: {}.",
            missing_skills.join(", ")
        ));
    }

    let mut strengths = Vec::new();
    if !matched_skills.is_empty() {
        strengths.push(format!("Mentions your skills: {}.", matched_skills.join(", ")));
    }
    if dimensions.title_match >= 85 {
        strengths.push("Title lines up with your preferred roles.".to_string());
    }

    let mut concerns = Vec::new();
    if dimensions.title_match <= DISTINCT_ROLE_CAP {
        concerns.push("Title looks like a different kind of role.".to_string());
    }
    if dimensions.skill_match < 50 {
        concerns.push("Fewer than half of your skills appear in the posting.".to_string());
    }

    FitScore {
        overall,
        skill_match: dimensions.skill_match,
        experience_match: dimensions.experience_match,
        seniority_match: dimensions.seniority_match,
        title_match: dimensions.title_match,
        industry_match: dimensions.industry_match,
        location_match: dimensions.location_match,
        reasoning: format!(
            "Heuristic estimate: {}/{} skills found in the posting, title score {}.",
            matched_skills.len(),
            skills.len(),
            dimensions.title_match
        ),
        matched_skills,
        missing_skills,
        recommendations,
        strengths,
        concerns,
        scorer_backend: BACKEND_HEURISTIC.to_string(),
    }
}

fn skill_match(matched: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((matched as f64 / total as f64) * 100.0).round() as u32
}

fn experience_match(years: Option<i32>) -> u32 {
    match years {
        Some(y) => y.clamp(0, 10) as u32 * 10,
        None => 50,
    }
}

fn seniority_match(profile_level: Option<&str>, posting_title: &str) -> u32 {
    let Some(level) = profile_level.map(|l| l.trim().to_lowercase()).filter(|l| !l.is_empty())
    else {
        return 50;
    };
    let title = posting_title.to_lowercase();
    let posting_senior = SENIOR_MARKERS.iter().any(|m| title.contains(m));
    let profile_senior = SENIOR_TIERS.iter().any(|t| level.contains(t));
    if posting_senior == profile_senior {
        100
    } else {
        60
    }
}

fn significant_words(title: &str) -> HashSet<String> {
    title
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#')
        .filter(|w| !w.is_empty() && !GENERIC_ROLE_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn title_match(profile: &UserProfile, posting_title: &str) -> u32 {
    let preferred: Vec<String> = profile
        .preferred_titles
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if preferred.is_empty() {
        return NO_PREFERRED_TITLES_SCORE;
    }

    let title = posting_title.trim().to_lowercase();
    let title_words = significant_words(&title);

    let mut best = UNMATCHED_TITLE_SCORE;
    for wanted in &preferred {
        if !title.is_empty() && (title.contains(wanted.as_str()) || wanted.contains(title.as_str()))
        {
            best = 100;
            break;
        }
        let wanted_words = significant_words(wanted);
        if wanted_words.is_empty() {
            continue;
        }
        let shared = wanted_words.intersection(&title_words).count();
        let overlap = shared as f64 / wanted_words.len() as f64;
        let partial = if overlap >= 0.8 {
            85
        } else if overlap >= 0.5 {
            50
        } else {
            continue;
        };
        best = best.max(partial);
    }

    let in_that_field = |keyword: &str| {
        preferred.iter().any(|p| p.contains(keyword))
            || profile
                .primary_skills
                .iter()
                .any(|s| s.to_lowercase().contains(keyword))
    };
    let distinct_role = DISTINCT_ROLE_KEYWORDS
        .iter()
        .any(|kw| title.contains(kw) && !in_that_field(kw));

    if distinct_role {
        best.min(DISTINCT_ROLE_CAP)
    } else {
        best
    }
}
