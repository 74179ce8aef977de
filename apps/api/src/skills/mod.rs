//! Skill extraction and taxonomy. Mines skill mentions out of posting text
//! into an alias-aware catalog and tracks demand trends from sighting history.

pub mod dictionary;
pub mod extraction;
pub mod handlers;
pub mod prompts;
pub mod taxonomy;

use chrono::Utc;

use crate::skills::extraction::SkillExtractor;
use crate::skills::taxonomy::{save_skills, SaveSummary, SkillExtractionResult};
use crate::store::{SkillRepository, StoreResult};

/// Posting text submitted for extraction.
#[derive(Debug, Clone, Copy)]
pub struct PostingText<'a> {
    pub text: &'a str,
    pub title: &'a str,
    pub company: Option<&'a str>,
    pub requirements: Option<&'a str>,
    pub source_url: Option<&'a str>,
}

/// Extracts skills from one posting and merges them into the catalog.
pub async fn extract_and_save_skills(
    extractor: &SkillExtractor,
    repo: &dyn SkillRepository,
    posting: PostingText<'_>,
) -> StoreResult<SaveSummary> {
    let skills = extractor
        .extract_skills(posting.text, posting.title, posting.company, posting.requirements)
        .await;
    if skills.is_empty() {
        return Ok(SaveSummary::default());
    }

    let result = SkillExtractionResult {
        job_title: posting.title.to_string(),
        company: posting.company.map(str::to_string),
        source_url: posting.source_url.map(str::to_string),
        skills,
    };
    save_skills(repo, &result, Utc::now()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn test_extract_and_save_with_dictionary() {
        let store = MemoryStore::new();
        let extractor = SkillExtractor::offline();
        let posting = PostingText {
            text: "We run Python on AWS.",
            title: "Backend Engineer",
            company: Some("Acme"),
            requirements: None,
            source_url: Some("https://jobs.example.com/1"),
        };

        let first = extract_and_save_skills(&extractor, &store, posting).await.unwrap();
        assert_eq!(first.saved_count, 2);

        let second = extract_and_save_skills(&extractor, &store, posting).await.unwrap();
        assert_eq!(second.updated_count, 2);

        let sightings = store.sightings();
        assert_eq!(sightings.len(), 4);
        assert_eq!(sightings[0].source_url.as_deref(), Some("https://jobs.example.com/1"));
    }

    #[tokio::test]
    async fn test_nothing_found_saves_nothing() {
        let store = MemoryStore::new();
        let posting = PostingText {
            text: "Friendly office, free snacks.",
            title: "Receptionist",
            company: None,
            requirements: None,
            source_url: None,
        };
        let summary = extract_and_save_skills(&SkillExtractor::offline(), &store, posting)
            .await
            .unwrap();
        assert_eq!(summary, SaveSummary::default());
    }
}
