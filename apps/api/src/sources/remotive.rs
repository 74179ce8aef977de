use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::models::posting::NormalizedPosting;
use crate::sources::markup::{strip_html, UNKNOWN_COMPANY};
use crate::sources::{get_text, non_blank, parse_timestamp, JobSource, SourceError};

pub const REMOTIVE_NAME: &str = "Remotive";
const REMOTIVE_BASE_URL: &str = "https://remotive.com";
/// Upper bound on rows requested; the skill filter runs after the fetch.
const MAX_PAGE: usize = 200;

#[derive(Debug, Deserialize)]
struct RemotiveResponse {
    jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    url: Option<String>,
    title: Option<String>,
    company_name: Option<String>,
    #[serde(default)]
    description: String,
    candidate_required_location: Option<String>,
    salary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    publication_date: Value,
}

pub struct RemotiveSource {
    client: Client,
    base_url: String,
}

impl RemotiveSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, REMOTIVE_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl JobSource for RemotiveSource {
    fn name(&self) -> &str {
        REMOTIVE_NAME
    }

    async fn fetch_raw(
        &self,
        _skills: &[String],
        limit: usize,
    ) -> Result<Vec<NormalizedPosting>, SourceError> {
        let page = (limit.saturating_mul(4)).clamp(1, MAX_PAGE);
        let url = format!(
            "{}/api/remote-jobs?category=software-dev&limit={page}",
            self.base_url
        );
        let body = get_text(&self.client, &url, None).await?;
        let response: RemotiveResponse = serde_json::from_str(&body)?;
        Ok(response.jobs.into_iter().map(normalize).collect())
    }
}

fn normalize(job: RemotiveJob) -> NormalizedPosting {
    NormalizedPosting {
        title: non_blank(job.title).unwrap_or_default(),
        company: non_blank(job.company_name).unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        description: strip_html(&job.description),
        requirements: (!job.tags.is_empty()).then(|| job.tags.join(", ")),
        location: non_blank(job.candidate_required_location),
        salary: non_blank(job.salary),
        source_url: non_blank(job.url).unwrap_or_default(),
        source_name: REMOTIVE_NAME.to_string(),
        posted_at: parse_timestamp(&job.publication_date),
    }
}
