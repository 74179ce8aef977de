use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::models::posting::NormalizedPosting;
use crate::sources::markup::{strip_html, UNKNOWN_COMPANY};
use crate::sources::{get_text, non_blank, parse_timestamp, JobSource, SourceError};

pub const REMOTEOK_NAME: &str = "RemoteOK";
const REMOTEOK_BASE_URL: &str = "https://remoteok.com";

// The feed is a JSON array whose first element is a legal notice, not a job.
#[derive(Debug, Deserialize)]
struct RemoteOkJob {
    position: String,
    url: Option<String>,
    company: Option<String>,
    #[serde(default)]
    description: String,
    location: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    salary_min: Option<u64>,
    salary_max: Option<u64>,
    #[serde(default)]
    date: Value,
}

pub struct RemoteOkSource {
    client: Client,
    base_url: String,
}

impl RemoteOkSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, REMOTEOK_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl JobSource for RemoteOkSource {
    fn name(&self) -> &str {
        REMOTEOK_NAME
    }

    async fn fetch_raw(
        &self,
        _skills: &[String],
        _limit: usize,
    ) -> Result<Vec<NormalizedPosting>, SourceError> {
        let body = get_text(&self.client, &format!("{}/api", self.base_url), None).await?;
        let rows: Vec<Value> = serde_json::from_str(&body)?;

        let total = rows.len();
        let postings: Vec<NormalizedPosting> = rows
            .into_iter()
            .filter_map(|row| serde_json::from_value::<RemoteOkJob>(row).ok())
            .map(normalize)
            .collect();
        debug!("RemoteOK: {} of {total} rows were jobs", postings.len());
        Ok(postings)
    }
}

fn format_salary(min: Option<u64>, max: Option<u64>) -> Option<String> {
    match (min.filter(|v| *v > 0), max.filter(|v| *v > 0)) {
        (Some(lo), Some(hi)) => Some(format!("${lo} - ${hi}")),
        (Some(lo), None) => Some(format!("${lo}+")),
        (None, Some(hi)) => Some(format!("up to ${hi}")),
        (None, None) => None,
    }
}

fn normalize(job: RemoteOkJob) -> NormalizedPosting {
    NormalizedPosting {
        title: job.position.trim().to_string(),
        company: non_blank(job.company).unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        description: strip_html(&job.description),
        requirements: (!job.tags.is_empty()).then(|| job.tags.join(", ")),
        location: non_blank(job.location),
        salary: format_salary(job.salary_min, job.salary_max),
        source_url: non_blank(job.url).unwrap_or_default(),
        source_name: REMOTEOK_NAME.to_string(),
        posted_at: parse_timestamp(&job.date),
    }
}
