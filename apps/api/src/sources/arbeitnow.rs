use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::models::posting::NormalizedPosting;
use crate::sources::markup::{strip_html, UNKNOWN_COMPANY};
use crate::sources::{get_text, non_blank, parse_timestamp, JobSource, SourceError};

pub const ARBEITNOW_NAME: &str = "Arbeitnow";
const ARBEITNOW_BASE_URL: &str = "https://www.arbeitnow.com";

#[derive(Debug, Deserialize)]
struct ArbeitnowPage {
    data: Vec<ArbeitnowJob>,
}

#[derive(Debug, Deserialize)]
struct ArbeitnowJob {
    title: Option<String>,
    company_name: Option<String>,
    #[serde(default)]
    description: String,
    url: Option<String>,
    location: Option<String>,
    #[serde(default)]
    remote: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    created_at: Value,
}

pub struct ArbeitnowSource {
    client: Client,
    base_url: String,
}

impl ArbeitnowSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, ARBEITNOW_BASE_URL)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl JobSource for ArbeitnowSource {
    fn name(&self) -> &str {
        ARBEITNOW_NAME
    }

    async fn fetch_raw(
        &self,
        _skills: &[String],
        _limit: usize,
    ) -> Result<Vec<NormalizedPosting>, SourceError> {
        let url = format!("{}/api/job-board-api", self.base_url);
        let body = get_text(&self.client, &url, None).await?;
        let page: ArbeitnowPage = serde_json::from_str(&body)?;
        Ok(page.data.into_iter().map(normalize).collect())
    }
}

fn normalize(job: ArbeitnowJob) -> NormalizedPosting {
    let location = match (non_blank(job.location), job.remote) {
        (Some(place), true) => Some(format!("{place} (remote)")),
        (Some(place), false) => Some(place),
        (None, true) => Some("Remote".to_string()),
        (None, false) => None,
    };

    NormalizedPosting {
        title: non_blank(job.title).unwrap_or_default(),
        company: non_blank(job.company_name).unwrap_or_else(|| UNKNOWN_COMPANY.to_string()),
        description: strip_html(&job.description),
        requirements: (!job.tags.is_empty()).then(|| job.tags.join(", ")),
        location,
        salary: None,
        source_url: non_blank(job.url).unwrap_or_default(),
        source_name: ARBEITNOW_NAME.to_string(),
        posted_at: parse_timestamp(&job.created_at),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::sources::build_http_client;

    #[tokio::test]
    async fn test_fetch_and_normalize() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/job-board-api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {
                        "slug": "backend-engineer-berlin",
                        "company_name": "Zalando",
                        "title": "Backend Engineer (Kotlin)",
                        "description": "<p>Kotlin &amp; PostgreSQL</p>",
                        "remote": true,
                        "url": "https://www.arbeitnow.com/jobs/backend-engineer-berlin",
                        "tags": ["Software Development"],
                        "location": "Berlin",
                        "created_at": 1740830400
                    },
                    {
                        "slug": "no-url",
                        "company_name": "Ghost GmbH",
                        "title": "Kotlin Developer",
                        "description": "Kotlin",
                        "remote": false,
                        "url": null,
                        "tags": [],
                        "location": "Hamburg",
                        "created_at": 1740830400
                    }
                ],
                "links": {}
            })))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = ArbeitnowSource::with_base_url(client, server.uri());
        let postings = source.fetch_jobs(&["kotlin".into()], 10).await;

        assert_eq!(postings.len(), 1);
        let p = &postings[0];
        assert_eq!(p.company, "Zalando");
        assert_eq!(p.description, "Kotlin & PostgreSQL");
        assert_eq!(p.location.as_deref(), Some("Berlin (remote)"));
        assert_eq!(
            p.posted_at,
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap())
        );
    }
}
