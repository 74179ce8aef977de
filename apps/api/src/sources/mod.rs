//! Source plugins. Each pulls postings from one external feed or API and
//! normalizes them to `NormalizedPosting`.
//!
//! A plugin only implements `fetch_raw`. The provided `fetch_jobs` is the
//! boundary the rest of the pipeline calls: it never fails, drops malformed
//! postings, and keeps only postings that mention one of the caller's skills.

pub mod arbeitnow;
pub mod custom;
pub mod handlers;
pub mod markup;
pub mod registry;
pub mod remoteok;
pub mod remotive;
pub mod rss;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::posting::NormalizedPosting;

/// Skill used by the default health check.
const HEALTH_CHECK_SKILL: &str = "developer";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}

#[async_trait]
pub trait JobSource: Send + Sync {
    fn name(&self) -> &str;

    /// One bounded round of requests against the upstream. May fail.
    async fn fetch_raw(
        &self,
        skills: &[String],
        limit: usize,
    ) -> Result<Vec<NormalizedPosting>, SourceError>;

    /// Postings mentioning at least one of `skills`, at most `limit`.
    /// Failures are logged and yield an empty list.
    async fn fetch_jobs(&self, skills: &[String], limit: usize) -> Vec<NormalizedPosting> {
        match self.fetch_raw(skills, limit).await {
            Ok(postings) => {
                let fetched = postings.len();
                let kept = retain_matching(postings, skills, limit);
                debug!(
                    "{}: kept {} of {fetched} fetched postings",
                    self.name(),
                    kept.len()
                );
                kept
            }
            Err(e) => {
                warn!("Source '{}' failed: {e}", self.name());
                Vec::new()
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.fetch_raw(&[HEALTH_CHECK_SKILL.to_string()], 1)
            .await
            .is_ok()
    }
}

/// Drops malformed postings and those not mentioning any skill, then truncates.
pub fn retain_matching(
    postings: Vec<NormalizedPosting>,
    skills: &[String],
    limit: usize,
) -> Vec<NormalizedPosting> {
    postings
        .into_iter()
        .filter(|p| p.is_well_formed() && p.mentions_any(skills))
        .take(limit)
        .collect()
}

/// Shared HTTP client for every source.
pub fn build_http_client(timeout: Duration) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// GETs `url` and returns the body. Non-2xx statuses are errors.
pub async fn get_text(
    client: &Client,
    url: &str,
    bearer: Option<&str>,
) -> Result<String, SourceError> {
    let mut request = client.get(url);
    if let Some(token) = bearer {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// First non-blank value, trimmed.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Timestamps as JSON feeds send them: epoch seconds, RFC 3339, or a naive
/// ISO datetime taken as UTC.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                        .ok()
                        .map(|n| n.and_utc())
                })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::sample_posting;

    struct Broken;

    #[async_trait]
    impl JobSource for Broken {
        fn name(&self) -> &str {
            "Broken"
        }

        async fn fetch_raw(
            &self,
            _skills: &[String],
            _limit: usize,
        ) -> Result<Vec<NormalizedPosting>, SourceError> {
            Err(SourceError::Parse("unexpected token".into()))
        }
    }

    struct Fixed(Vec<NormalizedPosting>);

    #[async_trait]
    impl JobSource for Fixed {
        fn name(&self) -> &str {
            "Fixed"
        }

        async fn fetch_raw(
            &self,
            _skills: &[String],
            _limit: usize,
        ) -> Result<Vec<NormalizedPosting>, SourceError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp(&serde_json::json!(1740830400)), Some(expected));
        assert_eq!(parse_timestamp(&serde_json::json!("2025-03-01T12:00:00Z")), Some(expected));
        assert_eq!(parse_timestamp(&serde_json::json!("2025-03-01T14:00:00+02:00")), Some(expected));
        assert_eq!(parse_timestamp(&serde_json::json!("2025-03-01T12:00:00")), Some(expected));
        assert_eq!(parse_timestamp(&serde_json::json!("last week")), None);
        assert_eq!(parse_timestamp(&Value::Null), None);
    }

    #[tokio::test]
    async fn test_failing_source_yields_empty_list() {
        assert!(Broken.fetch_jobs(&["rust".into()], 10).await.is_empty());
        assert!(!Broken.health_check().await);
    }

    #[tokio::test]
    async fn test_fetch_jobs_filters_by_skill_and_shape() {
        let mut no_link = sample_posting("Rust Engineer", "Acme", "Rust");
        no_link.source_url = String::new();
        let source = Fixed(vec![
            sample_posting("Rust Engineer", "Acme", "Tokio services"),
            sample_posting("Accountant", "Initech", "Spreadsheets"),
            sample_posting("Platform Engineer", "Globex", "We love RUST here"),
            no_link,
        ]);

        let postings = source.fetch_jobs(&["rust".into()], 10).await;
        let titles: Vec<&str> = postings.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust Engineer", "Platform Engineer"]);
        assert!(postings.iter().all(|p| p.mentions_any(&["rust".into()])));

        assert_eq!(source.fetch_jobs(&["rust".into()], 1).await.len(), 1);
        assert!(source.health_check().await);
    }
}
