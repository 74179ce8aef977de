//! User-configured JSON API source.
//!
//! Accepts the shapes job APIs commonly return: a bare array, or an array
//! under `jobs`, `data`, `results` or `items`. Field names are matched
//! against a small alias list per field.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use crate::models::posting::NormalizedPosting;
use crate::sources::markup::{parse_title_company, strip_html};
use crate::sources::{get_text, parse_timestamp, JobSource, SourceError};

const LIST_KEYS: &[&str] = &["jobs", "data", "results", "items"];
const TITLE_KEYS: &[&str] = &["title", "position", "job_title", "jobTitle", "name"];
const COMPANY_KEYS: &[&str] = &["company", "company_name", "companyName", "employer"];
const DESCRIPTION_KEYS: &[&str] = &["description", "summary", "body", "content"];
const REQUIREMENTS_KEYS: &[&str] = &["requirements", "qualifications"];
const URL_KEYS: &[&str] = &["url", "link", "apply_url", "applyUrl", "job_url", "source_url"];
const LOCATION_KEYS: &[&str] = &["location", "candidate_required_location", "city"];
const SALARY_KEYS: &[&str] = &["salary", "compensation", "salary_range"];
const DATE_KEYS: &[&str] = &[
    "posted_at",
    "postedAt",
    "publication_date",
    "published_at",
    "date",
    "created_at",
];

pub struct ApiSource {
    name: String,
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl ApiSource {
    pub fn new(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        api_key: Option<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }
}

#[async_trait]
impl JobSource for ApiSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_raw(
        &self,
        _skills: &[String],
        _limit: usize,
    ) -> Result<Vec<NormalizedPosting>, SourceError> {
        let body = get_text(&self.client, &self.endpoint, self.api_key.as_deref()).await?;
        let payload: Value = serde_json::from_str(&body)?;
        parse_payload(&payload, &self.name)
    }
}

pub fn parse_payload(payload: &Value, source_name: &str) -> Result<Vec<NormalizedPosting>, SourceError> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(obj) => LIST_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_array))
            .ok_or_else(|| SourceError::Parse("no job list in response".into()))?,
        _ => return Err(SourceError::Parse("response is not a JSON object or array".into())),
    };

    Ok(rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| normalize(row, source_name))
        .collect())
}

fn pick_str(row: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match row.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(nested) => nested
            .get("name")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    })
}

fn normalize(row: &Map<String, Value>, source_name: &str) -> NormalizedPosting {
    let raw_title = pick_str(row, TITLE_KEYS).unwrap_or_default();
    let (title, company, parsed_location) = match pick_str(row, COMPANY_KEYS) {
        Some(company) => (raw_title, company, None),
        None => {
            let parsed = parse_title_company(&raw_title);
            (parsed.title, parsed.company, parsed.location)
        }
    };

    NormalizedPosting {
        title,
        company,
        description: pick_str(row, DESCRIPTION_KEYS)
            .map(|d| strip_html(&d))
            .unwrap_or_default(),
        requirements: pick_str(row, REQUIREMENTS_KEYS).map(|r| strip_html(&r)),
        location: pick_str(row, LOCATION_KEYS).or(parsed_location),
        salary: pick_str(row, SALARY_KEYS),
        source_url: pick_str(row, URL_KEYS).unwrap_or_default(),
        source_name: source_name.to_string(),
        posted_at: DATE_KEYS
            .iter()
            .filter_map(|key| row.get(*key))
            .find_map(parse_timestamp),
    }
}
