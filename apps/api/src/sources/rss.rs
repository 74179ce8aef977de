//! RSS 2.0 / Atom feed source. Used for the built-in We Work Remotely feed
//! and for every user-configured `rss` descriptor.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use crate::models::posting::NormalizedPosting;
use crate::sources::markup::{parse_title_company, strip_html};
use crate::sources::{get_text, JobSource, SourceError};

pub const WWR_NAME: &str = "We Work Remotely";
pub const WWR_FEED_URL: &str = "https://weworkremotely.com/categories/remote-programming-jobs.rss";

static ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<(?:item|entry)(?:\s[^>]*)?>(.*?)</(?:item|entry)>").expect("valid regex"));
static ATOM_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<link\b[^>]*\bhref\s*=\s*"([^"]*)""#).expect("valid regex"));
static CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*<!\[CDATA\[(.*)\]\]>\s*$").expect("valid regex"));

const FIELD_TAGS: &[&str] = &[
    "title",
    "link",
    "guid",
    "description",
    "summary",
    "content",
    "content:encoded",
    "pubDate",
    "published",
    "updated",
    "dc:date",
    "region",
    "location",
    "company",
];

static FIELDS: Lazy<HashMap<&'static str, Regex>> = Lazy::new(|| {
    FIELD_TAGS
        .iter()
        .map(|tag| {
            let pattern = format!(r"(?s)<{tag}(?:\s[^>]*)?>(.*?)</{tag}>");
            (*tag, Regex::new(&pattern).expect("valid regex"))
        })
        .collect()
});

pub struct RssSource {
    name: String,
    feed_url: String,
    client: Client,
}

impl RssSource {
    pub fn new(name: impl Into<String>, feed_url: impl Into<String>, client: Client) -> Self {
        Self {
            name: name.into(),
            feed_url: feed_url.into(),
            client,
        }
    }

    pub fn we_work_remotely(client: Client) -> Self {
        Self::new(WWR_NAME, WWR_FEED_URL, client)
    }
}

#[async_trait]
impl JobSource for RssSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_raw(
        &self,
        _skills: &[String],
        _limit: usize,
    ) -> Result<Vec<NormalizedPosting>, SourceError> {
        let body = get_text(&self.client, &self.feed_url, None).await?;
        parse_feed(&body, &self.name)
    }
}

/// Parses every `<item>` (RSS) or `<entry>` (Atom) in `xml`.
pub fn parse_feed(xml: &str, source_name: &str) -> Result<Vec<NormalizedPosting>, SourceError> {
    let head = xml.trim_start();
    if !(head.starts_with("<?xml") || head.starts_with("<rss") || head.starts_with("<feed")) {
        return Err(SourceError::Parse("response is not an RSS or Atom document".into()));
    }

    Ok(ITEM
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|item| parse_item(item.as_str(), source_name))
        .collect())
}

fn parse_item(item: &str, source_name: &str) -> NormalizedPosting {
    let headline = field(item, "title").map(|t| strip_html(&t)).unwrap_or_default();
    let parsed = parse_title_company(&headline);

    let company = field(item, "company")
        .map(|c| strip_html(&c))
        .filter(|c| !c.is_empty())
        .unwrap_or(parsed.company);

    let link = field(item, "link")
        .or_else(|| {
            ATOM_LINK
                .captures(item)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_string())
        })
        .or_else(|| field(item, "guid").filter(|g| g.starts_with("http")))
        .unwrap_or_default();

    let description = ["content:encoded", "description", "content", "summary"]
        .iter()
        .find_map(|tag| field(item, tag))
        .map(|d| strip_html(&d))
        .unwrap_or_default();

    let location = parsed.location.or_else(|| {
        field(item, "region")
            .or_else(|| field(item, "location"))
            .map(|l| strip_html(&l))
            .filter(|l| !l.is_empty())
    });

    let posted_at = ["pubDate", "published", "updated", "dc:date"]
        .iter()
        .find_map(|tag| field(item, tag))
        .and_then(|d| parse_feed_date(&d));

    NormalizedPosting {
        title: parsed.title,
        company,
        description,
        requirements: None,
        location,
        salary: None,
        source_url: link,
        source_name: source_name.to_string(),
        posted_at,
    }
}

/// Inner text of the first `<tag>`, CDATA unwrapped, trimmed, non-empty.
fn field(item: &str, tag: &str) -> Option<String> {
    let raw = FIELDS.get(tag)?.captures(item)?.get(1)?.as_str();
    let text = match CDATA.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => raw,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// RFC 2822 (RSS) or RFC 3339 (Atom) timestamps.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::TimeZone;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::sources::build_http_client;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Remote Programming Jobs</title>
    <item>
      <title>Hooli: Senior Rust Engineer</title>
      <region>Anywhere in the World</region>
      <link>https://weworkremotely.com/remote-jobs/hooli-senior-rust-engineer</link>
      <pubDate>Tue, 03 Jun 2025 10:00:00 +0000</pubDate>
      <description><![CDATA[<p>Build <strong>Rust</strong> services on AWS.</p>]]></description>
    </item>
    <item>
      <title>Acme Corp busca personal para el cargo de Backend Developer en Madrid</title>
      <link>https://empleos.example.es/ofertas/42</link>
      <description>Experiencia con Python &amp; Django.</description>
    </item>
    <item>
      <title>Initech: Office Manager</title>
      <link>https://weworkremotely.com/remote-jobs/initech-office-manager</link>
      <description>Keep the office running.</description>
    </item>
    <item>
      <title></title>
      <link>https://weworkremotely.com/remote-jobs/blank</link>
      <description>Rust Rust Rust</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed_items() {
        let postings = parse_feed(FEED, WWR_NAME).unwrap();
        assert_eq!(postings.len(), 4);

        let first = &postings[0];
        assert_eq!(first.title, "Senior Rust Engineer");
        assert_eq!(first.company, "Hooli");
        assert_eq!(first.location.as_deref(), Some("Anywhere in the World"));
        assert_eq!(first.description, "Build Rust services on AWS.");
        assert_eq!(
            first.posted_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap())
        );

        let second = &postings[1];
        assert_eq!(second.company, "Acme Corp");
        assert_eq!(second.title, "Backend Developer");
        assert_eq!(second.location.as_deref(), Some("Madrid"));
        assert_eq!(second.description, "Experiencia con Python & Django.");
        assert_eq!(second.posted_at, None);
    }

    #[test]
    fn test_parse_atom_entry() {
        let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
          <entry>
            <title>Platform Engineer at Globex</title>
            <link rel="alternate" href="https://globex.example.com/jobs/7"/>
            <updated>2025-05-01T08:30:00Z</updated>
            <summary>Kubernetes and Go.</summary>
          </entry>
        </feed>"#;
        let postings = parse_feed(atom, "Globex Careers").unwrap();
        assert_eq!(postings[0].title, "Platform Engineer");
        assert_eq!(postings[0].company, "Globex");
        assert_eq!(postings[0].source_url, "https://globex.example.com/jobs/7");
        assert!(postings[0].posted_at.is_some());
    }

    #[test]
    fn test_html_body_is_a_parse_error() {
        assert!(matches!(
            parse_feed("<html><body>Maintenance</body></html>", "X"),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_jobs_filters_and_drops_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs.rss"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = RssSource::new("Test Feed", format!("{}/jobs.rss", server.uri()), client);

        let postings = source.fetch_jobs(&["rust".into(), "python".into()], 10).await;
        let titles: Vec<&str> = postings.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Senior Rust Engineer", "Backend Developer"]);
        assert!(postings.iter().all(|p| p.source_name == "Test Feed"));
    }

    #[tokio::test]
    async fn test_server_error_yields_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let source = RssSource::new("Down Feed", server.uri(), client);
        assert!(source.fetch_jobs(&["rust".into()], 10).await.is_empty());
        assert!(!source.health_check().await);
    }
}
