//! Source Registry & Aggregator.
//!
//! Built-in sources are a static list of constructors compiled into the
//! binary. User sources are rows in `job_sources`, read fresh on every scan
//! and turned into `RssSource` / `ApiSource` instances. Nothing here is
//! shared mutable state across requests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::posting::NormalizedPosting;
use crate::models::source::{SourceDescriptor, SourceType};
use crate::sources::arbeitnow::ArbeitnowSource;
use crate::sources::custom::ApiSource;
use crate::sources::remoteok::RemoteOkSource;
use crate::sources::remotive::RemotiveSource;
use crate::sources::rss::RssSource;
use crate::sources::{JobSource, SourceError};
use crate::store::{SourceRepository, StoreResult};

type SourceConstructor = fn(Client) -> Arc<dyn JobSource>;

fn remotive(client: Client) -> Arc<dyn JobSource> {
    Arc::new(RemotiveSource::new(client))
}

fn remoteok(client: Client) -> Arc<dyn JobSource> {
    Arc::new(RemoteOkSource::new(client))
}

fn arbeitnow(client: Client) -> Arc<dyn JobSource> {
    Arc::new(ArbeitnowSource::new(client))
}

fn we_work_remotely(client: Client) -> Arc<dyn JobSource> {
    Arc::new(RssSource::we_work_remotely(client))
}

/// Every built-in source. Adding one means adding a constructor here.
const BUILTIN_SOURCES: &[SourceConstructor] = &[remotive, remoteok, arbeitnow, we_work_remotely];

#[derive(Debug, Clone, Serialize)]
pub struct SourceHealth {
    pub name: String,
    pub healthy: bool,
}

pub struct SourceRegistry {
    client: Client,
    timeout: Duration,
    builtins: Vec<Arc<dyn JobSource>>,
}

impl SourceRegistry {
    pub fn new(client: Client, timeout: Duration) -> Self {
        let builtins = BUILTIN_SOURCES
            .iter()
            .map(|construct| construct(client.clone()))
            .collect();
        Self::with_builtins(client, timeout, builtins)
    }

    pub fn with_builtins(
        client: Client,
        timeout: Duration,
        builtins: Vec<Arc<dyn JobSource>>,
    ) -> Self {
        Self {
            client,
            timeout,
            builtins,
        }
    }

    pub fn builtin_names(&self) -> Vec<String> {
        self.builtins.iter().map(|s| s.name().to_string()).collect()
    }

    /// Built-ins plus every enabled, well-formed user descriptor.
    pub fn sources_for(&self, descriptors: &[SourceDescriptor]) -> Vec<Arc<dyn JobSource>> {
        let mut sources = self.builtins.clone();
        sources.extend(
            descriptors
                .iter()
                .filter(|d| d.enabled)
                .filter_map(|d| self.from_descriptor(d)),
        );
        sources
    }

    fn from_descriptor(&self, descriptor: &SourceDescriptor) -> Option<Arc<dyn JobSource>> {
        let source: Arc<dyn JobSource> = match (
            descriptor.kind(),
            descriptor.feed_url.as_deref(),
            descriptor.api_endpoint.as_deref(),
        ) {
            (Some(SourceType::Rss), Some(feed_url), _) => Arc::new(RssSource::new(
                descriptor.name.clone(),
                feed_url,
                self.client.clone(),
            )),
            (Some(SourceType::Api), _, Some(endpoint)) => Arc::new(ApiSource::new(
                descriptor.name.clone(),
                endpoint,
                descriptor.api_key.clone(),
                self.client.clone(),
            )),
            _ => {
                warn!(
                    "Skipping source '{}' ({}): type '{}' without a usable URL",
                    descriptor.name, descriptor.id, descriptor.source_type
                );
                return None;
            }
        };
        Some(source)
    }

    /// Fetches from every enabled source for `user_id`, merged and deduplicated.
    pub async fn fetch_from_all_sources(
        &self,
        repo: &dyn SourceRepository,
        user_id: Uuid,
        skills: &[String],
        limit: usize,
    ) -> StoreResult<Vec<NormalizedPosting>> {
        let descriptors = repo.list_sources(user_id).await?;
        let sources = self.sources_for(&descriptors);
        Ok(aggregate(&sources, skills, limit, self.timeout).await)
    }

    pub async fn health_report(
        &self,
        repo: &dyn SourceRepository,
        user_id: Uuid,
    ) -> StoreResult<Vec<SourceHealth>> {
        let descriptors = repo.list_sources(user_id).await?;
        let sources = self.sources_for(&descriptors);
        let timeout = self.timeout;

        Ok(join_all(sources.iter().map(|source| async move {
            let healthy = tokio::time::timeout(timeout, source.health_check())
                .await
                .unwrap_or(false);
            SourceHealth {
                name: source.name().to_string(),
                healthy,
            }
        }))
        .await)
    }
}

/// Runs every source concurrently, each bounded by `timeout`, then tags and
/// deduplicates the results.
pub async fn aggregate(
    sources: &[Arc<dyn JobSource>],
    skills: &[String],
    limit: usize,
    timeout: Duration,
) -> Vec<NormalizedPosting> {
    let results = join_all(sources.iter().map(|source| async move {
        let postings = match tokio::time::timeout(timeout, source.fetch_jobs(skills, limit)).await {
            Ok(postings) => postings,
            Err(_) => {
                let e = SourceError::Timeout(timeout);
                warn!("Source '{}' failed: {e}", source.name());
                Vec::new()
            }
        };
        (source.name().to_string(), postings)
    }))
    .await;

    let mut merged = Vec::new();
    let mut summary = Vec::with_capacity(results.len());
    for (name, postings) in results {
        summary.push(format!("{name}={}", postings.len()));
        merged.extend(postings.into_iter().map(|mut p| {
            p.source_name = name.clone();
            p
        }));
    }

    let fetched = merged.len();
    let deduped = dedupe_by_url(merged);
    info!(
        "Aggregated {} postings ({fetched} before dedup) from {} sources: {}",
        deduped.len(),
        sources.len(),
        summary.join(", ")
    );
    deduped
}

/// One posting per `source_url`. On collision the later posting's data
/// replaces the earlier one in the earlier one's position.
pub fn dedupe_by_url(postings: Vec<NormalizedPosting>) -> Vec<NormalizedPosting> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(postings.len());
    let mut out: Vec<NormalizedPosting> = Vec::with_capacity(postings.len());
    for posting in postings {
        match index.get(&posting.source_url) {
            Some(&i) => out[i] = posting,
            None => {
                index.insert(posting.source_url.clone(), out.len());
                out.push(posting);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::models::posting::sample_posting;
    use crate::models::source::NewSourceDescriptor;
    use crate::sources::SourceError;
    use crate::store::memory::MemoryStore;

    struct Canned {
        name: &'static str,
        postings: Vec<NormalizedPosting>,
        delay: Duration,
    }

    impl Canned {
        fn new(name: &'static str, postings: Vec<NormalizedPosting>) -> Arc<dyn JobSource> {
            Arc::new(Self {
                name,
                postings,
                delay: Duration::ZERO,
            })
        }
    }

    #[async_trait]
    impl JobSource for Canned {
        fn name(&self) -> &str {
            self.name
        }

        async fn fetch_raw(
            &self,
            _skills: &[String],
            _limit: usize,
        ) -> Result<Vec<NormalizedPosting>, SourceError> {
            tokio::time::sleep(self.delay).await;
            Ok(self.postings.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl JobSource for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        async fn fetch_raw(
            &self,
            _skills: &[String],
            _limit: usize,
        ) -> Result<Vec<NormalizedPosting>, SourceError> {
            Err(SourceError::Status {
                url: "https://down.example.com".into(),
                status: 500,
            })
        }
    }

    fn skills() -> Vec<String> {
        vec!["rust".into()]
    }

    #[tokio::test]
    async fn test_identical_urls_across_sources_merge_to_one() {
        let mut a = sample_posting("Rust Engineer", "Acme", "Rust");
        a.description = "first copy".into();
        let mut b = a.clone();
        b.description = "second copy, Rust".into();

        let sources = vec![
            Canned::new("Alpha", vec![a, sample_posting("Rust Lead", "Acme", "Rust")]),
            Canned::new("Beta", vec![b]),
        ];
        let merged = aggregate(&sources, &skills(), 10, Duration::from_secs(1)).await;

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].title, "Rust Engineer");
        assert_eq!(merged[0].source_name, "Beta");
        assert_eq!(merged[0].description, "second copy, Rust");
        assert_eq!(merged[1].source_name, "Alpha");
    }

    #[tokio::test]
    async fn test_failed_and_slow_sources_do_not_abort() {
        let slow: Arc<dyn JobSource> = Arc::new(Canned {
            name: "Slow",
            postings: vec![sample_posting("Rust Dev", "Slowpoke", "Rust")],
            delay: Duration::from_secs(5),
        });
        let sources = vec![
            Arc::new(Failing) as Arc<dyn JobSource>,
            slow,
            Canned::new("Good", vec![sample_posting("Rust Engineer", "Acme", "Rust")]),
        ];
        let merged = aggregate(&sources, &skills(), 10, Duration::from_millis(100)).await;
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source_name, "Good");
    }

    #[tokio::test]
    async fn test_zero_sources_is_empty() {
        assert!(aggregate(&[], &skills(), 10, Duration::from_secs(1)).await.is_empty());
    }

    #[test]
    fn test_dedupe_keeps_position_of_first_and_data_of_last() {
        let mut first = sample_posting("A", "X", "one");
        first.source_url = "https://same".into();
        let middle = sample_posting("B", "Y", "two");
        let mut last = sample_posting("C", "Z", "three");
        last.source_url = "https://same".into();

        let out = dedupe_by_url(vec![first, middle, last]);
        let titles: Vec<&str> = out.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B"]);
    }

    #[tokio::test]
    async fn test_sources_for_includes_enabled_user_sources() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for (name, enabled) in [("Team Feed", true), ("Muted Feed", false)] {
            store
                .create_source(&NewSourceDescriptor {
                    user_id: user,
                    name: name.into(),
                    source_type: SourceType::Rss,
                    feed_url: Some("https://feeds.example.com/jobs.rss".into()),
                    api_endpoint: None,
                    api_key: None,
                    enabled,
                })
                .await
                .unwrap();
        }
        let mut broken = store.list_sources(user).await.unwrap()[0].clone();
        broken.name = "Broken".into();
        broken.feed_url = None;
        broken.enabled = true;

        let client = Client::new();
        let registry = SourceRegistry::with_builtins(
            client,
            Duration::from_secs(1),
            vec![Canned::new("Builtin", Vec::new())],
        );
        let mut descriptors = store.list_sources(user).await.unwrap();
        descriptors.push(broken);

        let names: Vec<String> = registry
            .sources_for(&descriptors)
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["Builtin", "Team Feed"]);
    }

    #[tokio::test]
    async fn test_health_report_marks_failures() {
        let store = MemoryStore::new();
        let registry = SourceRegistry::with_builtins(
            Client::new(),
            Duration::from_secs(1),
            vec![Arc::new(Failing) as Arc<dyn JobSource>, Canned::new("Good", Vec::new())],
        );
        let report = registry.health_report(&store, Uuid::new_v4()).await.unwrap();
        assert_eq!(report.len(), 2);
        assert!(!report[0].healthy);
        assert!(report[1].healthy);
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = SourceRegistry::new(Client::new(), Duration::from_secs(1));
        assert_eq!(
            registry.builtin_names(),
            vec!["Remotive", "RemoteOK", "Arbeitnow", "We Work Remotely"]
        );
    }
}
