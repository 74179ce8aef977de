use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Rss,
    Api,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Rss => "rss",
            SourceType::Api => "api",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rss" => Some(SourceType::Rss),
            "api" => Some(SourceType::Api),
            _ => None,
        }
    }
}

/// A user-configured feed. Data-driven: a URL plus a type, never code.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SourceDescriptor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub source_type: String,
    pub feed_url: Option<String>,
    pub api_endpoint: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl SourceDescriptor {
    pub fn kind(&self) -> Option<SourceType> {
        SourceType::parse(&self.source_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSourceDescriptor {
    pub user_id: Uuid,
    pub name: String,
    pub source_type: SourceType,
    pub feed_url: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl NewSourceDescriptor {
    /// An rss source needs a feed URL; an api source needs an endpoint.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        let url = match self.source_type {
            SourceType::Rss => self.feed_url.as_deref(),
            SourceType::Api => self.api_endpoint.as_deref(),
        };
        match url {
            Some(u) if u.starts_with("http://") || u.starts_with("https://") => Ok(()),
            Some(_) => Err("source URL must be http(s)".to_string()),
            None => Err(format!(
                "{} sources require {}",
                self.source_type.as_str(),
                match self.source_type {
                    SourceType::Rss => "feed_url",
                    SourceType::Api => "api_endpoint",
                }
            )),
        }
    }
}
