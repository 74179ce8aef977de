use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::scan::ScanSettings;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Absent means every reasoning call falls back to the heuristics.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub source_timeout: Duration,
    pub llm_timeout: Duration,
    pub scan_concurrency: usize,
    pub source_fetch_limit: usize,
    pub extract_skills_on_scan: bool,
    /// Zero disables the periodic trend refresh.
    pub skill_trend_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            port: env_or("PORT", 8080u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            source_timeout: Duration::from_secs(env_or("SOURCE_TIMEOUT_SECS", 20u64)?),
            llm_timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 60u64)?),
            scan_concurrency: env_or("SCAN_CONCURRENCY", 4usize)?.max(1),
            source_fetch_limit: env_or("SOURCE_FETCH_LIMIT", 50usize)?,
            extract_skills_on_scan: env_or("EXTRACT_SKILLS_ON_SCAN", true)?,
            skill_trend_interval: Duration::from_secs(env_or(
                "SKILL_TREND_INTERVAL_SECS",
                21_600u64,
            )?),
        })
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            concurrency: self.scan_concurrency,
            fetch_limit: self.source_fetch_limit,
            extract_skills: self.extract_skills_on_scan,
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}
