//! Persistence seams for the pipeline.
//!
//! Pipeline logic depends only on these traits. `PgStore` implements all of
//! them against Postgres; tests use `memory::MemoryStore`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::opportunity::{NewOpportunity, Opportunity};
use crate::models::pattern::{PatternType, RejectionPattern};
use crate::models::profile::UserProfile;
use crate::models::skill::{DemandTrend, NewSighting, Skill, SkillUpsert};
use crate::models::source::{NewSourceDescriptor, SourceDescriptor};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait OpportunityRepository: Send + Sync {
    /// Non-archived opportunities, newest first.
    async fn list_active(&self, user_id: Uuid) -> StoreResult<Vec<Opportunity>>;

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Opportunity>>;

    /// True when a non-archived opportunity shares `source_url`, or shares
    /// `(title, company)` case-insensitively.
    async fn exists_active(
        &self,
        user_id: Uuid,
        source_url: &str,
        title: &str,
        company: &str,
    ) -> StoreResult<bool>;

    /// Uniqueness-guarded insert. `None` means the row already existed.
    async fn insert(&self, new: &NewOpportunity) -> StoreResult<Option<Opportunity>>;

    async fn archive(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    async fn is_blocked(&self, user_id: Uuid, source_url: &str) -> StoreResult<bool>;

    async fn block(&self, user_id: Uuid, source_url: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait PatternRepository: Send + Sync {
    /// Insert with frequency 1, or increment on conflict. Returns the new frequency.
    async fn increment(
        &self,
        user_id: Uuid,
        pattern_type: PatternType,
        pattern_value: &str,
    ) -> StoreResult<i32>;

    async fn list(&self, user_id: Uuid, min_frequency: i32) -> StoreResult<Vec<RejectionPattern>>;
}

/// Result of `SkillRepository::upsert`.
#[derive(Debug, Clone)]
pub struct UpsertedSkill {
    pub skill: Skill,
    pub created: bool,
}

/// Sighting counts for one skill across the two trailing trend windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SightingWindow {
    pub skill_id: Uuid,
    pub current_trend: DemandTrend,
    pub recent: i64,
    pub previous: i64,
}

#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// Creates the skill with frequency 1 and a stable trend, or increments
    /// frequency, unions aliases and refreshes `last_seen_at`.
    async fn upsert(&self, skill: &SkillUpsert) -> StoreResult<UpsertedSkill>;

    async fn append_sighting(&self, sighting: &NewSighting) -> StoreResult<()>;

    async fn list_all(&self) -> StoreResult<Vec<Skill>>;

    /// Per skill: sightings in `[recent_from, now]` and in `[previous_from, recent_from)`.
    async fn sighting_windows(
        &self,
        previous_from: DateTime<Utc>,
        recent_from: DateTime<Utc>,
    ) -> StoreResult<Vec<SightingWindow>>;

    async fn set_trend(&self, skill_id: Uuid, trend: DemandTrend) -> StoreResult<()>;

    async fn total_sightings(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn list_sources(&self, user_id: Uuid) -> StoreResult<Vec<SourceDescriptor>>;

    async fn create_source(&self, new: &NewSourceDescriptor) -> StoreResult<SourceDescriptor>;

    async fn set_source_enabled(
        &self,
        user_id: Uuid,
        id: Uuid,
        enabled: bool,
    ) -> StoreResult<Option<SourceDescriptor>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>>;

    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<UserProfile>;
}

/// Receives a short message and a reference to the created opportunity.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: Uuid, message: &str, opportunity_id: Uuid) -> StoreResult<()>;
}

/// Every repository the scan pipeline touches, behind one bound.
pub trait Store:
    OpportunityRepository
    + PatternRepository
    + SkillRepository
    + SourceRepository
    + ProfileRepository
    + NotificationSink
{
}

impl<T> Store for T where
    T: OpportunityRepository
        + PatternRepository
        + SkillRepository
        + SourceRepository
        + ProfileRepository
        + NotificationSink
{
}
