//! In-memory repositories for unit tests. Mirrors the uniqueness and
//! increment-on-conflict semantics of the Postgres schema.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::opportunity::{NewOpportunity, Opportunity};
use crate::models::pattern::{PatternType, RejectionPattern};
use crate::models::profile::UserProfile;
use crate::models::skill::{DemandTrend, NewSighting, Skill, SkillUpsert};
use crate::models::source::{NewSourceDescriptor, SourceDescriptor};
use crate::store::{
    NotificationSink, OpportunityRepository, PatternRepository, ProfileRepository,
    SightingWindow, SkillRepository, SourceRepository, StoreResult, UpsertedSkill,
};

#[derive(Default)]
struct Inner {
    opportunities: Vec<Opportunity>,
    blocked: Vec<(Uuid, String)>,
    patterns: Vec<RejectionPattern>,
    skills: Vec<Skill>,
    sightings: Vec<NewSighting>,
    sources: Vec<SourceDescriptor>,
    profiles: Vec<UserProfile>,
    notifications: Vec<(Uuid, String, Uuid)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// Opportunity inserts allowed before every further insert fails.
    insert_budget: Mutex<Option<usize>>,
    inserts: AtomicUsize,
    fail_notify: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes opportunity inserts fail once `n` have succeeded.
    pub fn fail_inserts_after(&self, n: usize) {
        *self.insert_budget.lock().unwrap() = Some(n);
    }

    /// Makes every notification fail.
    pub fn fail_notifications(&self) {
        self.fail_notify.store(true, Ordering::SeqCst);
    }

    pub fn notifications(&self) -> Vec<(Uuid, String, Uuid)> {
        self.inner.lock().unwrap().notifications.clone()
    }

    pub fn pattern(&self, user_id: Uuid, kind: PatternType, value: &str) -> Option<i32> {
        self.inner
            .lock()
            .unwrap()
            .patterns
            .iter()
            .find(|p| p.user_id == user_id && p.pattern_type == kind && p.pattern_value == value)
            .map(|p| p.frequency)
    }

    pub fn all_opportunities(&self) -> Vec<Opportunity> {
        self.inner.lock().unwrap().opportunities.clone()
    }

    pub fn sightings(&self) -> Vec<NewSighting> {
        self.inner.lock().unwrap().sightings.clone()
    }

    /// Appends a sighting with an explicit timestamp, bypassing `upsert`.
    pub fn backdate_sighting(&self, skill_id: Uuid, at: DateTime<Utc>) {
        self.inner.lock().unwrap().sightings.push(NewSighting {
            skill_id,
            job_title: "Backfill".into(),
            company: None,
            source_url: None,
            is_required: true,
            proficiency_level: None,
            years_required: None,
            extracted_at: at,
        });
    }
}

fn conflicts(existing: &Opportunity, new: &NewOpportunity) -> bool {
    existing.user_id == new.user_id
        && !existing.archived
        && (existing.source_url == new.source_url
            || (existing.title.to_lowercase() == new.title.to_lowercase()
                && existing.company.to_lowercase() == new.company.to_lowercase()))
}

#[async_trait]
impl OpportunityRepository for MemoryStore {
    async fn list_active(&self, user_id: Uuid) -> StoreResult<Vec<Opportunity>> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<_> = inner
            .opportunities
            .iter()
            .filter(|o| o.user_id == user_id && !o.archived)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Opportunity>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .opportunities
            .iter()
            .find(|o| o.id == id && o.user_id == user_id)
            .cloned())
    }

    async fn exists_active(
        &self,
        user_id: Uuid,
        source_url: &str,
        title: &str,
        company: &str,
    ) -> StoreResult<bool> {
        let probe = NewOpportunity {
            user_id,
            title: title.to_string(),
            company: company.to_string(),
            description: String::new(),
            location: None,
            salary: None,
            source_url: source_url.to_string(),
            source_name: String::new(),
            posted_at: None,
            fit_score: 0,
        };
        let inner = self.inner.lock().unwrap();
        Ok(inner.opportunities.iter().any(|o| conflicts(o, &probe)))
    }

    async fn insert(&self, new: &NewOpportunity) -> StoreResult<Option<Opportunity>> {
        if let Some(budget) = *self.insert_budget.lock().unwrap() {
            if self.inserts.load(Ordering::SeqCst) >= budget {
                return Err(sqlx::Error::PoolTimedOut);
            }
        }

        let mut inner = self.inner.lock().unwrap();
        if inner.opportunities.iter().any(|o| conflicts(o, new)) {
            return Ok(None);
        }
        let row = Opportunity {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            title: new.title.clone(),
            company: new.company.clone(),
            description: new.description.clone(),
            location: new.location.clone(),
            salary: new.salary.clone(),
            source_url: new.source_url.clone(),
            source_name: new.source_name.clone(),
            posted_at: new.posted_at,
            fit_score: new.fit_score,
            created_at: Utc::now(),
            archived: false,
        };
        inner.opportunities.push(row.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(Some(row))
    }

    async fn archive(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .opportunities
            .iter_mut()
            .find(|o| o.id == id && o.user_id == user_id && !o.archived)
        {
            Some(o) => {
                o.archived = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.opportunities.len();
        inner
            .opportunities
            .retain(|o| !(o.id == id && o.user_id == user_id));
        Ok(inner.opportunities.len() < before)
    }

    async fn is_blocked(&self, user_id: Uuid, source_url: &str) -> StoreResult<bool> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .blocked
            .iter()
            .any(|(u, url)| *u == user_id && url == source_url))
    }

    async fn block(&self, user_id: Uuid, source_url: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner
            .blocked
            .iter()
            .any(|(u, url)| *u == user_id && url == source_url)
        {
            inner.blocked.push((user_id, source_url.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PatternRepository for MemoryStore {
    async fn increment(
        &self,
        user_id: Uuid,
        pattern_type: PatternType,
        pattern_value: &str,
    ) -> StoreResult<i32> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(p) = inner.patterns.iter_mut().find(|p| {
            p.user_id == user_id && p.pattern_type == pattern_type && p.pattern_value == pattern_value
        }) {
            p.frequency += 1;
            p.updated_at = Utc::now();
            return Ok(p.frequency);
        }
        inner.patterns.push(RejectionPattern {
            user_id,
            pattern_type,
            pattern_value: pattern_value.to_string(),
            frequency: 1,
            updated_at: Utc::now(),
        });
        Ok(1)
    }

    async fn list(&self, user_id: Uuid, min_frequency: i32) -> StoreResult<Vec<RejectionPattern>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .patterns
            .iter()
            .filter(|p| p.user_id == user_id && p.frequency >= min_frequency)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SkillRepository for MemoryStore {
    async fn upsert(&self, upsert: &SkillUpsert) -> StoreResult<UpsertedSkill> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(skill) = inner
            .skills
            .iter_mut()
            .find(|s| s.normalized_name == upsert.normalized_name)
        {
            skill.frequency += 1;
            for alias in &upsert.aliases {
                if !skill.aliases.contains(alias) {
                    skill.aliases.push(alias.clone());
                }
            }
            if skill.subcategory.is_none() {
                skill.subcategory = upsert.subcategory.clone();
            }
            skill.last_seen_at = skill.last_seen_at.max(upsert.seen_at);
            return Ok(UpsertedSkill {
                skill: skill.clone(),
                created: false,
            });
        }

        let skill = Skill {
            id: Uuid::new_v4(),
            name: upsert.name.clone(),
            normalized_name: upsert.normalized_name.clone(),
            category: upsert.category.clone(),
            subcategory: upsert.subcategory.clone(),
            aliases: upsert.aliases.clone(),
            frequency: 1,
            demand_trend: DemandTrend::Stable,
            last_seen_at: upsert.seen_at,
        };
        inner.skills.push(skill.clone());
        Ok(UpsertedSkill {
            skill,
            created: true,
        })
    }

    async fn append_sighting(&self, sighting: &NewSighting) -> StoreResult<()> {
        self.inner.lock().unwrap().sightings.push(sighting.clone());
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Skill>> {
        let mut skills = self.inner.lock().unwrap().skills.clone();
        skills.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| a.normalized_name.cmp(&b.normalized_name))
        });
        Ok(skills)
    }

    async fn sighting_windows(
        &self,
        previous_from: DateTime<Utc>,
        recent_from: DateTime<Utc>,
    ) -> StoreResult<Vec<SightingWindow>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .skills
            .iter()
            .map(|skill| {
                let mine = inner.sightings.iter().filter(|s| s.skill_id == skill.id);
                let recent = mine.clone().filter(|s| s.extracted_at >= recent_from).count();
                let previous = mine
                    .filter(|s| s.extracted_at >= previous_from && s.extracted_at < recent_from)
                    .count();
                SightingWindow {
                    skill_id: skill.id,
                    current_trend: skill.demand_trend,
                    recent: recent as i64,
                    previous: previous as i64,
                }
            })
            .collect())
    }

    async fn set_trend(&self, skill_id: Uuid, trend: DemandTrend) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(skill) = inner.skills.iter_mut().find(|s| s.id == skill_id) {
            skill.demand_trend = trend;
        }
        Ok(())
    }

    async fn total_sightings(&self) -> StoreResult<i64> {
        Ok(self.inner.lock().unwrap().sightings.len() as i64)
    }
}

#[async_trait]
impl SourceRepository for MemoryStore {
    async fn list_sources(&self, user_id: Uuid) -> StoreResult<Vec<SourceDescriptor>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sources
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_source(&self, new: &NewSourceDescriptor) -> StoreResult<SourceDescriptor> {
        let row = SourceDescriptor {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name.trim().to_string(),
            source_type: new.source_type.as_str().to_string(),
            feed_url: new.feed_url.clone(),
            api_endpoint: new.api_endpoint.clone(),
            api_key: new.api_key.clone(),
            enabled: new.enabled,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().sources.push(row.clone());
        Ok(row)
    }

    async fn set_source_enabled(
        &self,
        user_id: Uuid,
        id: Uuid,
        enabled: bool,
    ) -> StoreResult<Option<SourceDescriptor>> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner
            .sources
            .iter_mut()
            .find(|s| s.id == id && s.user_id == user_id)
            .map(|s| {
                s.enabled = enabled;
                s.clone()
            }))
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<UserProfile> {
        let mut inner = self.inner.lock().unwrap();
        inner.profiles.retain(|p| p.user_id != profile.user_id);
        inner.profiles.push(profile.clone());
        Ok(profile.clone())
    }
}

#[async_trait]
impl NotificationSink for MemoryStore {
    async fn notify(&self, user_id: Uuid, message: &str, opportunity_id: Uuid) -> StoreResult<()> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner
            .lock()
            .unwrap()
            .notifications
            .push((user_id, message.to_string(), opportunity_id));
        Ok(())
    }
}
