use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::warn;
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

/// Postgres-backed implementation of every repository trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PatternRow {
    user_id: Uuid,
    pattern_type: String,
    pattern_value: String,
    frequency: i32,
    updated_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SkillRow {
    id: Uuid,
    name: String,
    normalized_name: String,
    category: String,
    subcategory: Option<String>,
    aliases: Vec<String>,
    frequency: i32,
    demand_trend: String,
    last_seen_at: DateTime<Utc>,
}

impl From<SkillRow> for Skill {
    fn from(row: SkillRow) -> Self {
        Skill {
            id: row.id,
            name: row.name,
            normalized_name: row.normalized_name,
            category: row.category,
            subcategory: row.subcategory,
            aliases: row.aliases,
            frequency: row.frequency,
            demand_trend: row.demand_trend.parse().unwrap_or_default(),
            last_seen_at: row.last_seen_at,
        }
    }
}

#[derive(FromRow)]
struct UpsertedSkillRow {
    #[sqlx(flatten)]
    skill: SkillRow,
    created: bool,
}

#[derive(FromRow)]
struct WindowRow {
    skill_id: Uuid,
    demand_trend: String,
    recent: i64,
    previous: i64,
}

const SKILL_COLUMNS: &str =
    "id, name, normalized_name, category, subcategory, aliases, frequency, demand_trend, last_seen_at";

#[async_trait]
impl OpportunityRepository for PgStore {
    async fn list_active(&self, user_id: Uuid) -> StoreResult<Vec<Opportunity>> {
        sqlx::query_as::<_, Opportunity>(
            "SELECT * FROM opportunities WHERE user_id = $1 AND NOT archived ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Opportunity>> {
        sqlx::query_as::<_, Opportunity>(
            "SELECT * FROM opportunities WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn exists_active(
        &self,
        user_id: Uuid,
        source_url: &str,
        title: &str,
        company: &str,
    ) -> StoreResult<bool> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM opportunities
                WHERE user_id = $1 AND NOT archived
                  AND (source_url = $2 OR (lower(title) = lower($3) AND lower(company) = lower($4)))
            )
            "#,
        )
        .bind(user_id)
        .bind(source_url)
        .bind(title)
        .bind(company)
        .fetch_one(&self.pool)
        .await
    }

    async fn insert(&self, new: &NewOpportunity) -> StoreResult<Option<Opportunity>> {
        // Both partial unique indexes guard this insert; a conflict on either is "already known".
        sqlx::query_as::<_, Opportunity>(
            r#"
            INSERT INTO opportunities
                (user_id, title, company, description, location, salary,
                 source_url, source_name, posted_at, fit_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT DO NOTHING
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(&new.title)
        .bind(&new.company)
        .bind(&new.description)
        .bind(&new.location)
        .bind(&new.salary)
        .bind(&new.source_url)
        .bind(&new.source_name)
        .bind(new.posted_at)
        .bind(new.fit_score)
        .fetch_optional(&self.pool)
        .await
    }

    async fn archive(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE opportunities SET archived = TRUE WHERE id = $1 AND user_id = $2 AND NOT archived",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM opportunities WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_blocked(&self, user_id: Uuid, source_url: &str) -> StoreResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM blocked_jobs WHERE user_id = $1 AND source_url = $2)",
        )
        .bind(user_id)
        .bind(source_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn block(&self, user_id: Uuid, source_url: &str) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO blocked_jobs (user_id, source_url) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(source_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PatternRepository for PgStore {
    async fn increment(
        &self,
        user_id: Uuid,
        pattern_type: PatternType,
        pattern_value: &str,
    ) -> StoreResult<i32> {
        sqlx::query_scalar(
            r#"
            INSERT INTO rejection_patterns (user_id, pattern_type, pattern_value)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, pattern_type, pattern_value)
            DO UPDATE SET frequency = rejection_patterns.frequency + 1, updated_at = now()
            RETURNING frequency
            "#,
        )
        .bind(user_id)
        .bind(pattern_type.as_str())
        .bind(pattern_value)
        .fetch_one(&self.pool)
        .await
    }

    async fn list(&self, user_id: Uuid, min_frequency: i32) -> StoreResult<Vec<RejectionPattern>> {
        let rows = sqlx::query_as::<_, PatternRow>(
            r#"
            SELECT user_id, pattern_type, pattern_value, frequency, updated_at
            FROM rejection_patterns
            WHERE user_id = $1 AND frequency >= $2
            ORDER BY frequency DESC, pattern_type, pattern_value
            "#,
        )
        .bind(user_id)
        .bind(min_frequency)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match row.pattern_type.parse::<PatternType>() {
                Ok(pattern_type) => Some(RejectionPattern {
                    user_id: row.user_id,
                    pattern_type,
                    pattern_value: row.pattern_value,
                    frequency: row.frequency,
                    updated_at: row.updated_at,
                }),
                Err(e) => {
                    warn!("Skipping rejection pattern row: {e}");
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl SkillRepository for PgStore {
    async fn upsert(&self, skill: &SkillUpsert) -> StoreResult<UpsertedSkill> {
        // xmax = 0 only for a freshly inserted tuple.
        let row = sqlx::query_as::<_, UpsertedSkillRow>(&format!(
            r#"
            INSERT INTO skills
                (name, normalized_name, category, subcategory, aliases, frequency, demand_trend, last_seen_at)
            VALUES ($1, $2, $3, $4, $5, 1, 'stable', $6)
            ON CONFLICT (normalized_name) DO UPDATE SET
                frequency = skills.frequency + 1,
                aliases = ARRAY(SELECT DISTINCT a FROM unnest(skills.aliases || EXCLUDED.aliases) AS a),
                subcategory = COALESCE(skills.subcategory, EXCLUDED.subcategory),
                last_seen_at = GREATEST(skills.last_seen_at, EXCLUDED.last_seen_at)
            RETURNING {SKILL_COLUMNS}, (xmax = 0) AS created
            "#
        ))
        .bind(&skill.name)
        .bind(&skill.normalized_name)
        .bind(&skill.category)
        .bind(&skill.subcategory)
        .bind(&skill.aliases)
        .bind(skill.seen_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(UpsertedSkill {
            skill: row.skill.into(),
            created: row.created,
        })
    }

    async fn append_sighting(&self, sighting: &NewSighting) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO skill_sightings
                (skill_id, job_title, company, source_url, is_required,
                 proficiency_level, years_required, extracted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(sighting.skill_id)
        .bind(&sighting.job_title)
        .bind(&sighting.company)
        .bind(&sighting.source_url)
        .bind(sighting.is_required)
        .bind(&sighting.proficiency_level)
        .bind(sighting.years_required)
        .bind(sighting.extracted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Skill>> {
        let rows = sqlx::query_as::<_, SkillRow>(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills ORDER BY frequency DESC, normalized_name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Skill::from).collect())
    }

    async fn sighting_windows(
        &self,
        previous_from: DateTime<Utc>,
        recent_from: DateTime<Utc>,
    ) -> StoreResult<Vec<SightingWindow>> {
        let rows = sqlx::query_as::<_, WindowRow>(
            r#"
            SELECT s.id AS skill_id,
                   s.demand_trend,
                   COUNT(ss.id) FILTER (WHERE ss.extracted_at >= $2) AS recent,
                   COUNT(ss.id) FILTER (WHERE ss.extracted_at < $2) AS previous
            FROM skills s
            LEFT JOIN skill_sightings ss
                   ON ss.skill_id = s.id AND ss.extracted_at >= $1
            GROUP BY s.id, s.demand_trend
            "#,
        )
        .bind(previous_from)
        .bind(recent_from)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SightingWindow {
                skill_id: row.skill_id,
                current_trend: row.demand_trend.parse().unwrap_or_default(),
                recent: row.recent,
                previous: row.previous,
            })
            .collect())
    }

    async fn set_trend(&self, skill_id: Uuid, trend: DemandTrend) -> StoreResult<()> {
        sqlx::query("UPDATE skills SET demand_trend = $1 WHERE id = $2")
            .bind(trend.as_str())
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn total_sightings(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM skill_sightings")
            .fetch_one(&self.pool)
            .await
    }
}

#[async_trait]
impl SourceRepository for PgStore {
    async fn list_sources(&self, user_id: Uuid) -> StoreResult<Vec<SourceDescriptor>> {
        sqlx::query_as::<_, SourceDescriptor>(
            "SELECT * FROM job_sources WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_source(&self, new: &NewSourceDescriptor) -> StoreResult<SourceDescriptor> {
        sqlx::query_as::<_, SourceDescriptor>(
            r#"
            INSERT INTO job_sources
                (user_id, name, source_type, feed_url, api_endpoint, api_key, enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(new.user_id)
        .bind(new.name.trim())
        .bind(new.source_type.as_str())
        .bind(&new.feed_url)
        .bind(&new.api_endpoint)
        .bind(&new.api_key)
        .bind(new.enabled)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_source_enabled(
        &self,
        user_id: Uuid,
        id: Uuid,
        enabled: bool,
    ) -> StoreResult<Option<SourceDescriptor>> {
        sqlx::query_as::<_, SourceDescriptor>(
            "UPDATE job_sources SET enabled = $1 WHERE id = $2 AND user_id = $3 RETURNING *",
        )
        .bind(enabled)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM user_profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> StoreResult<UserProfile> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles
                (user_id, primary_skills, secondary_skills, learning_skills, years_of_experience,
                 seniority_level, work_history, preferred_titles, industries,
                 work_location_preference, min_fit_score, max_posting_age_days)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id) DO UPDATE SET
                primary_skills = EXCLUDED.primary_skills,
                secondary_skills = EXCLUDED.secondary_skills,
                learning_skills = EXCLUDED.learning_skills,
                years_of_experience = EXCLUDED.years_of_experience,
                seniority_level = EXCLUDED.seniority_level,
                work_history = EXCLUDED.work_history,
                preferred_titles = EXCLUDED.preferred_titles,
                industries = EXCLUDED.industries,
                work_location_preference = EXCLUDED.work_location_preference,
                min_fit_score = EXCLUDED.min_fit_score,
                max_posting_age_days = EXCLUDED.max_posting_age_days,
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.primary_skills)
        .bind(&profile.secondary_skills)
        .bind(&profile.learning_skills)
        .bind(profile.years_of_experience)
        .bind(&profile.seniority_level)
        .bind(Json(&profile.work_history))
        .bind(&profile.preferred_titles)
        .bind(&profile.industries)
        .bind(&profile.work_location_preference)
        .bind(profile.min_fit_score)
        .bind(profile.max_posting_age_days)
        .fetch_one(&self.pool)
        .await
    }
}

#[async_trait]
impl NotificationSink for PgStore {
    async fn notify(&self, user_id: Uuid, message: &str, opportunity_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO notifications (user_id, message, opportunity_id) VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(message)
        .bind(opportunity_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
