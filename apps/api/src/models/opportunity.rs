use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::posting::NormalizedPosting;

/// A posting that has been scored and persisted for a specific user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Opportunity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub fit_score: i32,
    pub created_at: DateTime<Utc>,
    pub archived: bool,
}

/// Insert payload for an opportunity. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewOpportunity {
    pub user_id: Uuid,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub source_url: String,
    pub source_name: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub fit_score: i32,
}

impl NewOpportunity {
    pub fn from_posting(user_id: Uuid, posting: &NormalizedPosting, fit_score: i32) -> Self {
        Self {
            user_id,
            title: posting.title.clone(),
            company: posting.company.clone(),
            description: posting.description.clone(),
            location: posting.location.clone(),
            salary: posting.salary.clone(),
            source_url: posting.source_url.clone(),
            source_name: posting.source_name.clone(),
            posted_at: posting.posted_at,
            fit_score,
        }
    }
}
