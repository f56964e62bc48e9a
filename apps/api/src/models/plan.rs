#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// One step of a career timeline. Embedded in the plan row as JSONB;
/// produced only by the phase normalizer, so every instance already has a
/// non-empty title and a dense 1-based `order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_days: Option<f64>,
    pub duration_weeks: Option<f64>,
    pub order: i64,
    #[serde(default)]
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TimelinePlan {
    pub id: Uuid,
    /// Absent for unauthenticated generation; set at most once by a claim.
    pub owner_id: Option<Uuid>,
    pub current_skills: Vec<String>,
    pub target_job: String,
    pub timeframe_months: i64,
    pub additional_context: Option<Value>,
    pub phase_count: i64,
    pub approx_months: i64,
    pub mermaid_code: Option<String>,
    pub phases: Json<Vec<Phase>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
