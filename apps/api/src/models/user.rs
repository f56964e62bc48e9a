#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_SKILL_LEVEL: &str = "Beginner";
pub const DEFAULT_SKILL_CATEGORY: &str = "Other";

/// One profile skill. Stored inside `users.skills` as JSONB. Entries written
/// before the defaults existed may lack level or category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub verified: bool,
}

fn default_level() -> String {
    DEFAULT_SKILL_LEVEL.to_string()
}

fn default_category() -> String {
    DEFAULT_SKILL_CATEGORY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub skills: Json<Vec<Skill>>,
    pub preferences: Option<Value>,
    /// Opaque bearer credential. Issued out of band; never serialized.
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Skill names, in profile order.
    pub fn skill_names(&self) -> Vec<String> {
        self.skills.0.iter().map(|s| s.name.clone()).collect()
    }
}
