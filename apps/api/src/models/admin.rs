#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Per-admin capability flags, stored as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPermissions {
    #[serde(default = "default_true")]
    pub view_logs: bool,
    #[serde(default = "default_true")]
    pub manage_logs: bool,
    #[serde(default)]
    pub manage_admins: bool,
    #[serde(default)]
    pub manage_users: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AdminPermissions {
    fn default() -> Self {
        AdminPermissions {
            view_logs: true,
            manage_logs: true,
            manage_admins: false,
            manage_users: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// "admin" or "super_admin". Super admins bypass permission flags.
    pub role: String,
    /// "active", "inactive", or "suspended". Only active admins resolve.
    pub status: String,
    pub permissions: Json<AdminPermissions>,
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminRow {
    pub fn is_super_admin(&self) -> bool {
        self.role == ROLE_SUPER_ADMIN
    }
}
