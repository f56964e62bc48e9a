//! A user's own view of their activity trail.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::activity::ActivityLogRow;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/activity-logs
pub async fn list_own_logs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = (page - 1) * limit;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE user_id = $1")
        .bind(user.id)
        .fetch_one(&state.db)
        .await?;
    let logs = sqlx::query_as::<_, ActivityLogRow>(
        "SELECT * FROM activity_logs WHERE user_id = $1 \
         ORDER BY timestamp DESC LIMIT $2 OFFSET $3",
    )
    .bind(user.id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({
        "logs": logs,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": total_pages(total, limit),
        }
    })))
}

#[derive(Debug, Serialize, FromRow)]
struct ActionStat {
    action: String,
    count: i64,
    last_occurrence: Option<DateTime<Utc>>,
}

/// GET /api/activity-logs/stats
pub async fn own_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, AppError> {
    let stats = sqlx::query_as::<_, ActionStat>(
        "SELECT action, COUNT(*) AS count, MAX(timestamp) AS last_occurrence \
         FROM activity_logs WHERE user_id = $1 \
         GROUP BY action ORDER BY count DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(json!({ "stats": stats })))
}

/// DELETE /api/activity-logs
pub async fn clear_own_logs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>, AppError> {
    let result = sqlx::query("DELETE FROM activity_logs WHERE user_id = $1")
        .bind(user.id)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({ "deleted": result.rows_affected() })))
}

fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(total_pages(0, 50), 0);
        assert_eq!(total_pages(1, 50), 1);
        assert_eq!(total_pages(50, 50), 1);
        assert_eq!(total_pages(51, 50), 2);
        assert_eq!(total_pages(101, 20), 6);
    }
}
