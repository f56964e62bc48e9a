//! Aggregated activity statistics for the admin dashboard.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Serialize, FromRow)]
pub struct ActionCount {
    pub action: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct MethodCount {
    pub method: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct StatusCount {
    pub status_code: i32,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct DateCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct UserActivity {
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RouteCount {
    pub route: String,
    pub method: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub days: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub total_logs: i64,
    pub logs_by_action: Vec<ActionCount>,
    pub logs_by_method: Vec<MethodCount>,
    pub logs_by_status_code: Vec<StatusCount>,
    pub logs_by_date: Vec<DateCount>,
    pub top_users: Vec<UserActivity>,
    pub top_routes: Vec<RouteCount>,
    pub error_rate: f64,
    pub date_range: DateRange,
}

/// Builds the full report over the trailing `days`-day window.
pub async fn build_report(db: &PgPool, days: i64) -> Result<AnalyticsReport, AppError> {
    let end = Utc::now();
    let start = end - Duration::days(days);

    let total_logs: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE timestamp >= $1")
            .bind(start)
            .fetch_one(db)
            .await?;

    let logs_by_action = sqlx::query_as::<_, ActionCount>(
        "SELECT action, COUNT(*) AS count FROM activity_logs \
         WHERE timestamp >= $1 GROUP BY action ORDER BY count DESC",
    )
    .bind(start)
    .fetch_all(db)
    .await?;

    let logs_by_method = sqlx::query_as::<_, MethodCount>(
        "SELECT method, COUNT(*) AS count FROM activity_logs \
         WHERE timestamp >= $1 GROUP BY method ORDER BY count DESC",
    )
    .bind(start)
    .fetch_all(db)
    .await?;

    let logs_by_status_code = sqlx::query_as::<_, StatusCount>(
        "SELECT status_code, COUNT(*) AS count FROM activity_logs \
         WHERE timestamp >= $1 GROUP BY status_code ORDER BY count DESC",
    )
    .bind(start)
    .fetch_all(db)
    .await?;

    let logs_by_date = sqlx::query_as::<_, DateCount>(
        "SELECT to_char(timestamp, 'YYYY-MM-DD') AS date, COUNT(*) AS count \
         FROM activity_logs WHERE timestamp >= $1 \
         GROUP BY date ORDER BY date ASC",
    )
    .bind(start)
    .fetch_all(db)
    .await?;

    let top_users = sqlx::query_as::<_, UserActivity>(
        "SELECT l.user_id, u.name AS user_name, u.email AS user_email, COUNT(*) AS count \
         FROM activity_logs l LEFT JOIN users u ON u.id = l.user_id \
         WHERE l.timestamp >= $1 \
         GROUP BY l.user_id, u.name, u.email ORDER BY count DESC LIMIT 10",
    )
    .bind(start)
    .fetch_all(db)
    .await?;

    let top_routes = sqlx::query_as::<_, RouteCount>(
        "SELECT route, method, COUNT(*) AS count FROM activity_logs \
         WHERE timestamp >= $1 GROUP BY route, method ORDER BY count DESC LIMIT 10",
    )
    .bind(start)
    .fetch_all(db)
    .await?;

    let errors: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM activity_logs WHERE timestamp >= $1 AND status_code >= 400",
    )
    .bind(start)
    .fetch_one(db)
    .await?;

    Ok(AnalyticsReport {
        total_logs,
        logs_by_action,
        logs_by_method,
        logs_by_status_code,
        logs_by_date,
        top_users,
        top_routes,
        error_rate: error_rate(errors, total_logs),
        date_range: DateRange { start, end, days },
    })
}

fn error_rate(errors: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = errors as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_rate_two_decimals() {
        assert_eq!(error_rate(0, 0), 0.0);
        assert_eq!(error_rate(0, 50), 0.0);
        assert_eq!(error_rate(1, 3), 33.33);
        assert_eq!(error_rate(2, 3), 66.67);
        assert_eq!(error_rate(50, 50), 100.0);
    }
}
