//! Admin-side activity log browsing, analytics, export, and retention.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::activity::actions;
use crate::admin::analytics;
use crate::auth::CurrentAdmin;
use crate::errors::AppError;
use crate::state::AppState;

/// Log row joined with the acting user's name and email, when the user
/// still exists.
#[derive(Debug, Serialize, FromRow)]
pub struct LogWithUser {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub action: String,
    pub description: String,
    pub method: String,
    pub route: String,
    pub status_code: i32,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

const SELECT_WITH_USER: &str =
    "SELECT l.id, l.user_id, l.action, l.description, l.method, l.route, \
     l.status_code, l.ip_address, l.user_agent, l.error_message, l.metadata, \
     l.timestamp, u.name AS user_name, u.email AS user_email \
     FROM activity_logs l LEFT JOIN users u ON u.id = l.user_id WHERE 1 = 1";

const SORTABLE_COLUMNS: &[&str] = &["timestamp", "action", "method", "status_code", "route"];

#[derive(Debug, Default, Deserialize)]
pub struct LogListQuery {
    pub action: Option<String>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

fn apply_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &'a LogListQuery) {
    if let Some(action) = &query.action {
        builder.push(" AND l.action = ").push_bind(action);
    }
    if let Some(user_id) = query.user_id {
        builder.push(" AND l.user_id = ").push_bind(user_id);
    }
    if let Some(start) = query.start_date {
        builder.push(" AND l.timestamp >= ").push_bind(start_of_day(start));
    }
    if let Some(end) = query.end_date {
        builder.push(" AND l.timestamp <= ").push_bind(end_of_day(end));
    }
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        builder
            .push(" AND (l.route ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR l.error_message ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn resolve_sort(requested: Option<&str>) -> &'static str {
    SORTABLE_COLUMNS
        .iter()
        .find(|column| Some(**column) == requested)
        .copied()
        .unwrap_or("timestamp")
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    date.and_time(end).and_utc()
}

/// GET /api/admin/logs
pub async fn list_logs(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(query): Query<LogListQuery>,
) -> Result<Json<Value>, AppError> {
    admin.require_permission(|p| p.view_logs)?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = (page - 1) * limit;
    // Only whitelisted column names reach the SQL text; everything else
    // goes through bind parameters.
    let sort_column = resolve_sort(query.sort_by.as_deref());
    let descending = !matches!(query.order.as_deref(), Some("asc") | Some("ASC"));

    let mut count_builder =
        QueryBuilder::new("SELECT COUNT(*) FROM activity_logs l WHERE 1 = 1");
    apply_filters(&mut count_builder, &query);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&state.db)
        .await?;

    let mut builder = QueryBuilder::new(SELECT_WITH_USER);
    apply_filters(&mut builder, &query);
    builder.push(format!(
        " ORDER BY l.{sort_column} {}",
        if descending { "DESC" } else { "ASC" }
    ));
    builder.push(" LIMIT ").push_bind(limit);
    builder.push(" OFFSET ").push_bind(offset);
    let logs: Vec<LogWithUser> = builder.build_query_as().fetch_all(&state.db).await?;

    Ok(Json(json!({
        "logs": logs,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": if total == 0 { 0 } else { (total + limit - 1) / limit },
        }
    })))
}

/// GET /api/admin/logs/:id
pub async fn get_log(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    admin.require_permission(|p| p.view_logs)?;

    let sql = format!("{SELECT_WITH_USER} AND l.id = $1");
    let log = sqlx::query_as::<_, LogWithUser>(&sql)
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity log {id} not found")))?;

    Ok(Json(json!({ "log": log })))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/admin/logs/action/:action
pub async fn logs_by_action(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Path(action): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    admin.require_permission(|p| p.view_logs)?;
    if !actions::is_known_action(&action) {
        return Err(AppError::Validation(format!("Unknown action type: {action}")));
    }

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 200);
    let offset = (page - 1) * limit;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activity_logs WHERE action = $1")
        .bind(&action)
        .fetch_one(&state.db)
        .await?;
    let sql = format!(
        "{SELECT_WITH_USER} AND l.action = $1 ORDER BY l.timestamp DESC LIMIT $2 OFFSET $3"
    );
    let logs = sqlx::query_as::<_, LogWithUser>(&sql)
        .bind(&action)
        .bind(limit)
        .bind(offset)
        .fetch_all(&state.db)
        .await?;

    Ok(Json(json!({
        "action": action,
        "logs": logs,
        "pagination": {
            "page": page,
            "limit": limit,
            "total": total,
            "pages": if total == 0 { 0 } else { (total + limit - 1) / limit },
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

/// GET /api/admin/logs/analytics/stats
pub async fn analytics_stats(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>, AppError> {
    admin.require_permission(|p| p.view_logs)?;

    let days = query.days.unwrap_or(7).clamp(1, 365);
    let report = analytics::build_report(&state.db, days).await?;
    Ok(Json(json!({ "analytics": report })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub action: Option<String>,
}

const EXPORT_ROW_CAP: i64 = 10_000;

const EXPORT_HEADER: &str =
    "Timestamp,User,Email,Action,Route,Method,Status Code,Description,Error Message";

/// GET /api/admin/logs/export
pub async fn export_csv(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    admin.require_permission(|p| p.view_logs)?;

    let filters = LogListQuery {
        action: query.action,
        start_date: query.start_date,
        end_date: query.end_date,
        ..LogListQuery::default()
    };
    let mut builder = QueryBuilder::new(SELECT_WITH_USER);
    apply_filters(&mut builder, &filters);
    builder.push(" ORDER BY l.timestamp DESC LIMIT ").push_bind(EXPORT_ROW_CAP);
    let rows: Vec<LogWithUser> = builder.build_query_as().fetch_all(&state.db).await?;

    let mut csv = String::from(EXPORT_HEADER);
    csv.push('\n');
    for row in &rows {
        let fields = [
            row.timestamp.to_rfc3339(),
            row.user_name.clone().unwrap_or_else(|| "Unknown".to_string()),
            row.user_email.clone().unwrap_or_default(),
            row.action.clone(),
            row.route.clone(),
            row.method.clone(),
            row.status_code.to_string(),
            row.description.clone(),
            row.error_message.clone().unwrap_or_default(),
        ];
        let line: Vec<String> = fields.iter().map(|field| csv_escape(field)).collect();
        csv.push_str(&line.join(","));
        csv.push('\n');
    }

    let filename = format!("activity-logs-{}.csv", Utc::now().format("%Y-%m-%d"));
    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ),
    ];
    Ok((headers, csv).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    pub days_old: Option<i64>,
}

/// DELETE /api/admin/logs/cleanup
pub async fn cleanup_logs(
    State(state): State<AppState>,
    admin: CurrentAdmin,
    Query(query): Query<CleanupQuery>,
) -> Result<Json<Value>, AppError> {
    admin.require_super_admin()?;

    let days_old = query.days_old.unwrap_or(90);
    if days_old < 30 {
        return Err(AppError::Validation(
            "days_old must be at least 30".to_string(),
        ));
    }

    let cutoff = Utc::now() - Duration::days(days_old);
    let result = sqlx::query("DELETE FROM activity_logs WHERE timestamp < $1")
        .bind(cutoff)
        .execute(&state.db)
        .await?;

    Ok(Json(json!({
        "deleted": result.rows_affected(),
        "cutoff": cutoff,
    })))
}

fn csv_escape(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escape_always_quotes() {
        assert_eq!(csv_escape("plain"), "\"plain\"");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!(resolve_sort(Some("action")), "action");
        assert_eq!(resolve_sort(Some("status_code")), "status_code");
        assert_eq!(resolve_sort(Some("timestamp; DROP TABLE users")), "timestamp");
        assert_eq!(resolve_sort(None), "timestamp");
    }

    #[test]
    fn test_day_bounds_cover_the_whole_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let start = start_of_day(date);
        let end = end_of_day(date);
        assert!(start < end);
        assert!(start.to_rfc3339().starts_with("2024-03-05T00:00:00"));
        assert!(end.to_rfc3339().starts_with("2024-03-05T23:59:59.999"));
    }
}
