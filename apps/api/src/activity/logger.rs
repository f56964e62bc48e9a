//! Post-response activity logging.
//!
//! The middleware observes every `/api` request after its handler has run
//! and records who did what. Recording is fire-and-forget: the insert runs
//! on a spawned task and a storage failure is only a warning, never a
//! change to the response.

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, Extensions, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use sqlx::PgPool;
use std::net::SocketAddr;
use tracing::warn;

use crate::activity::actions;
use crate::auth::AuthContext;
use crate::models::activity::NewActivityLog;
use crate::state::AppState;

pub async fn activity_logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let ip_address = client_ip(request.headers(), request.extensions());
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let context = request
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .unwrap_or_default();

    let response = next.run(request).await;

    // Only the API surface is recorded; health probes stay out.
    if !path.starts_with("/api") || actions::should_skip(&path) {
        return response;
    }
    // Anonymous traffic has no principal to attribute the entry to.
    let Some(user) = context.user else {
        return response;
    };

    let status = response.status();
    let entry = NewActivityLog {
        user_id: user.id,
        action: actions::classify(&method, &path, status.as_u16()),
        description: format!("{method} {path}"),
        method,
        route: path,
        status_code: status.as_u16() as i32,
        ip_address,
        user_agent,
        error_message: (status.as_u16() >= 400).then(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        }),
        metadata: None,
    };

    let db = state.db.clone();
    tokio::spawn(async move {
        if let Err(e) = insert_log(&db, &entry).await {
            warn!("failed to record activity log: {e}");
        }
    });

    response
}

/// First token of `x-forwarded-for` when the service sits behind a proxy,
/// the peer address otherwise.
fn client_ip(headers: &HeaderMap, extensions: &Extensions) -> Option<String> {
    forwarded_ip(headers).or_else(|| {
        extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

pub async fn insert_log(db: &PgPool, entry: &NewActivityLog) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO activity_logs \
         (user_id, action, description, method, route, status_code, \
          ip_address, user_agent, error_message, metadata) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(entry.user_id)
    .bind(entry.action)
    .bind(&entry.description)
    .bind(&entry.method)
    .bind(&entry.route)
    .bind(entry.status_code)
    .bind(&entry.ip_address)
    .bind(&entry.user_agent)
    .bind(&entry.error_message)
    .bind(&entry.metadata)
    .execute(db)
    .await?;
    Ok(())
}
